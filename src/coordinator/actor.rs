//! Coordinator handler loop (§4.2, §5): the single task that owns the
//! authoritative ring and drives `Join`/`Leave` reconfiguration and
//! `Forward` routing to completion before touching the next request.

use std::collections::HashSet;

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::ring::{Ring, RingPoint};
use crate::rpc::messages::{
    Ack, CopyArgs, ForwardArgs, GetReplicasArgs, GetRequestArgs, JoinArgs, LeaveArgs, LookupArgs,
    ReplaceArgs, ReplicaRef, RemoveAllArgs,
};
use crate::rpc::transport::call;
use crate::rpc::Request;

#[derive(Debug)]
pub enum CoordinatorMessage {
    Join {
        args: JoinArgs,
        endpoint: String,
        response: oneshot::Sender<Ack>,
    },
    Leave {
        args: LeaveArgs,
        response: oneshot::Sender<Ack>,
    },
    Forward {
        args: ForwardArgs,
        response: oneshot::Sender<Ack>,
    },
}

pub struct CoordinatorActor {
    ring: Ring,
    rx: mpsc::UnboundedReceiver<CoordinatorMessage>,
}

impl CoordinatorActor {
    pub fn spawn() -> super::handle::CoordinatorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = CoordinatorActor { ring: Ring::new(), rx };
        tokio::spawn(actor.run());
        super::handle::CoordinatorHandle::new(tx)
    }

    async fn run(mut self) {
        info!("coordinator handler loop starting");
        while let Some(msg) = self.rx.recv().await {
            match msg {
                CoordinatorMessage::Join { args, endpoint, response } => {
                    let ack = self.handle_join(args, endpoint).await;
                    let _ = response.send(ack);
                }
                CoordinatorMessage::Leave { args, response } => {
                    let ack = self.handle_leave(args).await;
                    let _ = response.send(ack);
                }
                CoordinatorMessage::Forward { args, response } => {
                    let ack = self.handle_forward(args).await;
                    let _ = response.send(ack);
                }
            }
        }
    }

    /// §4.2 `Join`, steps 1-6, executed atomically on this task.
    async fn handle_join(&mut self, args: JoinArgs, endpoint: String) -> Ack {
        if !self.ring.add_node(&args.id, args.weight, &endpoint) {
            info!(id = %args.id, "Join rejected: id already a member");
            return Ack::failed();
        }
        info!(id = %args.id, %endpoint, weight = args.weight, "Join: node added to ring");

        // Step 2: tell the new node about its replicas.
        self.assign_replicas(&args.id).await;

        // Step 3: have the new node pull the keys it now owns.
        self.lookup_step(&args.id, &endpoint).await;

        // Step 4: the predecessor's next-parent changed (it's now the
        // new node); re-send its replica set too.
        if let Some(primary) = self.ring.get_point_by_key(&args.id) {
            if let Some(prev) = self.ring.get_prev_parent(&primary) {
                self.assign_replicas(&prev.parent_key).await;
            }
        }

        // Step 5: purge the stale replica copies the former holder no
        // longer needs to keep. Must run after step 3.
        self.remove_stale_replicas(&args.id).await;

        Ack::ok()
    }

    /// §4.2 `Leave`.
    async fn handle_leave(&mut self, args: LeaveArgs) -> Ack {
        if self.ring.size() <= 2 {
            info!(id = %args.id, "Leave no-op: ring too small to drain");
            return Ack::ok();
        }

        let points = self.ring.points_of(&args.id);

        // Step 1: repoint each predecessor's replica reference.
        for p in &points {
            let Some(prev) = self.ring.get_prev_parent(p) else { continue };
            let Some(next) = self.ring.get_next_except(p, &prev.parent_key) else { continue };
            let replace = ReplaceArgs {
                old: p.key.clone(),
                new: ReplicaRef {
                    parent_key: next.parent_key.clone(),
                    key: next.key.clone(),
                    endpoint: next.endpoint.clone(),
                },
            };
            if let Err(e) = call(&prev.endpoint, Request::Replace(replace)).await {
                warn!(peer = %prev.endpoint, error = %e, "Leave: Replace failed");
            }
        }

        // Step 2: promote the predecessor's local replicas.
        for p in &points {
            let Some(prev) = self.ring.get_prev_parent(p) else { continue };
            let copy = CopyArgs { target: p.key.clone() };
            if let Err(e) = call(&prev.endpoint, Request::Copy(copy)).await {
                warn!(peer = %prev.endpoint, error = %e, "Leave: Copy failed");
            }
        }

        self.ring.remove_node(&args.id);
        info!(id = %args.id, "Leave: node removed from ring");
        Ack::ok()
    }

    /// §4.2 `Forward`.
    async fn handle_forward(&mut self, args: ForwardArgs) -> Ack {
        let Some(point) = self.ring.get_next(&args.id) else {
            warn!(user_id = %args.id, "Forward on empty ring");
            return Ack::failed();
        };
        let request = Request::GetRequest(GetRequestArgs {
            id: args.id.clone(),
            node_id: point.parent_key.clone(),
        });
        match call(&point.endpoint, request).await {
            Ok(resp) => Ack { success: resp.is_success() },
            Err(e) => {
                warn!(peer = %point.endpoint, error = %e, "Forward: GetRequest failed");
                Ack::failed()
            }
        }
    }

    /// For each point of `node_id`, find its distinct next-parent points
    /// and ship them to `node_id`'s own endpoint via `GetReplicas`
    /// (§4.2 steps 2 and 4 share this procedure).
    async fn assign_replicas(&self, node_id: &str) {
        let points = self.ring.points_of(node_id);
        let Some(endpoint) = points.first().map(|p| p.endpoint.clone()) else {
            return;
        };

        let mut seen = HashSet::new();
        let replicas: Vec<ReplicaRef> = points
            .iter()
            .filter_map(|p| self.ring.get_next_parent(p))
            .filter(|next| seen.insert(next.key.clone()))
            .map(|next: RingPoint| ReplicaRef {
                parent_key: next.parent_key,
                key: next.key,
                endpoint: next.endpoint,
            })
            .collect();

        if replicas.is_empty() {
            return;
        }
        if let Err(e) = call(&endpoint, Request::GetReplicas(GetReplicasArgs { replicas })).await {
            warn!(%endpoint, error = %e, "assign_replicas: GetReplicas failed");
        }
    }

    /// §4.2 step 3: ask the new node to pull every arc it now owns.
    async fn lookup_step(&self, node_id: &str, node_endpoint: &str) {
        for p in self.ring.points_of(node_id) {
            let Some(prev) = self.ring.get_prev_parent(&p) else { continue };
            let args = LookupArgs {
                start: prev.hash.wrapping_add(1),
                end: p.hash,
                key: p.key.clone(),
                dst: None,
            };
            if let Err(e) = call(node_endpoint, Request::Lookup(args)).await {
                warn!(peer = %node_endpoint, error = %e, "Join: Lookup failed");
            }
        }
    }

    /// §4.2 step 5.
    async fn remove_stale_replicas(&self, node_id: &str) {
        for p in self.ring.points_of(node_id) {
            let Some(prev) = self.ring.get_prev_parent(&p) else { continue };
            let Some(next) = self.ring.get_next_except(&p, &prev.parent_key) else { continue };
            let args = RemoveAllArgs { id: prev.parent_key.clone() };
            if let Err(e) = call(&next.endpoint, Request::RemoveAll(args)).await {
                warn!(peer = %next.endpoint, error = %e, "Join: RemoveAll failed");
            }
        }
    }
}
