//! Backend handler loop (§4.3, §5): one task owns the partial ring and
//! the state map outright; inbound RPCs enqueue here and wait on a
//! one-shot reply channel, draining one message at a time.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::hash::gen_hash;
use crate::ring::Ring;
use crate::rpc::messages::{
    Ack, BulkStates, CopyArgs, CopyBulkArgs, GetReplicasArgs, GetRequestArgs, LookupArgs,
    RecvStateArgs, RemoveAllArgs, ReplaceArgs,
};
use crate::rpc::transport::call;
use crate::rpc::{Request, Response};

use super::state::{StateMap, UserState};

#[derive(Debug)]
pub enum BackendMessage {
    GetRequest {
        args: GetRequestArgs,
        response: oneshot::Sender<Ack>,
    },
    GetReplicas {
        args: GetReplicasArgs,
        response: oneshot::Sender<Ack>,
    },
    RecvState {
        args: RecvStateArgs,
        response: oneshot::Sender<Ack>,
    },
    Lookup {
        args: LookupArgs,
        response: oneshot::Sender<Ack>,
    },
    CopyBulk {
        args: CopyBulkArgs,
        response: oneshot::Sender<BulkStates>,
    },
    RemoveAll {
        args: RemoveAllArgs,
        response: oneshot::Sender<Ack>,
    },
    Copy {
        args: CopyArgs,
        response: oneshot::Sender<Ack>,
    },
    Replace {
        args: ReplaceArgs,
        response: oneshot::Sender<Ack>,
    },
}

pub struct BackendActor {
    id: String,
    endpoint: String,
    ring: Ring,
    state: StateMap,
    rx: mpsc::UnboundedReceiver<BackendMessage>,
}

impl BackendActor {
    /// Spawns the handler task and seeds the partial ring with this
    /// node's own `weight` points (§3 Backend local view) — the
    /// prerequisite for `Lookup` to later resolve `GetNextParentWithKey`
    /// against one of them.
    pub fn spawn(id: String, weight: u32, endpoint: String) -> super::handle::BackendHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut ring = Ring::new();
        ring.add_node(&id, weight, &endpoint);

        let actor = BackendActor {
            id,
            endpoint,
            ring,
            state: StateMap::new(),
            rx,
        };

        tokio::spawn(actor.run());
        super::handle::BackendHandle::new(tx)
    }

    async fn run(mut self) {
        info!(id = %self.id, endpoint = %self.endpoint, "backend handler loop starting");
        while let Some(msg) = self.rx.recv().await {
            match msg {
                BackendMessage::GetRequest { args, response } => {
                    let ack = self.handle_get_request(args).await;
                    let _ = response.send(ack);
                }
                BackendMessage::GetReplicas { args, response } => {
                    let ack = self.handle_get_replicas(args).await;
                    let _ = response.send(ack);
                }
                BackendMessage::RecvState { args, response } => {
                    let ack = self.handle_recv_state(args);
                    let _ = response.send(ack);
                }
                BackendMessage::Lookup { args, response } => {
                    let ack = self.handle_lookup(args).await;
                    let _ = response.send(ack);
                }
                BackendMessage::CopyBulk { args, response } => {
                    let bulk = self.handle_copy_bulk(args);
                    let _ = response.send(bulk);
                }
                BackendMessage::RemoveAll { args, response } => {
                    let ack = self.handle_remove_all(args);
                    let _ = response.send(ack);
                }
                BackendMessage::Copy { args, response } => {
                    let ack = self.handle_copy(args).await;
                    let _ = response.send(ack);
                }
                BackendMessage::Replace { args, response } => {
                    let ack = self.handle_replace(args);
                    let _ = response.send(ack);
                }
            }
        }
        info!(id = %self.id, "backend handler loop stopped");
    }

    async fn handle_get_request(&mut self, args: GetRequestArgs) -> Ack {
        debug!(user_id = %args.id, node_id = %args.node_id, "GetRequest");
        self.state.states.entry(args.id.clone()).or_insert_with(|| UserState {
            primary_key: args.node_id.clone(),
            replica_key: String::new(),
            hash: gen_hash(&args.id),
            payload: Vec::new(),
        });

        if !self.repl_state(&args.id).await {
            self.state.unreplicated.push(args.id);
        }
        Ack::ok()
    }

    async fn handle_get_replicas(&mut self, args: GetReplicasArgs) -> Ack {
        for r in &args.replicas {
            self.ring.add_solo(&r.key, &r.parent_key, &r.endpoint);
        }
        info!(id = %self.id, count = args.replicas.len(), "GetReplicas installed");
        self.try_replicate().await;
        Ack::ok()
    }

    fn handle_recv_state(&mut self, args: RecvStateArgs) -> Ack {
        self.state
            .states
            .insert(args.key, UserState::from_wire(args.user_state));
        Ack::ok()
    }

    async fn handle_lookup(&mut self, args: LookupArgs) -> Ack {
        let Some(mine) = self.ring.get_point_by_key(&args.key) else {
            warn!(key = %args.key, "Lookup for unknown local point");
            return Ack::failed();
        };
        let Some(next) = self.ring.get_next_parent(&mine) else {
            warn!(key = %args.key, "Lookup has no successor parent to pull from");
            return Ack::failed();
        };

        let request = Request::CopyBulk(CopyBulkArgs {
            start: args.start,
            end: args.end,
            key: args.key.clone(),
            dst: Some(next.key.clone()),
        });
        match call(&next.endpoint, request).await {
            Ok(Response::Bulk(bulk)) => {
                for (user_id, wire) in bulk.states {
                    let mut state = UserState::from_wire(wire);
                    state.primary_key = mine.parent_key.clone();
                    state.replica_key = next.key.clone();
                    self.state.states.insert(user_id, state);
                }
                Ack::ok()
            }
            Ok(_) => {
                warn!(peer = %next.endpoint, "Lookup: peer replied with the wrong shape");
                Ack::failed()
            }
            Err(e) => {
                warn!(peer = %next.endpoint, error = %e, "Lookup: CopyBulk failed");
                Ack::failed()
            }
        }
    }

    fn handle_copy_bulk(&self, args: CopyBulkArgs) -> BulkStates {
        BulkStates {
            states: self.state.in_arc(args.start, args.end),
        }
    }

    fn handle_remove_all(&mut self, args: RemoveAllArgs) -> Ack {
        self.state.remove_all(&args.id);
        Ack::ok()
    }

    async fn handle_copy(&mut self, args: CopyArgs) -> Ack {
        let ids: Vec<String> = self
            .state
            .states
            .iter()
            .filter(|(_, s)| s.replica_key == args.target)
            .map(|(id, _)| id.clone())
            .collect();

        for id in ids {
            if !self.repl_state(&id).await {
                self.state.unreplicated.push(id);
            }
        }
        Ack::ok()
    }

    fn handle_replace(&mut self, args: ReplaceArgs) -> Ack {
        self.ring.remove_solo(&args.old);
        self.ring.add_solo(&args.new.key, &args.new.parent_key, &args.new.endpoint);
        Ack::ok()
    }

    /// Re-attempt replication for every id in `unreplicated`, keeping
    /// only the ones that still fail (§4.3 `GetReplicas`).
    async fn try_replicate(&mut self) {
        let pending = std::mem::take(&mut self.state.unreplicated);
        for id in pending {
            if !self.repl_state(&id).await {
                self.state.unreplicated.push(id);
            }
        }
    }

    /// `replState(userId)` (§4.3): pick the designated successor from
    /// the partial ring, push the state to it, record the new replica
    /// key on success. Must never resolve to one of this node's own
    /// points — the partial ring always contains them (seeded in
    /// `spawn`), so a plain `get_next` would just dial itself.
    async fn repl_state(&mut self, user_id: &str) -> bool {
        let Some(state) = self.state.states.get(user_id).cloned() else {
            return false;
        };
        let Some(replica) = self.ring.get_next_excluding(user_id, &self.id) else {
            return false;
        };

        let request = Request::RecvState(RecvStateArgs {
            key: user_id.to_string(),
            user_state: state.to_wire(),
        });
        match call(&replica.endpoint, request).await {
            Ok(resp) if resp.is_success() => {
                if let Some(s) = self.state.states.get_mut(user_id) {
                    s.replica_key = replica.key.clone();
                }
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(user_id, peer = %replica.endpoint, error = %e, "replState RecvState failed");
                false
            }
        }
    }
}
