//! Cloneable handle for talking to a `BackendActor` (§5 scheduling model).

use tokio::sync::{mpsc, oneshot};

use crate::rpc::messages::{
    Ack, BulkStates, CopyArgs, CopyBulkArgs, GetReplicasArgs, GetRequestArgs, LookupArgs,
    RecvStateArgs, RemoveAllArgs, ReplaceArgs,
};

use super::actor::BackendMessage;

#[derive(Clone)]
pub struct BackendHandle {
    tx: mpsc::UnboundedSender<BackendMessage>,
}

impl BackendHandle {
    pub fn new(tx: mpsc::UnboundedSender<BackendMessage>) -> Self {
        BackendHandle { tx }
    }

    pub async fn get_request(&self, args: GetRequestArgs) -> Ack {
        self.call(|response| BackendMessage::GetRequest { args, response }).await
    }

    pub async fn get_replicas(&self, args: GetReplicasArgs) -> Ack {
        self.call(|response| BackendMessage::GetReplicas { args, response }).await
    }

    pub async fn recv_state(&self, args: RecvStateArgs) -> Ack {
        self.call(|response| BackendMessage::RecvState { args, response }).await
    }

    pub async fn lookup(&self, args: LookupArgs) -> Ack {
        self.call(|response| BackendMessage::Lookup { args, response }).await
    }

    pub async fn copy_bulk(&self, args: CopyBulkArgs) -> BulkStates {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(BackendMessage::CopyBulk { args, response: tx }).is_err() {
            return BulkStates { states: Default::default() };
        }
        rx.await.unwrap_or(BulkStates { states: Default::default() })
    }

    pub async fn remove_all(&self, args: RemoveAllArgs) -> Ack {
        self.call(|response| BackendMessage::RemoveAll { args, response }).await
    }

    pub async fn copy(&self, args: CopyArgs) -> Ack {
        self.call(|response| BackendMessage::Copy { args, response }).await
    }

    pub async fn replace(&self, args: ReplaceArgs) -> Ack {
        self.call(|response| BackendMessage::Replace { args, response }).await
    }

    async fn call(&self, build: impl FnOnce(oneshot::Sender<Ack>) -> BackendMessage) -> Ack {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(build(tx)).is_err() {
            return Ack::failed();
        }
        rx.await.unwrap_or(Ack::failed())
    }
}
