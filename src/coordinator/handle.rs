//! Cloneable handle for talking to the `CoordinatorActor`.

use tokio::sync::{mpsc, oneshot};

use crate::rpc::messages::{Ack, ForwardArgs, JoinArgs, LeaveArgs};

use super::actor::CoordinatorMessage;

#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<CoordinatorMessage>,
}

impl CoordinatorHandle {
    pub fn new(tx: mpsc::UnboundedSender<CoordinatorMessage>) -> Self {
        CoordinatorHandle { tx }
    }

    pub async fn join(&self, args: JoinArgs, endpoint: String) -> Ack {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(CoordinatorMessage::Join { args, endpoint, response: tx }).is_err() {
            return Ack::failed();
        }
        rx.await.unwrap_or(Ack::failed())
    }

    pub async fn leave(&self, args: LeaveArgs) -> Ack {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(CoordinatorMessage::Leave { args, response: tx }).is_err() {
            return Ack::failed();
        }
        rx.await.unwrap_or(Ack::failed())
    }

    pub async fn forward(&self, args: ForwardArgs) -> Ack {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(CoordinatorMessage::Forward { args, response: tx }).is_err() {
            return Ack::failed();
        }
        rx.await.unwrap_or(Ack::failed())
    }
}
