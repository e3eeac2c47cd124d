//! Typed RPC argument/reply records (§6 External Interfaces).
//!
//! `Request` and `Response` are the wire envelope: bincode encodes the
//! enum discriminant as the verb tag and the variant's fields as the
//! payload, so the "(verb tag, payload)" framing the spec calls for
//! falls out of deriving `Serialize`/`Deserialize` on the enums directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A point reference as carried over the wire (§6 `GetReplicas`, `Replace`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaRef {
    pub parent_key: String,
    pub key: String,
    pub endpoint: String,
}

/// `UserState` as carried over the wire (§3 Data Model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStateWire {
    pub primary_key: String,
    pub replica_key: String,
    pub hash: u64,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinArgs {
    pub port: u16,
    pub id: String,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveArgs {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardArgs {
    pub id: String,
    /// Filled in by the coordinator before calling the backend.
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequestArgs {
    pub id: String,
    pub node_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetReplicasArgs {
    pub replicas: Vec<ReplicaRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvStateArgs {
    pub key: String,
    pub user_state: UserStateWire,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupArgs {
    pub start: u64,
    pub end: u64,
    pub key: String,
    pub dst: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyBulkArgs {
    pub start: u64,
    pub end: u64,
    pub key: String,
    pub dst: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveAllArgs {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyArgs {
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceArgs {
    pub old: String,
    pub new: ReplicaRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Ack { success: true }
    }

    pub fn failed() -> Self {
        Ack { success: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStates {
    pub states: HashMap<String, UserStateWire>,
}

/// Every inbound RPC, coordinator and backend verbs together: a single
/// process only ever accepts the subset relevant to its role, but one
/// envelope type keeps the framing code in `transport.rs` uniform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    Join(JoinArgs),
    Leave(LeaveArgs),
    Forward(ForwardArgs),
    GetRequest(GetRequestArgs),
    GetReplicas(GetReplicasArgs),
    RecvState(RecvStateArgs),
    Lookup(LookupArgs),
    CopyBulk(CopyBulkArgs),
    RemoveAll(RemoveAllArgs),
    Copy(CopyArgs),
    Replace(ReplaceArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Ack(Ack),
    Bulk(BulkStates),
}

impl Response {
    pub fn ack(success: bool) -> Self {
        Response::Ack(Ack { success })
    }

    /// `true` for an `Ack { success: true }`; `false` for any other
    /// reply, including `Bulk` (callers that expect an `Ack` treat a
    /// mismatched reply shape as failure rather than panicking).
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Ack(Ack { success: true }))
    }
}
