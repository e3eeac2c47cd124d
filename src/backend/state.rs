//! Backend local view: `UserState` map, the `unreplicated` retry list,
//! and the partial ring (§3 Data Model, §4.3).

use std::collections::HashMap;

use crate::rpc::messages::UserStateWire;

/// A user's record as held locally. Opaque `payload` to ring logic.
#[derive(Debug, Clone)]
pub struct UserState {
    pub primary_key: String,
    pub replica_key: String,
    pub hash: u64,
    pub payload: Vec<u8>,
}

impl UserState {
    pub fn to_wire(&self) -> UserStateWire {
        UserStateWire {
            primary_key: self.primary_key.clone(),
            replica_key: self.replica_key.clone(),
            hash: self.hash,
            payload: self.payload.clone(),
        }
    }

    pub fn from_wire(wire: UserStateWire) -> Self {
        UserState {
            primary_key: wire.primary_key,
            replica_key: wire.replica_key,
            hash: wire.hash,
            payload: wire.payload,
        }
    }
}

/// Map a `userId` to its `UserState`, plus the ids still waiting on a
/// confirmed replica.
#[derive(Debug, Default)]
pub struct StateMap {
    pub states: HashMap<String, UserState>,
    pub unreplicated: Vec<String>,
}

impl StateMap {
    pub fn new() -> Self {
        StateMap::default()
    }

    /// Every `(userId, state)` whose `hash` falls in the modular arc
    /// `[start, end]` (§4.3 `CopyBulk` arc semantics).
    pub fn in_arc(&self, start: u64, end: u64) -> HashMap<String, UserStateWire> {
        self.states
            .iter()
            .filter(|(_, s)| hash_in_arc(s.hash, start, end))
            .map(|(id, s)| (id.clone(), s.to_wire()))
            .collect()
    }

    /// Remove every entry whose `primary_key` equals `parent_key`
    /// (§4.3 `RemoveAll`).
    pub fn remove_all(&mut self, parent_key: &str) {
        self.states.retain(|_, s| s.primary_key != parent_key);
    }
}

fn hash_in_arc(hash: u64, start: u64, end: u64) -> bool {
    if start <= end {
        hash >= start && hash <= end
    } else {
        hash >= start || hash <= end
    }
}
