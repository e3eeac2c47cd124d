//! A small distributed key-value service built on a weighted
//! consistent-hash ring (§1-§2).
//!
//! `ring` holds the hashing and ring primitives; `rpc` is the wire
//! protocol; `coordinator` and `backend` are the two process roles
//! that drive it.

pub mod backend;
pub mod coordinator;
pub mod error;
pub mod hash;
pub mod logging;
pub mod ring;
pub mod rpc;
