//! Wire protocol: typed envelopes (§6) over a framed TCP transport.

pub mod messages;
pub mod transport;

pub use messages::{Request, Response};
pub use transport::{call, CALL_DEADLINE};
