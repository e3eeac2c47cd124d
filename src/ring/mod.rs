//! Consistent-hash ring primitives (§3, §4.1).

mod point;
mod ring;

pub use point::RingPoint;
pub use ring::Ring;
