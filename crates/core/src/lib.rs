//! Cross-cutting primitives shared by the CPU and machine crates: the RedBus device
//! registry, the device trait it routes to, structured logging, and the error type
//! for the handful of genuinely fatal conditions a caller can hit.

pub mod bus;
pub mod error;
pub mod logging;

pub use bus::{Bus, Device};
pub use error::RedpcError;
