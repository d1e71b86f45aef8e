//! I/O layer for uTP
//!
//! The shared UDP channel the dispatch loop owns and the timing utilities
//! it uses to pace the per-connection send/timeout ticks.

pub mod socket;
pub mod time;

pub use socket::{ChannelError, UtpChannel};
pub use time::Timer;
