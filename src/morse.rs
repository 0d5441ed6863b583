//! Morse Protocol Core
//!
//! Timing, the code table, the shared key line and the two real-time
//! state machines (paddle keyer and CW generator).

pub mod code;
pub mod context;
pub mod generator;
pub mod key_out;
pub mod keyer;
pub mod timing;
pub mod words;

pub use context::Context;
