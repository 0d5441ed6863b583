//! Morse Trainer Firmware Library
//!
//! Core of a handheld Morse code trainer and transceiver: an iambic paddle
//! keyer, a CW generator, an echo trainer, a LoRa CW link and the Morse
//! tennis game. The same code runs on the STM32G474 target (`embedded`)
//! and on the host (`std`) for tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TRAINER LOOP                           │
//! │    debounce paddles  │  build Context  │  step active mode    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                         MODES                                │
//! │  Keyer │ Generator │ Echo │ Transceiver │ LoRa │ Tennis       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      MORSE ENGINE                            │
//! │  Timing │ Code table │ Keyer FSM │ Generator FSM │ Key-out    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        OUTPUTS                               │
//! │        KeyLine  │  DisplaySink  │  RadioLink                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Cooperative**: every state machine step is short and never blocks;
//!   time is passed in, deadlines are stored
//! - **No globals**: the loop owner holds all state and hands the outputs
//!   to the state machines through a per-step [`morse::Context`]
//! - **Fixed memory**: all buffers are `heapless` with compile-time bounds
//! - **No unsafe in application code**

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

// Must come first so the logging macros are visible in every module
#[macro_use]
mod fmt;

/// System configuration and constants
pub mod config;

/// Shared types used across modules
pub mod types;

/// Morse Engine
///
/// Timing, code table, keyer and generator state machines.
pub mod morse;

/// LoRa CW Link
///
/// Packet format and radio abstraction.
pub mod lora;

/// Text Display
pub mod display;

/// Morse Tennis
///
/// Game state machine and keyed word buffer.
pub mod tennis;

/// Operating Modes
pub mod mode;

/// Trainer Loop
pub mod trainer;

/// Board Outputs
///
/// Sidetone and GPIO implementation of the key line.
pub mod board;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::display::DisplaySink;
    pub use crate::lora::{RadioDriver, RadioLink};
    pub use crate::mode::{ActiveMode, DecoderEvent, OperatingMode};
    pub use crate::morse::key_out::KeyLine;
    pub use crate::trainer::Trainer;

    // Common traits
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
