//! Per-step context
//!
//! Everything a state machine may touch during one step: the current time,
//! the active timing, and the shared outputs. The loop owner builds one
//! per iteration; the state machines own no global state.

use crate::display::DisplaySink;
use crate::lora::RadioLink;
use crate::morse::key_out::{KeyLine, KeyOut, KeySource};
use crate::morse::timing::TimingParameters;

/// Shared inputs and outputs of one loop iteration
pub struct Context<'a> {
    /// Monotonic time in ms
    pub now_ms: u64,
    /// Transmit timing derived from the preferences
    pub timing: TimingParameters,
    /// Key-out arbitration state
    pub key: &'a mut KeyOut,
    /// Physical key line
    pub line: &'a mut dyn KeyLine,
    /// Text display
    pub display: &'a mut dyn DisplaySink,
    /// Radio link
    pub radio: &'a mut dyn RadioLink,
}

impl Context<'_> {
    /// Key a source down
    pub fn key_down(&mut self, source: KeySource, pitch_hz: u16) {
        self.key.key_out(&mut *self.line, true, source, pitch_hz);
    }

    /// Release a source
    pub fn key_up(&mut self, source: KeySource) {
        self.key.key_out(&mut *self.line, false, source, 0);
    }

    /// Release everything on the key line
    pub fn release_key(&mut self) {
        self.key.release_all(&mut *self.line);
    }

    /// Deadline `delay_ms` from now
    #[must_use]
    pub fn after(&self, delay_ms: u32) -> u64 {
        self.now_ms + u64::from(delay_ms)
    }
}
