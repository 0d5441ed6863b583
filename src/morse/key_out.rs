//! Key-Out Multiplexer
//!
//! One sidetone and one transmitter line are shared by two sources: our
//! own keying (internal) and tones reproduced from a decoder or the
//! receive path (external). Internal keying always wins the sidetone;
//! when it ends an external tone that is still on becomes audible again.

use crate::types::KeyTxPolicy;

/// Physical key line (sidetone generator and transmitter key)
pub trait KeyLine {
    /// Start the sidetone at `pitch_hz` (or change its pitch)
    fn tone_on(&mut self, pitch_hz: u16);
    /// Silence the sidetone
    fn tone_off(&mut self);
    /// Key or unkey the transmitter
    fn key_transmitter(&mut self, down: bool);
}

/// Source of a key-out request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource {
    /// Our own keying (paddle keyer, local generator)
    Internal,
    /// Reproduced signal (decoder, received radio packets)
    External,
}

#[cfg(feature = "embedded")]
impl defmt::Format for KeySource {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Internal => defmt::write!(f, "int"),
            Self::External => defmt::write!(f, "ext"),
        }
    }
}

/// Arbitration state of the shared key line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyOut {
    internal_on: bool,
    external_on: bool,
    external_pitch: u16,
    transmit_enabled: bool,
}

impl KeyOut {
    /// Create an idle multiplexer with the transmitter disabled
    #[must_use]
    pub const fn new() -> Self {
        Self {
            internal_on: false,
            external_on: false,
            external_pitch: 0,
            transmit_enabled: false,
        }
    }

    /// Turn a source on or off
    pub fn key_out(&mut self, line: &mut dyn KeyLine, on: bool, source: KeySource, pitch_hz: u16) {
        match (on, source) {
            (true, KeySource::Internal) => {
                self.internal_on = true;
                line.tone_on(pitch_hz);
                if self.transmit_enabled {
                    line.key_transmitter(true);
                }
            }
            (true, KeySource::External) => {
                self.external_on = true;
                self.external_pitch = pitch_hz;
                if !self.internal_on {
                    line.tone_on(pitch_hz);
                }
            }
            (false, KeySource::Internal) => {
                self.internal_on = false;
                if self.external_on {
                    line.tone_on(self.external_pitch);
                } else {
                    line.tone_off();
                }
                line.key_transmitter(false);
            }
            (false, KeySource::External) => {
                self.external_on = false;
                if !self.internal_on {
                    line.tone_off();
                }
            }
        }
    }

    /// Force both sources off (mode exit)
    pub fn release_all(&mut self, line: &mut dyn KeyLine) {
        self.internal_on = false;
        self.external_on = false;
        line.tone_off();
        line.key_transmitter(false);
    }

    /// Allow internal keying to key the transmitter
    pub fn set_transmit_enabled(&mut self, enabled: bool) {
        self.transmit_enabled = enabled;
    }

    /// Apply a transmitter policy for a mode that keys from the keyer
    /// (`from_generator == false`) or from the generator
    pub fn apply_policy(&mut self, policy: KeyTxPolicy, from_generator: bool) {
        self.transmit_enabled = match policy {
            KeyTxPolicy::Never => false,
            KeyTxPolicy::KeyerOnly => !from_generator,
            KeyTxPolicy::Always => true,
        };
    }

    /// Is the transmitter allowed to be keyed
    #[must_use]
    pub const fn transmit_enabled(&self) -> bool {
        self.transmit_enabled
    }

    /// Is any source keyed
    #[must_use]
    pub const fn is_keyed(&self) -> bool {
        self.internal_on || self.external_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Line {
        tone: Option<u16>,
        tx: bool,
    }

    impl KeyLine for Line {
        fn tone_on(&mut self, pitch_hz: u16) {
            self.tone = Some(pitch_hz);
        }
        fn tone_off(&mut self) {
            self.tone = None;
        }
        fn key_transmitter(&mut self, down: bool) {
            self.tx = down;
        }
    }

    #[test]
    fn internal_keys_transmitter_when_enabled() {
        let mut key = KeyOut::new();
        let mut line = Line::default();
        key.set_transmit_enabled(true);
        key.key_out(&mut line, true, KeySource::Internal, 600);
        assert_eq!(line.tone, Some(600));
        assert!(line.tx);
        key.key_out(&mut line, false, KeySource::Internal, 600);
        assert_eq!(line.tone, None);
        assert!(!line.tx);
    }

    #[test]
    fn external_never_keys_transmitter() {
        let mut key = KeyOut::new();
        let mut line = Line::default();
        key.set_transmit_enabled(true);
        key.key_out(&mut line, true, KeySource::External, 700);
        assert_eq!(line.tone, Some(700));
        assert!(!line.tx);
    }

    #[test]
    fn policy() {
        let mut key = KeyOut::new();
        key.apply_policy(KeyTxPolicy::KeyerOnly, true);
        assert!(!key.transmit_enabled());
        key.apply_policy(KeyTxPolicy::KeyerOnly, false);
        assert!(key.transmit_enabled());
        key.apply_policy(KeyTxPolicy::Never, false);
        assert!(!key.transmit_enabled());
    }
}
