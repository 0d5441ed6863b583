//! Shared types used across the Morse firmware
//!
//! Small value types passed between the keyer, the generator, the radio
//! link and the display. Text buffers are fixed-capacity `heapless`
//! strings because the device runs without an allocator.

use crate::config::{MAX_MESSAGE_LEN, MAX_WORD_LEN};

/// A single word of clear text (also used for call signs)
pub type Word = heapless::String<MAX_WORD_LEN>;

/// A message of several words (protocol messages, challenges)
pub type Message = heapless::String<MAX_MESSAGE_LEN>;

/// Copy `text` into a fixed-capacity string, truncating at a character
/// boundary if it does not fit.
#[must_use]
pub fn bounded<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Keyed element of a Morse character
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element {
    /// Short element (1 unit)
    Dit,
    /// Long element (3 units)
    Dah,
}

impl Element {
    /// Get the other element
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Dit => Self::Dah,
            Self::Dah => Self::Dit,
        }
    }

    /// Duration in dit units
    #[must_use]
    pub const fn units(self) -> u32 {
        match self {
            Self::Dit => 1,
            Self::Dah => 3,
        }
    }

    /// Written form used when showing the pattern (`.` or `-`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dit => ".",
            Self::Dah => "-",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Element {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Dit => defmt::write!(f, "dit"),
            Self::Dah => defmt::write!(f, "dah"),
        }
    }
}

/// Paddle keyer behaviour when both paddles are squeezed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyerMode {
    /// Curtis mode A: alternate, no early paddle check
    IambicA,
    /// Curtis mode B: alternate, opposite paddle latched early
    #[default]
    IambicB,
    /// Squeeze plays the element opposite to the first pressed one
    Ultimatic,
    /// Single-lever emulation: squeeze repeats the first pressed element
    NonSqueeze,
}

#[cfg(feature = "embedded")]
impl defmt::Format for KeyerMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::IambicA => defmt::write!(f, "Iambic-A"),
            Self::IambicB => defmt::write!(f, "Iambic-B"),
            Self::Ultimatic => defmt::write!(f, "Ultimatic"),
            Self::NonSqueeze => defmt::write!(f, "Non-squeeze"),
        }
    }
}

/// Which paddle contact produces dits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PaddlePolarity {
    /// Left contact is dit, right contact is dah
    #[default]
    DitLeft,
    /// Left contact is dah, right contact is dit
    DitRight,
}

/// Sidetone shift used to tell our own keying from received signals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PitchShift {
    /// Same pitch as the sidetone
    #[default]
    None,
    /// One half tone higher
    SemitoneUp,
    /// One half tone lower
    SemitoneDown,
}

impl PitchShift {
    /// Apply the shift to a pitch in Hz
    #[must_use]
    pub const fn apply(self, pitch_hz: u16) -> u16 {
        // 18/17 is the half tone ratio used by the sidetone table
        let hz = pitch_hz as u32;
        let shifted = match self {
            Self::None => hz,
            Self::SemitoneUp => hz * 18 / 17,
            Self::SemitoneDown => hz * 17 / 18,
        };
        if shifted > u16::MAX as u32 {
            u16::MAX
        } else {
            shifted as u16
        }
    }
}

/// Display style of printed text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextStyle {
    /// Normal text
    #[default]
    Regular,
    /// Emphasised text
    Bold,
    /// Inverted text (status)
    Inverse,
    /// Text received from the other station
    Incoming,
    /// Text we are sending
    Outgoing,
}

#[cfg(feature = "embedded")]
impl defmt::Format for TextStyle {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Regular => defmt::write!(f, "REG"),
            Self::Bold => defmt::write!(f, "BOLD"),
            Self::Inverse => defmt::write!(f, "INV"),
            Self::Incoming => defmt::write!(f, "IN"),
            Self::Outgoing => defmt::write!(f, "OUT"),
        }
    }
}

/// When the transmitter output is keyed along with the sidetone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyTxPolicy {
    /// Never key the transmitter
    Never,
    /// Key the transmitter only from the paddle keyer
    #[default]
    KeyerOnly,
    /// Key the transmitter from the keyer and the generator
    Always,
}
