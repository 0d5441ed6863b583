//! System configuration and constants
//!
//! Compile-time constants for the trainer hardware and the operator
//! preferences. All pin mappings, defaults, limits and buffer sizes are
//! centralized here. The [`Preferences`] record is validated once at the
//! boundary; the state machines treat it as read-only input.

use core::fmt;

use crate::morse::timing::TimingParameters;
use crate::types::{KeyTxPolicy, KeyerMode, PaddlePolarity, PitchShift};

/// Main loop tick in milliseconds
pub const LOOP_TICK_MS: u64 = 1;

/// Paddle contact debounce window in microseconds
pub const PADDLE_DEBOUNCE_US: u64 = 750;

/// Default keying speed in words per minute
pub const DEFAULT_WPM: u8 = 18;

/// Minimum keying speed
pub const MIN_WPM: u8 = 5;

/// Maximum keying speed
pub const MAX_WPM: u8 = 60;

/// Default sidetone pitch in Hz
pub const DEFAULT_SIDETONE_HZ: u16 = 622;

/// Lowest sidetone pitch in Hz
pub const MIN_SIDETONE_HZ: u16 = 300;

/// Highest sidetone pitch in Hz
pub const MAX_SIDETONE_HZ: u16 = 1200;

/// Standard inter-character space in dits
pub const DEFAULT_INTER_CHAR_SPACE: u8 = 3;

/// Standard inter-word space in dits
pub const DEFAULT_INTER_WORD_SPACE: u8 = 7;

/// Longest inter-character space in dits
pub const MAX_INTER_CHAR_SPACE: u8 = 24;

/// Longest inter-word space in dits
pub const MAX_INTER_WORD_SPACE: u8 = 45;

/// Longest ACS (automatic character spacing) stall in dits
pub const MAX_ACS_LENGTH: u8 = 6;

/// Default Curtis B dah timing (percent of a dah before the early check)
pub const DEFAULT_CURTIS_B_PERCENT: u8 = 35;

/// Default Curtis B dit timing (percent of a dit before the early check)
pub const DEFAULT_CURTIS_B_DOT_PERCENT: u8 = 75;

/// Default latency window after key-up (percent of a dit)
pub const DEFAULT_LATENCY_PERCENT: u8 = 37;

/// Longest latency window (percent of a dit)
pub const MAX_LATENCY_PERCENT: u8 = 87;

/// Word gap the keyer uses in keyer, transceiver and LoRa modes (dits)
pub const KEYER_WORD_GAP_DITS: u32 = 5;

/// Time the echo trainer waits for an answer to start, in inter-word spaces
pub const ECHO_ANSWER_TIMEOUT_GAPS: u32 = 4;

/// Repeat count meaning "repeat each word until told to proceed"
pub const REPEAT_FOREVER: u8 = u8::MAX;

/// Start sequence sent before a generator run (`vvv<ka>` in internal form)
pub const START_SEQUENCE: &str = "vvvA";

/// End marker sent after the last word of a sequence (`<ar>` in internal form)
pub const END_SEQUENCE: &str = "+";

/// Maximum word length in bytes
pub const MAX_WORD_LEN: usize = 32;

/// Maximum message length in bytes
pub const MAX_MESSAGE_LEN: usize = 64;

/// Capacity of the Tennis word buffer in bytes
pub const WORD_BUFFER_LEN: usize = 128;

/// Most elements of a single character (`<sos>`)
pub const MAX_CHAR_ELEMENTS: usize = 9;

/// Symbol capacity of one generated word (elements plus character ends)
pub const MAX_WORD_SYMBOLS: usize = MAX_WORD_LEN * (MAX_CHAR_ELEMENTS + 1);

/// Maximum radio frame length in bytes
pub const MAX_PACKET_LEN: usize = 64;

/// Element capacity of a decoded radio packet
pub const MAX_PACKET_ELEMENTS: usize = (MAX_PACKET_LEN - 2) * 4;

/// Words waiting to be played in radio-fed modes
pub const RX_WORD_QUEUE_LEN: usize = 16;

/// Pin assignments (STM32G474 Nucleo)
pub mod pins {
    /// Left paddle contact (active low)
    pub const PADDLE_LEFT: &str = "PA0";
    /// Right paddle contact (active low)
    pub const PADDLE_RIGHT: &str = "PA1";
    /// Transmitter key output
    pub const KEY_OUT: &str = "PB0";
    /// Sidetone PWM output (TIM1 channel 1)
    pub const SIDETONE: &str = "PA8";
    /// Status LED
    pub const STATUS_LED: &str = "PA5";
}

/// Operator preferences consumed by the core
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preferences {
    /// Keying speed in words per minute
    pub wpm: u8,
    /// Squeeze behaviour of the paddle keyer
    pub keyer_mode: KeyerMode,
    /// Which paddle gives dits
    pub polarity: PaddlePolarity,
    /// Inter-character space in dits
    pub inter_char_space: u8,
    /// Inter-word space in dits
    pub inter_word_space: u8,
    /// ACS stall in dits (0 disables ACS)
    pub acs_length: u8,
    /// Curtis B early check point for dahs, percent of a dah
    pub curtis_b_percent: u8,
    /// Curtis B early check point for dits, percent of a dit
    pub curtis_b_dot_percent: u8,
    /// Latency window after key-up, percent of a dit
    pub latency_percent: u8,
    /// Pitch shift of our own keying in echo and LoRa modes
    pub echo_pitch_shift: PitchShift,
    /// Sidetone pitch in Hz
    pub sidetone_hz: u16,
    /// Words per generator run (0 = unlimited)
    pub max_sequence: u8,
    /// How often each generated word is played
    pub repeat_each: u8,
    /// Play the start sequence before a generator run
    pub start_sequence: bool,
    /// When the transmitter is keyed
    pub key_tx: KeyTxPolicy,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            wpm: DEFAULT_WPM,
            keyer_mode: KeyerMode::IambicB,
            polarity: PaddlePolarity::DitLeft,
            inter_char_space: DEFAULT_INTER_CHAR_SPACE,
            inter_word_space: DEFAULT_INTER_WORD_SPACE,
            acs_length: 0,
            curtis_b_percent: DEFAULT_CURTIS_B_PERCENT,
            curtis_b_dot_percent: DEFAULT_CURTIS_B_DOT_PERCENT,
            latency_percent: DEFAULT_LATENCY_PERCENT,
            echo_pitch_shift: PitchShift::None,
            sidetone_hz: DEFAULT_SIDETONE_HZ,
            max_sequence: 0,
            repeat_each: 1,
            start_sequence: false,
            key_tx: KeyTxPolicy::KeyerOnly,
        }
    }
}

impl Preferences {
    /// Check every field against its limits
    ///
    /// # Errors
    ///
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_WPM..=MAX_WPM).contains(&self.wpm) {
            return Err(ConfigError::WpmOutOfRange(self.wpm));
        }
        if !(DEFAULT_INTER_CHAR_SPACE..=MAX_INTER_CHAR_SPACE).contains(&self.inter_char_space)
            || !(DEFAULT_INTER_WORD_SPACE..=MAX_INTER_WORD_SPACE).contains(&self.inter_word_space)
        {
            return Err(ConfigError::SpacingOutOfRange {
                inter_char: self.inter_char_space,
                inter_word: self.inter_word_space,
            });
        }
        if self.acs_length > MAX_ACS_LENGTH {
            return Err(ConfigError::AcsOutOfRange(self.acs_length));
        }
        check_percent("curtis_b_percent", self.curtis_b_percent, 100)?;
        check_percent("curtis_b_dot_percent", self.curtis_b_dot_percent, 100)?;
        check_percent("latency_percent", self.latency_percent, MAX_LATENCY_PERCENT)?;
        if !(MIN_SIDETONE_HZ..=MAX_SIDETONE_HZ).contains(&self.sidetone_hz) {
            return Err(ConfigError::PitchOutOfRange(self.sidetone_hz));
        }
        if self.repeat_each == 0 {
            return Err(ConfigError::RepeatCountZero);
        }
        Ok(())
    }

    /// Validate and derive the transmit timing
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the preferences are invalid.
    pub fn timing(&self) -> Result<TimingParameters, ConfigError> {
        self.validate()?;
        Ok(TimingParameters::recompute(
            self.wpm,
            self.inter_char_space,
            self.inter_word_space,
        ))
    }
}

fn check_percent(field: &'static str, value: u8, max: u8) -> Result<(), ConfigError> {
    if value > max {
        Err(ConfigError::PercentOutOfRange { field, value })
    } else {
        Ok(())
    }
}

/// Rejected preference value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Speed outside `MIN_WPM..=MAX_WPM`
    WpmOutOfRange(u8),
    /// Spacing factors outside their ranges
    SpacingOutOfRange {
        /// Configured inter-character space
        inter_char: u8,
        /// Configured inter-word space
        inter_word: u8,
    },
    /// ACS stall too long
    AcsOutOfRange(u8),
    /// A percentage field outside its range
    PercentOutOfRange {
        /// Field name
        field: &'static str,
        /// Configured value
        value: u8,
    },
    /// Sidetone pitch outside the audible range of the speaker
    PitchOutOfRange(u16),
    /// Repeat-each of zero would never play a word
    RepeatCountZero,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WpmOutOfRange(wpm) => {
                write!(f, "speed {wpm} wpm outside {MIN_WPM}..={MAX_WPM}")
            }
            Self::SpacingOutOfRange {
                inter_char,
                inter_word,
            } => write!(
                f,
                "spacing {inter_char}/{inter_word} dits outside \
                 {DEFAULT_INTER_CHAR_SPACE}..={MAX_INTER_CHAR_SPACE}/\
                 {DEFAULT_INTER_WORD_SPACE}..={MAX_INTER_WORD_SPACE}"
            ),
            Self::AcsOutOfRange(len) => write!(f, "ACS length {len} above {MAX_ACS_LENGTH}"),
            Self::PercentOutOfRange { field, value } => {
                write!(f, "{field} = {value}% out of range")
            }
            Self::PitchOutOfRange(hz) => {
                write!(f, "sidetone {hz} Hz outside {MIN_SIDETONE_HZ}..={MAX_SIDETONE_HZ}")
            }
            Self::RepeatCountZero => write!(f, "repeat count must be at least 1"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::WpmOutOfRange(wpm) => defmt::write!(f, "WpmOutOfRange({})", wpm),
            Self::SpacingOutOfRange {
                inter_char,
                inter_word,
            } => defmt::write!(f, "SpacingOutOfRange({}, {})", inter_char, inter_word),
            Self::AcsOutOfRange(len) => defmt::write!(f, "AcsOutOfRange({})", len),
            Self::PercentOutOfRange { field, value } => {
                defmt::write!(f, "PercentOutOfRange({}={})", field, value);
            }
            Self::PitchOutOfRange(hz) => defmt::write!(f, "PitchOutOfRange({})", hz),
            Self::RepeatCountZero => defmt::write!(f, "RepeatCountZero"),
        }
    }
}
