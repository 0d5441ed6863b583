//! Morse Timing Model
//!
//! Element durations derived from the keying speed (PARIS standard:
//! one dit lasts 1200/wpm ms) and the configured spacing factors.

use crate::types::Element;

/// Milliseconds per dit at 1 wpm
pub const MS_PER_DIT_AT_1_WPM: u32 = 1200;

/// Element and gap durations for one speed setting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingParameters {
    /// Dit length in ms
    pub dit_ms: u32,
    /// Dah length in ms (3 dits)
    pub dah_ms: u32,
    /// Gap between elements of one character (1 dit)
    pub inter_element_ms: u32,
    /// Gap between characters
    pub inter_character_ms: u32,
    /// Gap between words
    pub inter_word_ms: u32,
    /// Speed including the lengthened gaps
    pub effective_wpm: u32,
}

impl TimingParameters {
    /// Derive all durations from speed and spacing factors (in dits)
    ///
    /// The inter-word space is at least four dits longer than the
    /// inter-character space.
    ///
    /// # Panics
    ///
    /// Panics on `wpm == 0`; speeds come from validated preferences.
    #[must_use]
    pub const fn recompute(wpm: u8, inter_char_factor: u8, inter_word_factor: u8) -> Self {
        let dit = MS_PER_DIT_AT_1_WPM / wpm as u32;
        let inter_character = inter_char_factor as u32 * dit;
        let min_word_factor = inter_char_factor as u32 + 4;
        let word_factor = if (inter_word_factor as u32) > min_word_factor {
            inter_word_factor as u32
        } else {
            min_word_factor
        };
        let inter_word = word_factor * dit;
        let effective_wpm = 60_000 / (31 * dit + 4 * inter_character + inter_word);

        Self {
            dit_ms: dit,
            dah_ms: Element::Dah.units() * dit,
            inter_element_ms: dit,
            inter_character_ms: inter_character,
            inter_word_ms: inter_word,
            effective_wpm,
        }
    }

    /// Receive timing of a peer sending at `wpm` with standard spacing
    #[must_use]
    pub const fn for_peer(wpm: u8) -> Self {
        Self::recompute(wpm, 3, 7)
    }

    /// Length of a keyed element
    #[must_use]
    pub const fn element_ms(&self, element: Element) -> u32 {
        element.units() * self.dit_ms
    }
}

/// Which durations the generator plays with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimingSource {
    /// Our own keying speed
    #[default]
    Tx,
    /// The speed of the station we receive
    Rx,
    /// As fast as possible (used to fill buffers and skip ahead)
    Quick,
}

impl TimingSource {
    /// Length of a keyed element
    #[must_use]
    pub const fn element_ms(
        self,
        tx: &TimingParameters,
        rx: &TimingParameters,
        element: Element,
    ) -> u32 {
        match self {
            Self::Tx => tx.element_ms(element),
            Self::Rx => rx.element_ms(element),
            Self::Quick => 2,
        }
    }

    /// Gap between elements of one character
    #[must_use]
    pub const fn inter_element_ms(self, tx: &TimingParameters, rx: &TimingParameters) -> u32 {
        match self {
            Self::Tx => tx.inter_element_ms,
            Self::Rx => rx.inter_element_ms,
            Self::Quick => 2,
        }
    }

    /// Gap between characters
    #[must_use]
    pub const fn inter_character_ms(self, tx: &TimingParameters, rx: &TimingParameters) -> u32 {
        match self {
            Self::Tx => tx.inter_character_ms,
            Self::Rx => rx.inter_character_ms,
            Self::Quick => 1,
        }
    }

    /// Gap between words
    #[must_use]
    pub const fn inter_word_ms(self, tx: &TimingParameters, rx: &TimingParameters) -> u32 {
        match self {
            Self::Tx => tx.inter_word_ms,
            Self::Rx => rx.inter_word_ms,
            Self::Quick => 2,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimingParameters {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "dit={}ms char={}ms word={}ms eff={}wpm",
            self.dit_ms,
            self.inter_character_ms,
            self.inter_word_ms,
            self.effective_wpm
        );
    }
}
