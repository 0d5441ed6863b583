//! Iambic Paddle Keyer
//!
//! Turns the two paddle contacts into correctly timed dits and dahs and
//! decodes what was keyed.
//!
//! # State machine
//!
//! ```text
//!  Idle ──press──> Dit/Dah ──(ACS wait)──> KeyStart ──> Keyed
//!   ^                 ^                                   │ element over
//!   │                 └──────── latched paddle ──── InterElement
//!   └──────────── nothing latched: character complete ────┘
//! ```
//!
//! Every state is a short handler that compares the current time with
//! stored deadlines and returns; the keyer never waits.
//!
//! # Squeeze behaviour
//!
//! - Iambic A alternates only while both paddles are held.
//! - Iambic B (Curtis B) starts latching the opposite paddle part way
//!   through the element, so a squeeze released during an element still
//!   adds the alternate element.
//! - Ultimatic plays the element opposite to the first pressed one.
//! - Non-squeeze repeats the first pressed element.

use crate::config::{Preferences, KEYER_WORD_GAP_DITS, PADDLE_DEBOUNCE_US};
use crate::morse::code::{CharacterDecoder, CwSymbol};
use crate::morse::key_out::KeySource;
use crate::morse::Context;
use crate::types::{Element, KeyerMode, PaddlePolarity};

/// Paddle input state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PaddleState {
    /// Dit paddle pressed
    pub dit: bool,
    /// Dah paddle pressed
    pub dah: bool,
}

impl PaddleState {
    /// Create new paddle state
    #[must_use]
    pub const fn new(dit: bool, dah: bool) -> Self {
        Self { dit, dah }
    }

    /// Map left/right contacts to dit/dah
    #[must_use]
    pub const fn from_contacts(left: bool, right: bool, polarity: PaddlePolarity) -> Self {
        match polarity {
            PaddlePolarity::DitLeft => Self::new(left, right),
            PaddlePolarity::DitRight => Self::new(right, left),
        }
    }

    /// Check if any paddle is pressed
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.dit || self.dah
    }

    /// Check if no paddle is pressed
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.dit && !self.dah
    }
}

/// Paddle memory between samples
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PaddleLatch(u8);

impl PaddleLatch {
    const DIT_L: u8 = 0x01;
    const DAH_L: u8 = 0x02;
    const DIT_LAST: u8 = 0x04;

    /// Latch the pressed paddles
    pub fn latch(&mut self, dit: bool, dah: bool) {
        if dit {
            self.0 |= Self::DIT_L;
        }
        if dah {
            self.0 |= Self::DAH_L;
        }
    }

    /// Clear both paddle latches, keep the last element
    pub fn clear_paddles(&mut self) {
        self.0 &= !(Self::DIT_L | Self::DAH_L);
    }

    /// Clear everything
    pub fn clear_all(&mut self) {
        self.0 = 0;
    }

    /// Remember the element being played
    pub fn set_last(&mut self, element: Element) {
        match element {
            Element::Dit => self.0 |= Self::DIT_LAST,
            Element::Dah => self.0 &= !Self::DIT_LAST,
        }
    }

    /// Dit paddle latched
    #[must_use]
    pub const fn dit(self) -> bool {
        self.0 & Self::DIT_L != 0
    }

    /// Dah paddle latched
    #[must_use]
    pub const fn dah(self) -> bool {
        self.0 & Self::DAH_L != 0
    }

    /// Last element was a dit
    #[must_use]
    pub const fn dit_last(self) -> bool {
        self.0 & Self::DIT_LAST != 0
    }

    /// Any paddle latched
    #[must_use]
    pub const fn any_paddle(self) -> bool {
        self.0 & (Self::DIT_L | Self::DAH_L) != 0
    }
}

/// Debounces the raw paddle contacts
///
/// A contact change is accepted once it has been stable for the debounce
/// window. In non-squeeze mode a press of both contacts is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaddleDebouncer {
    raw_left: bool,
    raw_right: bool,
    left_since_us: u64,
    right_since_us: u64,
    left: bool,
    right: bool,
}

impl PaddleDebouncer {
    /// Create a debouncer with both contacts open
    #[must_use]
    pub const fn new() -> Self {
        Self {
            raw_left: false,
            raw_right: false,
            left_since_us: 0,
            right_since_us: 0,
            left: false,
            right: false,
        }
    }

    /// Feed one raw sample and get the debounced paddle state
    pub fn sample(
        &mut self,
        now_us: u64,
        left: bool,
        right: bool,
        mode: KeyerMode,
        polarity: PaddlePolarity,
    ) -> PaddleState {
        if !(mode == KeyerMode::NonSqueeze && left && right) {
            if left != self.raw_left {
                self.left_since_us = now_us;
            }
            if right != self.raw_right {
                self.right_since_us = now_us;
            }
            if now_us.saturating_sub(self.left_since_us) > PADDLE_DEBOUNCE_US {
                self.left = left;
            }
            if now_us.saturating_sub(self.right_since_us) > PADDLE_DEBOUNCE_US {
                self.right = right;
            }
            self.raw_left = left;
            self.raw_right = right;
        }
        PaddleState::from_contacts(self.left, self.right, polarity)
    }

    /// Debounced contacts (left, right)
    #[must_use]
    pub const fn contacts(&self) -> (bool, bool) {
        (self.left, self.right)
    }
}

/// Word gap the keyer waits for before reporting a word end
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WordGap {
    /// Five dits (keyer, transceiver and LoRa modes)
    #[default]
    Short,
    /// The configured inter-word space
    Nominal,
}

/// Keyer settings derived from the preferences
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyerConfig {
    /// Squeeze behaviour
    pub mode: KeyerMode,
    /// ACS stall in dits (0 = off)
    pub acs_length: u8,
    /// Curtis B early check for dahs (percent of a dah)
    pub curtis_b_percent: u8,
    /// Curtis B early check for dits (percent of a dit)
    pub curtis_b_dot_percent: u8,
    /// Latency window after key-up (percent of a dit)
    pub latency_percent: u8,
    /// Sidetone pitch while keying
    pub pitch_hz: u16,
    /// Word gap detection
    pub word_gap: WordGap,
    /// Encode keyed elements for the radio
    pub encode_for_radio: bool,
}

impl KeyerConfig {
    /// Take the keyer settings from the preferences
    #[must_use]
    pub const fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            mode: prefs.keyer_mode,
            acs_length: prefs.acs_length,
            curtis_b_percent: prefs.curtis_b_percent,
            curtis_b_dot_percent: prefs.curtis_b_dot_percent,
            latency_percent: prefs.latency_percent,
            pitch_hz: prefs.sidetone_hz,
            word_gap: WordGap::Short,
            encode_for_radio: false,
        }
    }

    /// Shift the keying pitch so our own signal is told apart from
    /// received ones
    #[must_use]
    pub const fn with_echo_shift(mut self, prefs: &Preferences) -> Self {
        self.pitch_hz = prefs.echo_pitch_shift.apply(prefs.sidetone_hz);
        self
    }
}

impl Default for KeyerConfig {
    fn default() -> Self {
        Self::from_preferences(&Preferences::default())
    }
}

/// Keyer state machine state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeyerState {
    /// Waiting for a paddle
    #[default]
    Idle,
    /// Dit selected, waiting out ACS
    Dit,
    /// Dah selected, waiting out ACS
    Dah,
    /// Key down and arm the timers
    KeyStart,
    /// Key is down
    Keyed,
    /// Gap after an element
    InterElement,
}

#[cfg(feature = "embedded")]
impl defmt::Format for KeyerState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "Idle"),
            Self::Dit => defmt::write!(f, "Dit"),
            Self::Dah => defmt::write!(f, "Dah"),
            Self::KeyStart => defmt::write!(f, "KeyStart"),
            Self::Keyed => defmt::write!(f, "Keyed"),
            Self::InterElement => defmt::write!(f, "InterElement"),
        }
    }
}

/// Receives what the keyer produced
pub trait KeyerListener {
    /// A character was completed (display form, `*` if unknown)
    fn on_character(&mut self, _ctx: &mut Context<'_>, _text: &str) {}
    /// The word gap elapsed after the last character
    fn on_word_end(&mut self, _ctx: &mut Context<'_>) {}
}

/// Listener that ignores everything
impl KeyerListener for () {}

/// Iambic paddle keyer
#[derive(Clone, Debug, Default)]
pub struct IambicKeyer {
    config: KeyerConfig,
    state: KeyerState,
    latch: PaddleLatch,
    dit_first: bool,
    element_ms: u32,
    curtis_ms: u32,
    element_deadline: u64,
    curtis_deadline: u64,
    latency_deadline: u64,
    acs_deadline: u64,
    word_deadline: Option<u64>,
    decoder: CharacterDecoder,
}

impl IambicKeyer {
    /// Create an idle keyer
    #[must_use]
    pub fn new(config: KeyerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current settings
    #[must_use]
    pub const fn config(&self) -> &KeyerConfig {
        &self.config
    }

    /// Replace the settings (takes effect with the next element)
    pub fn set_config(&mut self, config: KeyerConfig) {
        self.config = config;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> KeyerState {
        self.state
    }

    /// Current paddle latch
    #[must_use]
    pub const fn latch(&self) -> PaddleLatch {
        self.latch
    }

    /// Is the keyer between characters
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == KeyerState::Idle
    }

    /// Run one step
    ///
    /// Returns true while a paddle press is latched.
    pub fn step(
        &mut self,
        ctx: &mut Context<'_>,
        paddles: PaddleState,
        listener: &mut dyn KeyerListener,
    ) -> bool {
        match self.state {
            KeyerState::Idle => {
                if !self.on_idle(ctx, paddles, listener) {
                    return false;
                }
            }
            KeyerState::Dit => self.on_element_selected(ctx, Element::Dit),
            KeyerState::Dah => self.on_element_selected(ctx, Element::Dah),
            KeyerState::KeyStart => self.on_key_start(ctx),
            KeyerState::Keyed => self.on_keyed(ctx, paddles),
            KeyerState::InterElement => self.on_inter_element(ctx, paddles, listener),
        }
        self.latch.any_paddle()
    }

    /// Force idle and clear latches and timers
    pub fn reset(&mut self) {
        self.state = KeyerState::Idle;
        self.latch.clear_all();
        self.dit_first = false;
        self.element_deadline = 0;
        self.curtis_deadline = 0;
        self.latency_deadline = 0;
        self.acs_deadline = 0;
        self.word_deadline = None;
        self.decoder.clear();
    }

    /// Release the key if it is down, then reset
    pub fn abort(&mut self, ctx: &mut Context<'_>) {
        if self.state == KeyerState::Keyed {
            ctx.key_up(KeySource::Internal);
        }
        self.reset();
    }

    fn on_idle(
        &mut self,
        ctx: &mut Context<'_>,
        paddles: PaddleState,
        listener: &mut dyn KeyerListener,
    ) -> bool {
        if let Some(deadline) = self.word_deadline {
            if ctx.now_ms > deadline {
                self.word_deadline = None;
                if self.config.encode_for_radio {
                    ctx.radio.encode_element(CwSymbol::WordEnd);
                    ctx.radio.finalize_and_send();
                }
                trace!("keyer: word end");
                listener.on_word_end(ctx);
            }
        }

        if paddles.is_idle() {
            return false;
        }

        self.latch.latch(paddles.dit, paddles.dah);
        self.decoder.clear();
        self.dit_first = paddles.dit;
        let first = if paddles.dit { Element::Dit } else { Element::Dah };
        self.select(ctx, first);
        true
    }

    fn on_element_selected(&mut self, ctx: &mut Context<'_>, element: Element) {
        if self.config.acs_length > 0 && ctx.now_ms <= self.acs_deadline {
            return;
        }
        self.latch.clear_paddles();
        self.latch.set_last(element);

        self.element_ms = ctx.timing.element_ms(element);
        self.curtis_ms = match (self.config.mode, element) {
            (KeyerMode::IambicB, Element::Dit) => {
                2 + ctx.timing.dit_ms * u32::from(self.config.curtis_b_dot_percent) / 100
            }
            (KeyerMode::IambicB, Element::Dah) => {
                2 + ctx.timing.dah_ms * u32::from(self.config.curtis_b_percent) / 100
            }
            _ => self.element_ms,
        };
        self.state = KeyerState::KeyStart;
    }

    fn on_key_start(&mut self, ctx: &mut Context<'_>) {
        ctx.key_down(KeySource::Internal, self.config.pitch_hz);
        self.element_deadline = ctx.after(self.element_ms);
        self.curtis_deadline = ctx.after(self.curtis_ms);
        self.state = KeyerState::Keyed;
    }

    fn on_keyed(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) {
        if ctx.now_ms > self.element_deadline {
            ctx.key_up(KeySource::Internal);
            let latency = ctx.timing.dit_ms * u32::from(self.config.latency_percent) / 100;
            self.element_deadline = ctx.after(ctx.timing.inter_element_ms);
            self.latency_deadline = ctx.after(latency);
            self.state = KeyerState::InterElement;
        } else if ctx.now_ms > self.curtis_deadline {
            self.latch_opposite(paddles);
        }
    }

    fn on_inter_element(
        &mut self,
        ctx: &mut Context<'_>,
        paddles: PaddleState,
        listener: &mut dyn KeyerListener,
    ) {
        if ctx.now_ms < self.latency_deadline {
            self.latch_opposite(paddles);
            return;
        }
        self.latch.latch(paddles.dit, paddles.dah);
        if ctx.now_ms <= self.element_deadline {
            return;
        }

        let next = match (self.latch.dit(), self.latch.dah()) {
            (true, true) => Some(self.squeeze_element()),
            (true, false) => Some(Element::Dit),
            (false, true) => Some(Element::Dah),
            (false, false) => None,
        };
        match next {
            Some(element) => self.select(ctx, element),
            None => self.complete_character(ctx, listener),
        }
    }

    fn squeeze_element(&self) -> Element {
        let first = if self.dit_first {
            Element::Dit
        } else {
            Element::Dah
        };
        match self.config.mode {
            KeyerMode::NonSqueeze => first,
            KeyerMode::Ultimatic => first.opposite(),
            KeyerMode::IambicA | KeyerMode::IambicB => {
                if self.latch.dit_last() {
                    Element::Dah
                } else {
                    Element::Dit
                }
            }
        }
    }

    // only the paddle opposite to the element just played counts here
    fn latch_opposite(&mut self, paddles: PaddleState) {
        if self.latch.dit_last() {
            self.latch.latch(false, paddles.dah);
        } else {
            self.latch.latch(paddles.dit, false);
        }
    }

    fn select(&mut self, ctx: &mut Context<'_>, element: Element) {
        self.state = match element {
            Element::Dit => KeyerState::Dit,
            Element::Dah => KeyerState::Dah,
        };
        self.decoder.push(element);
        if self.config.encode_for_radio {
            ctx.radio.encode_element(element.into());
        }
    }

    fn complete_character(&mut self, ctx: &mut Context<'_>, listener: &mut dyn KeyerListener) {
        self.state = KeyerState::Idle;
        let text = self.decoder.finish();
        trace!("keyer: character {}", text);
        if self.config.encode_for_radio {
            ctx.radio.encode_element(CwSymbol::CharEnd);
        }
        listener.on_character(ctx, text);

        if self.config.acs_length > 0 {
            self.acs_deadline = ctx.after(u32::from(self.config.acs_length) * ctx.timing.dit_ms);
        }
        let word_gap = match self.config.word_gap {
            WordGap::Short => KEYER_WORD_GAP_DITS * ctx.timing.dit_ms,
            WordGap::Nominal => ctx.timing.inter_word_ms,
        };
        self.word_deadline = Some(ctx.after(word_gap));
        self.latch.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paddle_state_pressed() {
        let idle = PaddleState::new(false, false);
        assert!(idle.is_idle());
        assert!(!idle.is_pressed());

        let dit = PaddleState::new(true, false);
        assert!(!dit.is_idle());
        assert!(dit.is_pressed());

        let squeeze = PaddleState::new(true, true);
        assert!(!squeeze.is_idle());
        assert!(squeeze.is_pressed());
    }

    #[test]
    fn polarity_swaps_contacts() {
        let p = PaddleState::from_contacts(true, false, PaddlePolarity::DitRight);
        assert!(!p.dit);
        assert!(p.dah);
    }

    #[test]
    fn latch_bits() {
        let mut latch = PaddleLatch::default();
        latch.latch(true, false);
        latch.set_last(Element::Dit);
        assert!(latch.dit());
        assert!(!latch.dah());
        assert!(latch.dit_last());
        latch.clear_paddles();
        assert!(!latch.any_paddle());
        assert!(latch.dit_last());
        latch.clear_all();
        assert!(!latch.dit_last());
    }

    #[test]
    fn debouncer_needs_stable_contact() {
        let mut deb = PaddleDebouncer::new();
        let mode = KeyerMode::IambicB;
        let pol = PaddlePolarity::DitLeft;
        assert!(deb.sample(1_000, true, false, mode, pol).is_idle());
        assert!(deb.sample(1_500, true, false, mode, pol).is_idle());
        assert!(deb.sample(1_751, true, false, mode, pol).dit);
    }

    #[test]
    fn debouncer_ignores_squeeze_in_non_squeeze_mode() {
        let mut deb = PaddleDebouncer::new();
        let mode = KeyerMode::NonSqueeze;
        let pol = PaddlePolarity::DitLeft;
        deb.sample(0, true, false, mode, pol);
        let p = deb.sample(1_000, true, false, mode, pol);
        assert!(p.dit);
        let p = deb.sample(3_000, true, true, mode, pol);
        assert!(p.dit);
        assert!(!p.dah);
    }

    #[test]
    fn config_from_preferences() {
        let prefs = Preferences::default();
        let config = KeyerConfig::from_preferences(&prefs);
        assert_eq!(config.mode, KeyerMode::IambicB);
        assert_eq!(config.pitch_hz, prefs.sidetone_hz);
        assert!(!config.encode_for_radio);
    }
}
