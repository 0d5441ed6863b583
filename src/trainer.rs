//! Trainer
//!
//! Owns the outputs, the preferences and the active mode, and runs one
//! iteration of the cooperative loop per [`Trainer::tick`].

use crate::config::{ConfigError, Preferences};
use crate::display::DisplaySink;
use crate::lora::RadioLink;
use crate::mode::{ActiveMode, DecoderEvent, ModeKind, OperatingMode};
use crate::morse::key_out::{KeyLine, KeyOut};
use crate::morse::keyer::PaddleDebouncer;
use crate::morse::timing::TimingParameters;
use crate::morse::words::WordSource;
use crate::morse::Context;

/// The trainer loop state
#[derive(Debug)]
pub struct Trainer<L, D, R, S>
where
    L: KeyLine,
    D: DisplaySink,
    R: RadioLink,
    S: WordSource,
{
    prefs: Preferences,
    timing: TimingParameters,
    key: KeyOut,
    line: L,
    display: D,
    radio: R,
    debouncer: PaddleDebouncer,
    mode: ActiveMode<S>,
    now_ms: u64,
}

impl<L, D, R, S> Trainer<L, D, R, S>
where
    L: KeyLine,
    D: DisplaySink,
    R: RadioLink,
    S: WordSource,
{
    /// Validate the preferences and start `mode`
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences are out of range.
    pub fn new(
        prefs: Preferences,
        line: L,
        display: D,
        radio: R,
        mode: ActiveMode<S>,
    ) -> Result<Self, ConfigError> {
        let timing = prefs.timing()?;
        let mut trainer = Self {
            prefs,
            timing,
            key: KeyOut::new(),
            line,
            display,
            radio,
            debouncer: PaddleDebouncer::new(),
            mode,
            now_ms: 0,
        };
        trainer.radio.set_wpm(trainer.prefs.wpm);
        let prefs = trainer.prefs;
        let (mode, mut ctx) = trainer.split();
        mode.on_config_changed(&mut ctx, &prefs);
        mode.start(&mut ctx);
        Ok(trainer)
    }

    fn split(&mut self) -> (&mut ActiveMode<S>, Context<'_>) {
        let ctx = Context {
            now_ms: self.now_ms,
            timing: self.timing,
            key: &mut self.key,
            line: &mut self.line,
            display: &mut self.display,
            radio: &mut self.radio,
        };
        (&mut self.mode, ctx)
    }

    /// Run one loop iteration with raw paddle contacts
    ///
    /// Returns true while the paddles are busy.
    pub fn tick(&mut self, now_us: u64, left: bool, right: bool) -> bool {
        let paddles = self.debouncer.sample(
            now_us,
            left,
            right,
            self.prefs.keyer_mode,
            self.prefs.polarity,
        );
        self.now_ms = now_us / 1000;
        let (mode, mut ctx) = self.split();
        mode.step(&mut ctx, paddles)
    }

    /// Forward an event from the tone decoder
    pub fn decoded(&mut self, event: DecoderEvent<'_>) {
        let (mode, mut ctx) = self.split();
        mode.on_decoded(&mut ctx, event);
    }

    /// Pause or continue the active mode; returns true if now paused
    pub fn toggle_pause(&mut self) -> bool {
        let (mode, mut ctx) = self.split();
        mode.toggle_pause(&mut ctx)
    }

    /// Apply new preferences
    ///
    /// # Errors
    ///
    /// Returns an error and keeps the old preferences if a value is out of
    /// range.
    pub fn set_preferences(&mut self, prefs: Preferences) -> Result<(), ConfigError> {
        self.timing = prefs.timing().inspect_err(|err| {
            warn!("config: rejected: {}", err);
        })?;
        self.prefs = prefs;
        self.radio.set_wpm(self.prefs.wpm);
        info!(
            "config: {} wpm, effective {} wpm",
            self.prefs.wpm, self.timing.effective_wpm
        );
        let prefs = self.prefs;
        let (mode, mut ctx) = self.split();
        mode.on_config_changed(&mut ctx, &prefs);
        Ok(())
    }

    /// Leave the current mode and start `next`
    pub fn switch_mode(&mut self, next: ActiveMode<S>) {
        let prefs = self.prefs;
        let (mode, mut ctx) = self.split();
        mode.switch(next, &mut ctx, &prefs);
    }

    /// Which mode is active
    #[must_use]
    pub const fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    /// The active mode
    #[must_use]
    pub const fn mode(&self) -> &ActiveMode<S> {
        &self.mode
    }

    /// Current preferences
    #[must_use]
    pub const fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Current transmit timing
    #[must_use]
    pub const fn timing(&self) -> &TimingParameters {
        &self.timing
    }

    /// Key-out arbitration state
    #[must_use]
    pub const fn key_out(&self) -> &KeyOut {
        &self.key
    }

    /// The key line
    #[must_use]
    pub const fn line(&self) -> &L {
        &self.line
    }

    /// The display
    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// The display, mutable
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// The radio link
    #[must_use]
    pub const fn radio(&self) -> &R {
        &self.radio
    }

    /// The radio link, mutable
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }
}
