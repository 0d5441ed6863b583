//! Generator mode: plays words from a [`WordSource`]. A paddle press
//! pauses or continues; a finished sequence pauses until the next press.

use crate::config::Preferences;
use crate::mode::OperatingMode;
use crate::morse::generator::{CwGenerator, DefaultSpacing, GeneratorConfig, WordSequencer};
use crate::morse::keyer::PaddleState;
use crate::morse::words::WordSource;
use crate::morse::Context;
use crate::types::KeyTxPolicy;

/// Word playback
#[derive(Clone, Debug)]
pub struct CwPlayback<S: WordSource> {
    generator: CwGenerator,
    source: S,
    running: bool,
    paddle_down: bool,
    key_tx: KeyTxPolicy,
}

impl<S: WordSource> CwPlayback<S> {
    /// Create the mode from the preferences
    #[must_use]
    pub fn new(prefs: &Preferences, source: S) -> Self {
        Self {
            generator: CwGenerator::new(
                GeneratorConfig::from_preferences(prefs),
                WordSequencer::from_preferences(prefs),
            ),
            source,
            running: false,
            paddle_down: false,
            key_tx: prefs.key_tx,
        }
    }

    /// The generator
    #[must_use]
    pub const fn generator(&self) -> &CwGenerator {
        &self.generator
    }

    /// The generator, for changing its settings
    pub fn generator_mut(&mut self) -> &mut CwGenerator {
        &mut self.generator
    }

    /// The word source
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Words are being played
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
}

impl<S: WordSource> OperatingMode for CwPlayback<S> {
    fn start(&mut self, ctx: &mut Context<'_>) {
        self.generator.reset(ctx);
        ctx.key.apply_policy(self.key_tx, true);
        self.running = true;
        self.paddle_down = false;
        info!("mode: generator");
    }

    fn step(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool {
        let pressed = paddles.is_pressed();
        if pressed && !self.paddle_down {
            self.toggle_pause(ctx);
        }
        self.paddle_down = pressed;

        if self.running {
            self.generator.step(ctx, &mut self.source, &mut DefaultSpacing);
            if self.generator.is_stopped() {
                debug!("generator: sequence complete");
                self.generator.pause(ctx);
                self.running = false;
            }
        }
        pressed
    }

    fn toggle_pause(&mut self, ctx: &mut Context<'_>) -> bool {
        if self.running {
            self.generator.pause(ctx);
            self.running = false;
            debug!("generator: paused");
        } else {
            if self.generator.is_stopped() {
                self.generator.sequencer_mut().restart();
            }
            self.running = true;
            debug!("generator: continue");
        }
        !self.running
    }

    fn on_config_changed(&mut self, ctx: &mut Context<'_>, prefs: &Preferences) {
        let config = self.generator.config_mut();
        config.pitch_hz = prefs.sidetone_hz;
        *self.generator.sequencer_mut() = WordSequencer::from_preferences(prefs);
        self.key_tx = prefs.key_tx;
        ctx.key.apply_policy(self.key_tx, true);
    }

    fn exit(&mut self, ctx: &mut Context<'_>) {
        self.generator.reset(ctx);
        self.running = false;
        ctx.release_key();
    }
}
