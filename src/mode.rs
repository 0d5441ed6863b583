//! Operating Modes
//!
//! Each mode wires the keyer, the generator and the radio together for
//! one use of the device. The loop owner drives the active mode through
//! [`OperatingMode`]; switching modes always runs `exit` first, which
//! resets the state machines and releases the key line.

pub mod echo;
pub mod generator;
pub mod keyer;
pub mod lora;
pub mod tennis;
pub mod transceiver;

pub use echo::{EchoState, EchoTrainer};
pub use generator::CwPlayback;
pub use keyer::PaddleKeying;
pub use lora::LoraTransceiver;
pub use tennis::TennisGame;
pub use transceiver::CwTransceiver;

use crate::config::Preferences;
use crate::morse::keyer::{KeyerListener, PaddleState};
use crate::morse::words::WordSource;
use crate::morse::Context;
use crate::types::TextStyle;

/// Output of an external tone decoder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderEvent<'a> {
    /// A character was decoded (display form)
    Character(&'a str),
    /// A word gap was detected
    WordBoundary,
    /// The decoded tone started
    ToneOn(u16),
    /// The decoded tone stopped
    ToneOff,
}

/// Lifecycle of a mode
pub trait OperatingMode {
    /// Enter the mode
    fn start(&mut self, ctx: &mut Context<'_>);

    /// Run one loop iteration; returns true while the paddles are busy
    fn step(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool;

    /// Pause or continue; returns true if the mode is now paused
    fn toggle_pause(&mut self, _ctx: &mut Context<'_>) -> bool {
        false
    }

    /// The preferences changed (already validated)
    fn on_config_changed(&mut self, ctx: &mut Context<'_>, prefs: &Preferences);

    /// Event from the external decoder
    fn on_decoded(&mut self, _ctx: &mut Context<'_>, _event: DecoderEvent<'_>) {}

    /// Leave the mode: reset the state machines and release the key
    fn exit(&mut self, ctx: &mut Context<'_>);
}

/// Prints what the keyer produced
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoToDisplay {
    /// Style of the printed characters
    pub style: TextStyle,
}

impl EchoToDisplay {
    /// Echo in the given style
    #[must_use]
    pub const fn new(style: TextStyle) -> Self {
        Self { style }
    }
}

impl KeyerListener for EchoToDisplay {
    fn on_character(&mut self, ctx: &mut Context<'_>, text: &str) {
        ctx.display.print_character(text, self.style);
    }

    fn on_word_end(&mut self, ctx: &mut Context<'_>) {
        ctx.display.print_word_break();
    }
}

/// Which mode is active
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeKind {
    /// Paddle keyer
    Keyer,
    /// CW generator
    Generator,
    /// Keyer plus decoder
    Transceiver,
    /// Keyer plus LoRa link
    Lora,
    /// Morse tennis
    Tennis,
    /// Echo trainer
    Echo,
}

/// The active mode
#[derive(Debug)]
pub enum ActiveMode<S: WordSource> {
    /// Paddle keyer
    Keyer(PaddleKeying),
    /// CW generator
    Generator(CwPlayback<S>),
    /// Keyer plus decoder
    Transceiver(CwTransceiver),
    /// Keyer plus LoRa link
    Lora(LoraTransceiver),
    /// Morse tennis
    Tennis(TennisGame),
    /// Echo trainer
    Echo(EchoTrainer<S>),
}

impl<S: WordSource> ActiveMode<S> {
    /// Which mode this is
    #[must_use]
    pub const fn kind(&self) -> ModeKind {
        match self {
            Self::Keyer(_) => ModeKind::Keyer,
            Self::Generator(_) => ModeKind::Generator,
            Self::Transceiver(_) => ModeKind::Transceiver,
            Self::Lora(_) => ModeKind::Lora,
            Self::Tennis(_) => ModeKind::Tennis,
            Self::Echo(_) => ModeKind::Echo,
        }
    }

    /// Leave the current mode and start `next`
    pub fn switch(&mut self, next: Self, ctx: &mut Context<'_>, prefs: &Preferences) {
        self.exit(ctx);
        *self = next;
        self.on_config_changed(ctx, prefs);
        self.start(ctx);
    }

    fn as_mode(&mut self) -> &mut dyn OperatingMode {
        match self {
            Self::Keyer(mode) => mode,
            Self::Generator(mode) => mode,
            Self::Transceiver(mode) => mode,
            Self::Lora(mode) => mode,
            Self::Tennis(mode) => mode,
            Self::Echo(mode) => mode,
        }
    }
}

impl<S: WordSource> OperatingMode for ActiveMode<S> {
    fn start(&mut self, ctx: &mut Context<'_>) {
        self.as_mode().start(ctx);
    }

    fn step(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool {
        self.as_mode().step(ctx, paddles)
    }

    fn toggle_pause(&mut self, ctx: &mut Context<'_>) -> bool {
        self.as_mode().toggle_pause(ctx)
    }

    fn on_config_changed(&mut self, ctx: &mut Context<'_>, prefs: &Preferences) {
        self.as_mode().on_config_changed(ctx, prefs);
    }

    fn on_decoded(&mut self, ctx: &mut Context<'_>, event: DecoderEvent<'_>) {
        self.as_mode().on_decoded(ctx, event);
    }

    fn exit(&mut self, ctx: &mut Context<'_>) {
        self.as_mode().exit(ctx);
    }
}
