//! CW transceiver: the keyer runs as in keyer mode while an external
//! decoder feeds received characters and the received tone.

use crate::config::Preferences;
use crate::mode::{DecoderEvent, EchoToDisplay, OperatingMode};
use crate::morse::key_out::KeySource;
use crate::morse::keyer::{IambicKeyer, KeyerConfig, PaddleState};
use crate::morse::Context;
use crate::types::{KeyTxPolicy, TextStyle};

/// Keyer plus decoder
#[derive(Clone, Debug)]
pub struct CwTransceiver {
    keyer: IambicKeyer,
    echo: EchoToDisplay,
    key_tx: KeyTxPolicy,
}

impl CwTransceiver {
    /// Create the mode from the preferences
    #[must_use]
    pub fn new(prefs: &Preferences) -> Self {
        Self {
            keyer: IambicKeyer::new(KeyerConfig::from_preferences(prefs)),
            echo: EchoToDisplay::new(TextStyle::Outgoing),
            key_tx: prefs.key_tx,
        }
    }

    /// The keyer
    #[must_use]
    pub const fn keyer(&self) -> &IambicKeyer {
        &self.keyer
    }
}

impl OperatingMode for CwTransceiver {
    fn start(&mut self, ctx: &mut Context<'_>) {
        self.keyer.reset();
        ctx.key.apply_policy(self.key_tx, false);
        info!("mode: transceiver");
    }

    fn step(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool {
        self.keyer.step(ctx, paddles, &mut self.echo)
    }

    fn on_config_changed(&mut self, ctx: &mut Context<'_>, prefs: &Preferences) {
        self.keyer.set_config(KeyerConfig::from_preferences(prefs));
        self.key_tx = prefs.key_tx;
        ctx.key.apply_policy(self.key_tx, false);
    }

    fn on_decoded(&mut self, ctx: &mut Context<'_>, event: DecoderEvent<'_>) {
        match event {
            DecoderEvent::Character(text) => {
                ctx.display.print_character(text, TextStyle::Incoming);
            }
            DecoderEvent::WordBoundary => ctx.display.print_word_break(),
            DecoderEvent::ToneOn(pitch_hz) => ctx.key_down(KeySource::External, pitch_hz),
            DecoderEvent::ToneOff => ctx.key_up(KeySource::External),
        }
    }

    fn exit(&mut self, ctx: &mut Context<'_>) {
        self.keyer.abort(ctx);
        ctx.release_key();
    }
}
