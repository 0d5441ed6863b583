//! Keyer mode: the paddles key the sidetone (and the transmitter if
//! allowed) and the decoded characters are printed.

use crate::config::Preferences;
use crate::mode::{EchoToDisplay, OperatingMode};
use crate::morse::keyer::{IambicKeyer, KeyerConfig, PaddleState};
use crate::morse::Context;
use crate::types::{KeyTxPolicy, TextStyle};

/// Plain paddle keyer
#[derive(Clone, Debug)]
pub struct PaddleKeying {
    keyer: IambicKeyer,
    echo: EchoToDisplay,
    key_tx: KeyTxPolicy,
}

impl PaddleKeying {
    /// Create the mode from the preferences
    #[must_use]
    pub fn new(prefs: &Preferences) -> Self {
        Self {
            keyer: IambicKeyer::new(KeyerConfig::from_preferences(prefs)),
            echo: EchoToDisplay::new(TextStyle::Regular),
            key_tx: prefs.key_tx,
        }
    }

    /// The keyer
    #[must_use]
    pub const fn keyer(&self) -> &IambicKeyer {
        &self.keyer
    }
}

impl OperatingMode for PaddleKeying {
    fn start(&mut self, ctx: &mut Context<'_>) {
        self.keyer.reset();
        ctx.key.apply_policy(self.key_tx, false);
        info!("mode: keyer");
    }

    fn step(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool {
        self.keyer.step(ctx, paddles, &mut self.echo)
    }

    fn on_config_changed(&mut self, ctx: &mut Context<'_>, prefs: &Preferences) {
        self.keyer.set_config(KeyerConfig::from_preferences(prefs));
        self.key_tx = prefs.key_tx;
        ctx.key.apply_policy(self.key_tx, false);
    }

    fn exit(&mut self, ctx: &mut Context<'_>) {
        self.keyer.abort(ctx);
        ctx.release_key();
    }
}
