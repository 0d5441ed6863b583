//! LoRa transceiver: what the operator keys goes out one packet per word;
//! received packets are played on the external key source at the sender's
//! speed while the paddles stay usable.

use crate::config::{Preferences, RX_WORD_QUEUE_LEN};
use crate::lora::Packet;
use crate::mode::{EchoToDisplay, OperatingMode};
use crate::morse::generator::{
    CwGenerator, DefaultSpacing, GeneratorConfig, WordEndMethod, WordSequencer,
};
use crate::morse::key_out::KeySource;
use crate::morse::keyer::{IambicKeyer, KeyerConfig, PaddleState};
use crate::morse::timing::TimingSource;
use crate::morse::words::QueuedWords;
use crate::morse::Context;
use crate::types::TextStyle;

fn keyer_config(prefs: &Preferences) -> KeyerConfig {
    let mut config = KeyerConfig::from_preferences(prefs).with_echo_shift(prefs);
    config.encode_for_radio = true;
    config
}

fn playback_config(prefs: &Preferences) -> GeneratorConfig {
    GeneratorConfig {
        timing: TimingSource::Rx,
        key_source: KeySource::External,
        print_style: TextStyle::Incoming,
        word_end: WordEndMethod::Space,
        ..GeneratorConfig::from_preferences(prefs)
    }
}

/// Keyer plus LoRa link
#[derive(Clone, Debug)]
pub struct LoraTransceiver {
    keyer: IambicKeyer,
    echo: EchoToDisplay,
    playback: CwGenerator,
    incoming: QueuedWords<RX_WORD_QUEUE_LEN>,
    last_rssi: Option<i16>,
}

impl LoraTransceiver {
    /// Create the mode from the preferences
    #[must_use]
    pub fn new(prefs: &Preferences) -> Self {
        Self {
            keyer: IambicKeyer::new(keyer_config(prefs)),
            echo: EchoToDisplay::new(TextStyle::Outgoing),
            playback: CwGenerator::new(playback_config(prefs), WordSequencer::default()),
            incoming: QueuedWords::new(),
            last_rssi: None,
        }
    }

    /// The keyer
    #[must_use]
    pub const fn keyer(&self) -> &IambicKeyer {
        &self.keyer
    }

    /// Words waiting to be played
    #[must_use]
    pub fn pending_words(&self) -> usize {
        self.incoming.len()
    }

    /// Signal strength of the last valid packet
    #[must_use]
    pub const fn last_rssi(&self) -> Option<i16> {
        self.last_rssi
    }

    fn accept(&mut self, packet: &Packet) {
        if !packet.valid {
            debug!("lora: ignoring invalid packet, rssi {}", packet.rssi);
            return;
        }
        self.last_rssi = Some(packet.rssi);
        let text = packet.to_text();
        let queued = self.incoming.push_text(&text, Some(packet.wpm));
        debug!("lora: rx {} words at {} wpm", queued, packet.wpm);
    }
}

impl OperatingMode for LoraTransceiver {
    fn start(&mut self, ctx: &mut Context<'_>) {
        self.keyer.reset();
        ctx.key.set_transmit_enabled(false);
        info!("mode: lora transceiver");
    }

    fn step(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool {
        let busy = self.keyer.step(ctx, paddles, &mut self.echo);
        if let Some(packet) = ctx.radio.receive_packet() {
            self.accept(&packet);
        }
        self.playback.step(ctx, &mut self.incoming, &mut DefaultSpacing);
        busy
    }

    fn on_config_changed(&mut self, ctx: &mut Context<'_>, prefs: &Preferences) {
        self.keyer.set_config(keyer_config(prefs));
        *self.playback.config_mut() = playback_config(prefs);
        ctx.key.set_transmit_enabled(false);
    }

    fn exit(&mut self, ctx: &mut Context<'_>) {
        self.keyer.abort(ctx);
        self.playback.reset(ctx);
        self.incoming.clear();
        ctx.release_key();
    }
}
