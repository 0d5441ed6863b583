//! Morse tennis over the LoRa link
//!
//! Keyed characters collect in a [`WordBuffer`]; every completed word is
//! offered to the game. Received messages are played back first and only
//! handed to the game once their last word has sounded.

use heapless::Deque;

use crate::config::{Preferences, RX_WORD_QUEUE_LEN};
use crate::lora::{self, Packet};
use crate::mode::OperatingMode;
use crate::morse::generator::{
    CwGenerator, GeneratorConfig, WordEndMethod, WordEndPolicy, WordSequencer,
};
use crate::morse::key_out::KeySource;
use crate::morse::keyer::{IambicKeyer, KeyerConfig, KeyerListener, PaddleState};
use crate::morse::timing::TimingSource;
use crate::morse::words::QueuedWords;
use crate::morse::Context;
use crate::tennis::{TennisClient, TennisMachine, WordBuffer};
use crate::types::{Message, TextStyle};

/// Display line used for game prompts
pub const STATUS_LINE: u8 = 1;

const PENDING_MESSAGES: usize = 4;

struct BufferKeyed<'b> {
    buffer: &'b mut WordBuffer,
    word_done: bool,
}

impl KeyerListener for BufferKeyed<'_> {
    fn on_character(&mut self, ctx: &mut Context<'_>, text: &str) {
        self.buffer.add_char(text);
        ctx.display.print_character(text, TextStyle::Outgoing);
    }

    fn on_word_end(&mut self, ctx: &mut Context<'_>) {
        self.buffer.end_word();
        ctx.display.print_word_break();
        self.word_done = true;
    }
}

struct ContextClient<'c, 'a> {
    ctx: &'c mut Context<'a>,
}

impl TennisClient for ContextClient<'_, '_> {
    fn print(&mut self, text: &str) {
        self.ctx.display.clear_line(STATUS_LINE);
        self.ctx.display.print_character(text, TextStyle::Inverse);
        self.ctx.display.flush();
    }

    fn send(&mut self, text: &str) {
        debug!("tennis: send {}", text);
        lora::send_text(&mut *self.ctx.radio, text);
    }

    fn notify_result(&mut self, passed: bool) {
        info!("tennis: answer {}", if passed { "ok" } else { "wrong" });
    }
}

/// Counts the words of received messages as they are played
#[derive(Clone, Debug, Default)]
pub struct MessagePlayback {
    pending: Deque<(Message, usize), PENDING_MESSAGES>,
    completed: Option<Message>,
}

impl MessagePlayback {
    /// Track a message of `words` queued words
    ///
    /// Returns false if too many messages are pending.
    pub fn push(&mut self, message: Message, words: usize) -> bool {
        self.pending.push_back((message, words)).is_ok()
    }

    /// Take the message whose last word just finished playing
    pub fn take_completed(&mut self) -> Option<Message> {
        self.completed.take()
    }

    /// No room for another message
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pending.is_full()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.pending.clear();
        self.completed = None;
    }
}

impl WordEndPolicy for MessagePlayback {
    fn word_end_delay(&mut self, default_ms: u32) -> Option<u32> {
        let (_, left) = self.pending.front_mut()?;
        *left = left.saturating_sub(1);
        if *left > 0 {
            return None;
        }
        self.completed = self.pending.pop_front().map(|(message, _)| message);
        Some(default_ms * 2)
    }
}

fn keyer_config(prefs: &Preferences) -> KeyerConfig {
    KeyerConfig::from_preferences(prefs).with_echo_shift(prefs)
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

/// Morse tennis session
#[derive(Clone, Debug)]
pub struct TennisGame {
    keyer: IambicKeyer,
    machine: TennisMachine,
    buffer: WordBuffer,
    playback: CwGenerator,
    incoming: QueuedWords<RX_WORD_QUEUE_LEN>,
    messages: MessagePlayback,
}

impl TennisGame {
    /// Create the mode from the preferences
    #[must_use]
    pub fn new(prefs: &Preferences) -> Self {
        Self {
            keyer: IambicKeyer::new(keyer_config(prefs)),
            machine: TennisMachine::new(),
            buffer: WordBuffer::new(),
            playback: CwGenerator::new(playback_config(prefs), WordSequencer::default()),
            incoming: QueuedWords::new(),
            messages: MessagePlayback::default(),
        }
    }

    /// The game
    #[must_use]
    pub const fn machine(&self) -> &TennisMachine {
        &self.machine
    }

    /// What the operator keyed since the last commit
    #[must_use]
    pub const fn buffer(&self) -> &WordBuffer {
        &self.buffer
    }

    fn accept(&mut self, packet: &Packet) {
        if !packet.valid {
            debug!("tennis: ignoring invalid packet");
            return;
        }
        let text = packet.to_text();
        if text.is_empty() {
            return;
        }
        // a message is played only if it can be tracked to its last word
        let words = text.split_whitespace().count();
        if self.messages.is_full() || self.incoming.len() + words > RX_WORD_QUEUE_LEN {
            warn!("tennis: receive queue full, message dropped");
            return;
        }
        let queued = self.incoming.push_text(&text, Some(packet.wpm));
        if queued > 0 && !self.messages.push(text, queued) {
            warn!("tennis: receive queue full, message dropped");
        }
    }
}

impl OperatingMode for TennisGame {
    fn start(&mut self, ctx: &mut Context<'_>) {
        self.keyer.reset();
        self.buffer.clear();
        ctx.key.set_transmit_enabled(false);
        info!("mode: tennis");
        self.machine.start(&mut ContextClient { ctx: &mut *ctx });
    }

    fn step(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool {
        let mut keyed = BufferKeyed {
            buffer: &mut self.buffer,
            word_done: false,
        };
        let busy = self.keyer.step(ctx, paddles, &mut keyed);
        if keyed.word_done {
            let mut client = ContextClient { ctx: &mut *ctx };
            self.machine.on_message_transmit(&mut self.buffer, &mut client);
        }

        if let Some(packet) = ctx.radio.receive_packet() {
            self.accept(&packet);
        }
        self.playback.step(ctx, &mut self.incoming, &mut self.messages);
        if let Some(message) = self.messages.take_completed() {
            let mut client = ContextClient { ctx: &mut *ctx };
            self.machine.on_message_receive(&message, &mut client);
        }
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
        self.messages.clear();
        self.buffer.clear();
        ctx.release_key();
    }
}
