//! CW Generator
//!
//! Plays words from a [`WordSource`] as timed Morse: keys the line,
//! prints the clear text character by character and optionally forwards
//! the elements to the radio. Two states, `KeyUp` and `KeyDown`; a step
//! before the stored deadline does nothing.

use crate::config::{Preferences, END_SEQUENCE, REPEAT_FOREVER, START_SEQUENCE};
use crate::morse::code::{self, CwSymbol, CwSymbolSequence, ERROR_CHAR};
use crate::morse::key_out::KeySource;
use crate::morse::timing::{TimingParameters, TimingSource};
use crate::morse::words::WordSource;
use crate::morse::Context;
use crate::types::{bounded, Element, TextStyle, Word};

/// Generator state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GeneratorState {
    /// Between elements, fetch the next symbol when due
    #[default]
    KeyUp,
    /// An element is sounding
    KeyDown,
}

/// What the display gets when a new word starts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WordEndMethod {
    /// Nothing
    Nothing,
    /// A word break
    Space,
    /// A word break and a flush
    #[default]
    SpaceAndFlush,
    /// Clear the current line
    LineFeed,
}

/// Generator settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Timing to play with
    pub timing: TimingSource,
    /// Key the line while playing
    pub key: bool,
    /// Key-out source used for keying
    pub key_source: KeySource,
    /// Sidetone pitch
    pub pitch_hz: u16,
    /// Print each character when it is complete
    pub print_char: bool,
    /// Style of printed characters
    pub print_style: TextStyle,
    /// Print a word break after every character
    pub print_space_after_char: bool,
    /// Print `.`/`-` for every element
    pub print_dit_dah: bool,
    /// Display action at the start of a new word
    pub word_end: WordEndMethod,
    /// Forward elements to the radio, one packet per word
    pub send_to_radio: bool,
}

impl GeneratorConfig {
    /// Default generator settings for the given preferences
    #[must_use]
    pub const fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            timing: TimingSource::Tx,
            key: true,
            key_source: KeySource::Internal,
            pitch_hz: prefs.sidetone_hz,
            print_char: true,
            print_style: TextStyle::Regular,
            print_space_after_char: false,
            print_dit_dah: false,
            word_end: WordEndMethod::SpaceAndFlush,
            send_to_radio: false,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_preferences(&Preferences::default())
    }
}

/// Lets a mode stretch or replace the pause after a word
pub trait WordEndPolicy {
    /// Called when the last element of a word ends; `Some(ms)` replaces
    /// the default word gap
    fn word_end_delay(&mut self, default_ms: u32) -> Option<u32>;
}

/// Plain word spacing
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSpacing;

impl WordEndPolicy for DefaultSpacing {
    fn word_end_delay(&mut self, _default_ms: u32) -> Option<u32> {
        None
    }
}

/// Chooses the next word: start sequence, end marker, repetitions
#[derive(Clone, Debug)]
pub struct WordSequencer {
    start_sequence: bool,
    send_start_sequence: bool,
    max_sequence: u8,
    repeat_each: u8,
    word_counter: u8,
    repetitions_left: u8,
    next_is_end: bool,
    repeat_last: bool,
    skip_repeat: bool,
    ended: bool,
    stopped: bool,
    last: Word,
}

impl Default for WordSequencer {
    fn default() -> Self {
        Self::new(false, 0, 1)
    }
}

impl WordSequencer {
    /// Create a sequencer
    ///
    /// `max_sequence == 0` plays forever; `repeat_each` of
    /// [`REPEAT_FOREVER`] repeats every word until [`Self::proceed`].
    #[must_use]
    pub const fn new(start_sequence: bool, max_sequence: u8, repeat_each: u8) -> Self {
        Self {
            start_sequence,
            send_start_sequence: start_sequence,
            max_sequence,
            repeat_each,
            word_counter: 0,
            repetitions_left: 0,
            next_is_end: false,
            repeat_last: false,
            skip_repeat: false,
            ended: false,
            stopped: false,
            last: Word::new(),
        }
    }

    /// Take the sequencing settings from the preferences
    #[must_use]
    pub const fn from_preferences(prefs: &Preferences) -> Self {
        Self::new(prefs.start_sequence, prefs.max_sequence, prefs.repeat_each)
    }

    /// Next word to play; empty if none (stopped or source empty)
    pub fn next_word(&mut self, source: &mut dyn WordSource) -> Word {
        // a requested repeat does not count towards the maximum sequence
        if self.repeat_last {
            self.repeat_last = false;
            if !self.last.is_empty() {
                return self.last.clone();
            }
        }
        if self.max_sequence > 0 {
            if self.word_counter >= self.max_sequence {
                self.stopped = true;
                self.word_counter = 0;
                return Word::new();
            }
            if self.word_counter == self.max_sequence - 1 {
                self.next_is_end = true;
            }
        }

        let word = if self.send_start_sequence {
            self.send_start_sequence = false;
            self.repetitions_left = 0;
            bounded(START_SEQUENCE)
        } else if self.next_is_end {
            self.next_is_end = false;
            self.ended = true;
            bounded(END_SEQUENCE)
        } else if !self.skip_repeat
            && !self.last.is_empty()
            && (self.repeat_each == REPEAT_FOREVER || self.repetitions_left > 0)
        {
            self.repetitions_left = self.repetitions_left.saturating_sub(1);
            self.last.clone()
        } else {
            self.skip_repeat = false;
            let word = source.next_word();
            if !word.is_empty() {
                self.repetitions_left = self.repeat_each.saturating_sub(1);
            }
            word
        };

        if !word.is_empty() {
            self.word_counter += 1;
            self.last.clone_from(&word);
        }
        word
    }

    /// Play the last word once more
    pub fn repeat_last(&mut self) {
        self.repeat_last = true;
    }

    /// Drop pending repetitions and go on with a new word
    pub fn proceed(&mut self) {
        self.repetitions_left = 0;
        self.repeat_last = false;
        self.skip_repeat = true;
    }

    /// Start a new run
    pub fn restart(&mut self) {
        self.send_start_sequence = self.start_sequence;
        self.word_counter = 0;
        self.repetitions_left = 0;
        self.next_is_end = false;
        self.repeat_last = false;
        self.skip_repeat = false;
        self.ended = false;
        self.stopped = false;
        self.last.clear();
    }

    /// The maximum sequence has been played
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// The end marker was the last word handed out
    #[must_use]
    pub const fn at_end(&self) -> bool {
        self.ended
    }

    /// Last word handed out
    #[must_use]
    pub fn last(&self) -> &str {
        &self.last
    }
}

/// Timed CW playback
#[derive(Clone, Debug)]
pub struct CwGenerator {
    config: GeneratorConfig,
    state: GeneratorState,
    deadline_ms: u64,
    symbols: CwSymbolSequence,
    clear_text: Word,
    text_pos: usize,
    sequencer: WordSequencer,
    rx_timing: TimingParameters,
}

impl Default for CwGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default(), WordSequencer::default())
    }
}

impl CwGenerator {
    /// Create a generator
    #[must_use]
    pub fn new(config: GeneratorConfig, sequencer: WordSequencer) -> Self {
        Self {
            config,
            state: GeneratorState::KeyUp,
            deadline_ms: 0,
            symbols: CwSymbolSequence::new(),
            clear_text: Word::new(),
            text_pos: 0,
            sequencer,
            rx_timing: TimingParameters::for_peer(crate::config::DEFAULT_WPM),
        }
    }

    /// Current settings
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Change the settings
    pub fn config_mut(&mut self) -> &mut GeneratorConfig {
        &mut self.config
    }

    /// Word sequencing
    #[must_use]
    pub const fn sequencer(&self) -> &WordSequencer {
        &self.sequencer
    }

    /// Word sequencing, for changing it
    pub fn sequencer_mut(&mut self) -> &mut WordSequencer {
        &mut self.sequencer
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> GeneratorState {
        self.state
    }

    /// Time of the next transition
    #[must_use]
    pub const fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// Receive timing of the word being played
    #[must_use]
    pub const fn rx_timing(&self) -> &TimingParameters {
        &self.rx_timing
    }

    /// Nothing is being played
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == GeneratorState::KeyUp && self.symbols.is_empty()
    }

    /// The maximum sequence has been played
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.sequencer.is_stopped()
    }

    /// Release the key and drop the rest of the current word; the
    /// sequence goes on with the next word
    pub fn pause(&mut self, ctx: &mut Context<'_>) {
        if self.state == GeneratorState::KeyDown && self.config.key {
            ctx.key_up(self.config.key_source);
        }
        self.state = GeneratorState::KeyUp;
        self.deadline_ms = 0;
        self.symbols.clear();
        self.clear_text.clear();
        self.text_pos = 0;
    }

    /// Release the key and restart at `KeyUp` with an expired deadline
    pub fn reset(&mut self, ctx: &mut Context<'_>) {
        self.pause(ctx);
        self.sequencer.restart();
    }

    /// Run one step
    pub fn step(
        &mut self,
        ctx: &mut Context<'_>,
        source: &mut dyn WordSource,
        word_end: &mut dyn WordEndPolicy,
    ) {
        if ctx.now_ms < self.deadline_ms {
            return;
        }
        match self.state {
            GeneratorState::KeyUp => self.on_key_up(ctx, source),
            GeneratorState::KeyDown => self.on_key_down(ctx, word_end),
        }
    }

    fn on_key_up(&mut self, ctx: &mut Context<'_>, source: &mut dyn WordSource) {
        loop {
            if self.symbols.is_empty() && !self.load_word(ctx, source) {
                return;
            }
            let element = match self.symbols.pop() {
                Some(CwSymbol::Dit) => Element::Dit,
                Some(CwSymbol::Dah) => Element::Dah,
                Some(CwSymbol::CharEnd) => {
                    if self.config.send_to_radio {
                        ctx.radio.encode_element(CwSymbol::CharEnd);
                    }
                    continue;
                }
                Some(CwSymbol::WordEnd) => continue,
                None => return,
            };

            let length = self
                .config
                .timing
                .element_ms(&ctx.timing, &self.rx_timing, element);
            self.deadline_ms = ctx.after(length);
            if self.config.send_to_radio {
                ctx.radio.encode_element(element.into());
            }
            if self.config.print_dit_dah {
                ctx.display.print_character(element.as_str(), TextStyle::Regular);
            }
            if self.config.key {
                ctx.key_down(self.config.key_source, self.config.pitch_hz);
            }
            self.state = GeneratorState::KeyDown;
            return;
        }
    }

    fn load_word(&mut self, ctx: &mut Context<'_>, source: &mut dyn WordSource) -> bool {
        if self.sequencer.is_stopped() {
            return false;
        }
        let word = self.sequencer.next_word(source);
        if word.is_empty() {
            return false;
        }
        if let Some(wpm) = source.peer_wpm() {
            if wpm > 0 {
                self.rx_timing = TimingParameters::for_peer(wpm);
            }
        }

        self.symbols = CwSymbolSequence::from_internal(&word);
        self.clear_text.clear();
        if self.symbols.is_error() {
            let _ = self.clear_text.push(ERROR_CHAR);
        } else {
            self.clear_text = word;
        }
        self.text_pos = 0;
        trace!("generator: word {}", self.clear_text.as_str());

        match self.config.word_end {
            WordEndMethod::Nothing => {}
            WordEndMethod::Space => ctx.display.print_word_break(),
            WordEndMethod::SpaceAndFlush => {
                ctx.display.print_word_break();
                ctx.display.flush();
            }
            WordEndMethod::LineFeed => ctx.display.clear_line(0),
        }
        true
    }

    fn on_key_down(&mut self, ctx: &mut Context<'_>, word_end: &mut dyn WordEndPolicy) {
        if self.config.key {
            ctx.key_up(self.config.key_source);
        }
        let tx = ctx.timing;
        let source = self.config.timing;

        let gap = if self.symbols.at_word_end() {
            self.print_next_char(ctx);
            self.symbols.clear();
            let default = source.inter_word_ms(&tx, &self.rx_timing);
            let mut gap = word_end.word_end_delay(default).unwrap_or(default);
            if self.config.send_to_radio {
                ctx.radio.encode_element(CwSymbol::CharEnd);
                ctx.radio.encode_element(CwSymbol::WordEnd);
                ctx.radio.finalize_and_send();
                gap += source.inter_character_ms(&tx, &self.rx_timing) + tx.dit_ms;
            }
            gap
        } else if self.symbols.peek() == Some(CwSymbol::CharEnd) {
            self.print_next_char(ctx);
            source.inter_character_ms(&tx, &self.rx_timing)
        } else {
            source.inter_element_ms(&tx, &self.rx_timing)
        };

        self.deadline_ms = ctx.after(gap);
        self.state = GeneratorState::KeyUp;
    }

    fn print_next_char(&mut self, ctx: &mut Context<'_>) {
        let Some(c) = self.clear_text[self.text_pos..].chars().next() else {
            return;
        };
        self.text_pos += c.len_utf8();
        if !self.config.print_char {
            return;
        }
        let mut buf = [0u8; 4];
        let text: &str = match code::display_of(c) {
            Some(display) => display,
            None => c.encode_utf8(&mut buf),
        };
        ctx.display.print_character(text, self.config.print_style);
        if self.config.print_space_after_char {
            ctx.display.print_word_break();
        }
    }
}
