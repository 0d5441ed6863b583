//! Echo trainer: the generator plays a word without showing it, the
//! operator keys it back. A correct answer moves on to the next word, a
//! wrong or missing one repeats the word. With a maximum sequence set the
//! session ends after `<ar>`.

use crate::config::{Preferences, ECHO_ANSWER_TIMEOUT_GAPS};
use crate::mode::OperatingMode;
use crate::morse::code;
use crate::morse::generator::{
    CwGenerator, GeneratorConfig, WordEndMethod, WordEndPolicy, WordSequencer,
};
use crate::morse::keyer::{IambicKeyer, KeyerConfig, KeyerListener, PaddleState, WordGap};
use crate::morse::words::WordSource;
use crate::morse::Context;
use crate::types::{Message, TextStyle};

/// Echo trainer state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EchoState {
    /// Playing the word (or waiting to start it)
    #[default]
    Prompt,
    /// Waiting for the first keyed character
    Answer,
    /// Keying the answer, waiting for the word gap
    Completing,
    /// The end marker was played
    Stopped,
}

#[cfg(feature = "embedded")]
impl defmt::Format for EchoState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Prompt => defmt::write!(f, "Prompt"),
            Self::Answer => defmt::write!(f, "Answer"),
            Self::Completing => defmt::write!(f, "Completing"),
            Self::Stopped => defmt::write!(f, "Stopped"),
        }
    }
}

#[derive(Default)]
struct PromptEnd {
    done: bool,
}

impl WordEndPolicy for PromptEnd {
    fn word_end_delay(&mut self, _default_ms: u32) -> Option<u32> {
        self.done = true;
        None
    }
}

struct Response<'r> {
    text: &'r mut Message,
    word_done: bool,
}

impl KeyerListener for Response<'_> {
    fn on_character(&mut self, ctx: &mut Context<'_>, text: &str) {
        if self.text.push_str(text).is_err() {
            warn!("echo: answer too long");
        }
        ctx.display.print_character(text, TextStyle::Outgoing);
    }

    fn on_word_end(&mut self, _ctx: &mut Context<'_>) {
        self.word_done = true;
    }
}

fn keyer_config(prefs: &Preferences) -> KeyerConfig {
    KeyerConfig {
        word_gap: WordGap::Nominal,
        ..KeyerConfig::from_preferences(prefs).with_echo_shift(prefs)
    }
}

fn prompt_config(prefs: &Preferences) -> GeneratorConfig {
    GeneratorConfig {
        print_char: false,
        word_end: WordEndMethod::Nothing,
        ..GeneratorConfig::from_preferences(prefs)
    }
}

/// Echo trainer session
#[derive(Clone, Debug)]
pub struct EchoTrainer<S: WordSource> {
    keyer: IambicKeyer,
    generator: CwGenerator,
    source: S,
    state: EchoState,
    prompt_at: u64,
    answer_deadline: u64,
    response: Message,
    paused: bool,
}

impl<S: WordSource> EchoTrainer<S> {
    /// Create the mode from the preferences
    #[must_use]
    pub fn new(prefs: &Preferences, source: S) -> Self {
        Self {
            keyer: IambicKeyer::new(keyer_config(prefs)),
            generator: CwGenerator::new(prompt_config(prefs), WordSequencer::from_preferences(prefs)),
            source,
            state: EchoState::Prompt,
            prompt_at: 0,
            answer_deadline: 0,
            response: Message::new(),
            paused: false,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> EchoState {
        self.state
    }

    /// The word the operator has to key back (internal form)
    #[must_use]
    pub fn expected(&self) -> &str {
        self.generator.sequencer().last()
    }

    /// The word source
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn restart(&mut self, ctx: &mut Context<'_>) {
        self.generator.reset(ctx);
        self.keyer.reset();
        self.response.clear();
        self.state = EchoState::Prompt;
        self.prompt_at = ctx.now_ms;
    }

    fn play_prompt(&mut self, ctx: &mut Context<'_>) {
        if ctx.now_ms < self.prompt_at {
            return;
        }
        let mut end = PromptEnd::default();
        self.generator.step(ctx, &mut self.source, &mut end);
        if !end.done {
            return;
        }
        if self.generator.sequencer().at_end() {
            info!("echo: sequence complete");
            self.state = EchoState::Stopped;
            return;
        }
        self.keyer.reset();
        self.response.clear();
        self.answer_deadline = ctx.after(ECHO_ANSWER_TIMEOUT_GAPS * ctx.timing.inter_word_ms);
        self.state = EchoState::Answer;
    }

    fn collect_answer(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool {
        let mut response = Response {
            text: &mut self.response,
            word_done: false,
        };
        let busy = self.keyer.step(ctx, paddles, &mut response);
        let word_done = response.word_done;

        if self.state == EchoState::Answer && !self.response.is_empty() {
            self.state = EchoState::Completing;
        }
        let timed_out = self.state == EchoState::Answer && ctx.now_ms > self.answer_deadline;
        if word_done || timed_out {
            self.evaluate(ctx);
        }
        busy
    }

    fn evaluate(&mut self, ctx: &mut Context<'_>) {
        let answer = code::display_to_internal(&self.response);
        let passed = answer.as_str() == self.expected();
        debug!("echo: answer {} expected {}", answer.as_str(), self.expected());
        if passed {
            ctx.display.print_character(" OK", TextStyle::Bold);
        } else {
            ctx.display.print_character(" ERR", TextStyle::Bold);
            self.generator.sequencer_mut().repeat_last();
        }
        ctx.display.print_word_break();
        ctx.display.flush();

        self.response.clear();
        self.prompt_at = ctx.after(ctx.timing.inter_word_ms);
        self.state = EchoState::Prompt;
    }
}

impl<S: WordSource> OperatingMode for EchoTrainer<S> {
    fn start(&mut self, ctx: &mut Context<'_>) {
        self.restart(ctx);
        self.paused = false;
        ctx.key.set_transmit_enabled(false);
        info!("mode: echo trainer");
    }

    fn step(&mut self, ctx: &mut Context<'_>, paddles: PaddleState) -> bool {
        if self.paused {
            return paddles.is_pressed();
        }
        match self.state {
            EchoState::Prompt => {
                self.play_prompt(ctx);
                paddles.is_pressed()
            }
            EchoState::Answer | EchoState::Completing => self.collect_answer(ctx, paddles),
            EchoState::Stopped => {
                if paddles.is_pressed() {
                    self.restart(ctx);
                }
                paddles.is_pressed()
            }
        }
    }

    fn toggle_pause(&mut self, ctx: &mut Context<'_>) -> bool {
        if self.paused {
            self.paused = false;
            if self.state == EchoState::Stopped {
                self.restart(ctx);
            }
            self.prompt_at = ctx.now_ms;
            debug!("echo: continue");
        } else {
            // an unanswered word is asked again
            let unanswered = match self.state {
                EchoState::Prompt => !self.generator.is_idle(),
                EchoState::Answer | EchoState::Completing => true,
                EchoState::Stopped => false,
            };
            if unanswered {
                self.generator.sequencer_mut().repeat_last();
            }
            self.generator.pause(ctx);
            self.keyer.abort(ctx);
            self.response.clear();
            if self.state != EchoState::Stopped {
                self.state = EchoState::Prompt;
            }
            self.paused = true;
            debug!("echo: paused");
        }
        self.paused
    }

    fn on_config_changed(&mut self, ctx: &mut Context<'_>, prefs: &Preferences) {
        self.keyer.set_config(keyer_config(prefs));
        *self.generator.config_mut() = prompt_config(prefs);
        *self.generator.sequencer_mut() = WordSequencer::from_preferences(prefs);
        ctx.key.set_transmit_enabled(false);
    }

    fn exit(&mut self, ctx: &mut Context<'_>) {
        self.keyer.abort(ctx);
        self.generator.reset(ctx);
        self.response.clear();
        self.paused = false;
        ctx.release_key();
    }
}
