//! Word Sources
//!
//! Where the generator gets its words. Radio-fed modes queue received
//! words in a [`QueuedWords`]; the trainer uses [`RandomWords`] for
//! character groups, call signs and Koch lessons. Dictionary, abbreviation
//! and file sources implement [`WordSource`] outside the core.
//!
//! All words are in internal form (see [`crate::morse::code`]).

use core::ops::Range;

use heapless::Deque;

use crate::morse::code::{self, groups, CODE_TABLE};
use crate::types::{bounded, Word};

/// Supplier of words for the generator
pub trait WordSource {
    /// Next word, empty if none is available yet
    fn next_word(&mut self) -> Word;

    /// Speed of the station the last word came from
    fn peer_wpm(&self) -> Option<u8> {
        None
    }
}

/// FIFO of words with the speed they were sent at
#[derive(Clone, Debug, Default)]
pub struct QueuedWords<const N: usize> {
    words: Deque<(Word, Option<u8>), N>,
    current_wpm: Option<u8>,
}

impl<const N: usize> QueuedWords<N> {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: Deque::new(),
            current_wpm: None,
        }
    }

    /// Queue a word in internal form
    ///
    /// Returns false if the queue is full and the word was dropped.
    pub fn push_internal(&mut self, word: &str, wpm: Option<u8>) -> bool {
        self.words.push_back((bounded(word), wpm)).is_ok()
    }

    /// Queue every word of a display text (`<sk>` style prosigns)
    ///
    /// Returns the number of words queued.
    pub fn push_text(&mut self, text: &str, wpm: Option<u8>) -> usize {
        let mut queued = 0;
        for word in text.split_whitespace() {
            let internal = code::display_to_internal(word);
            if !self.push_internal(&internal, wpm) {
                warn!("words: queue full, dropping rest of message");
                break;
            }
            queued += 1;
        }
        queued
    }

    /// Number of queued words
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Nothing queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Drop all queued words
    pub fn clear(&mut self) {
        self.words.clear();
    }
}

impl<const N: usize> WordSource for QueuedWords<N> {
    fn next_word(&mut self) -> Word {
        match self.words.pop_front() {
            Some((word, wpm)) => {
                self.current_wpm = wpm;
                word
            }
            None => Word::new(),
        }
    }

    fn peer_wpm(&self) -> Option<u8> {
        self.current_wpm
    }
}

/// Character pool for random groups
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CharPool {
    /// Letters
    #[default]
    Alpha,
    /// Digits
    Numbers,
    /// Punctuation
    Punctuation,
    /// Prosigns
    Prosigns,
    /// Letters and digits
    AlphaNumeric,
    /// Digits and punctuation
    NumbersPunctuation,
    /// Punctuation and prosigns
    PunctuationProsigns,
    /// Letters, digits and punctuation
    AlphaNumericPunctuation,
    /// Everything except the error sign and umlauts
    All,
}

impl CharPool {
    /// Table index range of the pool
    #[must_use]
    pub const fn range(self) -> Range<usize> {
        match self {
            Self::Alpha => groups::ALPHA,
            Self::Numbers => groups::NUMBERS,
            Self::Punctuation => groups::PUNCTUATION,
            Self::Prosigns => groups::PROSIGNS,
            Self::AlphaNumeric => groups::ALPHA.start..groups::NUMBERS.end,
            Self::NumbersPunctuation => groups::NUMBERS.start..groups::PUNCTUATION.end,
            Self::PunctuationProsigns => groups::PUNCTUATION.start..groups::PROSIGNS.end,
            Self::AlphaNumericPunctuation => groups::ALPHA.start..groups::PUNCTUATION.end,
            Self::All => groups::ALPHA.start..groups::PROSIGNS.end,
        }
    }
}

/// Koch method character order
pub const KOCH_ORDER: &str = "kmuresnaptlwi.jz=foy,vg5/q92h38b?47c1d60x";

/// What [`RandomWords`] produces
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordMode {
    /// Random groups from a pool; lengths above 6 pick a random length
    RandomChars {
        /// Group length
        length: u8,
        /// Character pool
        pool: CharPool,
    },
    /// Call-sign like patterns; 0 = any length
    CallSign {
        /// Maximum length (3 to 6, or 0)
        max_length: u8,
    },
    /// Single characters from the first `lesson` Koch characters
    KochLesson {
        /// Number of characters learned so far
        lesson: u8,
    },
    /// Random groups of the first `lesson` Koch characters
    KochGroups {
        /// Number of characters learned so far
        lesson: u8,
        /// Group length
        length: u8,
    },
    /// Call signs, groups and single punctuation/prosigns mixed
    Mixed,
}

impl Default for WordMode {
    fn default() -> Self {
        Self::RandomChars {
            length: 5,
            pool: CharPool::Alpha,
        }
    }
}

/// Built-in random word generator
#[derive(Clone, Debug)]
pub struct RandomWords {
    rng: fastrand::Rng,
    mode: WordMode,
}

impl RandomWords {
    /// Create a generator with a fixed seed
    #[must_use]
    pub fn with_seed(seed: u64, mode: WordMode) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            mode,
        }
    }

    /// Change what is generated
    pub fn set_mode(&mut self, mode: WordMode) {
        self.mode = mode;
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> WordMode {
        self.mode
    }

    fn pick(&mut self, range: Range<usize>) -> char {
        if range.is_empty() {
            return CODE_TABLE[groups::ALPHA.start].internal;
        }
        CODE_TABLE[self.rng.usize(range)].internal
    }

    fn random_chars(&mut self, length: u8, pool: CharPool) -> Word {
        let length = if length > 6 {
            self.rng.u8(2..length - 3)
        } else {
            length.max(1)
        };
        let mut word = Word::new();
        for _ in 0..length {
            let _ = word.push(self.pick(pool.range()));
        }
        word
    }

    fn koch_chars(&mut self, lesson: u8, length: u8) -> Word {
        let count = usize::from(lesson.max(2)).min(KOCH_ORDER.len());
        let pool = &KOCH_ORDER.as_bytes()[..count];
        let mut word = Word::new();
        for _ in 0..length.max(1) {
            let _ = word.push(char::from(pool[self.rng.usize(..pool.len())]));
        }
        word
    }

    fn call_sign(&mut self, max_length: u8) -> Word {
        const PREFIX_TYPES: [u8; 6] = [1, 0, 1, 2, 3, 1];
        let max_length = match max_length {
            1 | 2 => 3,
            l if l > 6 => 6,
            l => l,
        };
        let mut call = Word::new();
        let prefix = if max_length == 3 {
            0
        } else {
            PREFIX_TYPES[self.rng.usize(..PREFIX_TYPES.len())]
        };
        // 0 = a, 1 = aa, 2 = a9, 3 = 9a
        let first = match prefix {
            3 => groups::NUMBERS,
            _ => groups::ALPHA,
        };
        let _ = call.push(self.pick(first));
        match prefix {
            1 | 3 => {
                let _ = call.push(self.pick(groups::ALPHA));
            }
            2 => {
                let _ = call.push(self.pick(groups::NUMBERS));
            }
            _ => {}
        }
        let _ = call.push(self.pick(groups::NUMBERS));

        let suffix = match max_length {
            3 => 1,
            0 => {
                let n = self.rng.u8(1..4);
                if n == 2 {
                    n
                } else {
                    self.rng.u8(1..4)
                }
            }
            _ => max_length
                .saturating_sub(u8::try_from(call.len()).unwrap_or(u8::MAX))
                .min(3),
        };
        for _ in 0..suffix {
            let _ = call.push(self.pick(groups::ALPHA));
        }
        if max_length == 0 && self.rng.u8(..8) == 0 {
            let _ = call.push('/');
            let _ = call.push(if self.rng.bool() { 'm' } else { 'p' });
        }
        call
    }
}

impl WordSource for RandomWords {
    fn next_word(&mut self) -> Word {
        match self.mode {
            WordMode::RandomChars { length, pool } => self.random_chars(length, pool),
            WordMode::CallSign { max_length } => self.call_sign(max_length),
            WordMode::KochLesson { lesson } => self.koch_chars(lesson, 1),
            WordMode::KochGroups { lesson, length } => self.koch_chars(lesson, length),
            WordMode::Mixed => match self.rng.u8(..3) {
                0 => self.call_sign(0),
                1 => self.random_chars(5, CharPool::AlphaNumeric),
                _ => self.random_chars(1, CharPool::PunctuationProsigns),
            },
        }
    }
}
