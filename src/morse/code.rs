//! Morse Code Table
//!
//! Letters, digits, punctuation, prosigns and umlauts with their dit/dah
//! patterns. Text is handled in two forms:
//!
//! - *display* form, as printed and sent over the radio: lower case with
//!   prosigns written as `<ka>`, `<sk>`, ...
//! - *internal* form, one `char` per Morse character: prosigns are mapped
//!   to single upper case letters (`A` = `<ka>`, `K` = `<sk>`, ...)

use heapless::Deque;

use crate::config::{MAX_CHAR_ELEMENTS, MAX_WORD_SYMBOLS};
use crate::types::{Element, Word};

/// One entry of the code table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MorseChar {
    /// Internal single-char form
    pub internal: char,
    /// Pattern of `.` and `-`
    pub pattern: &'static str,
    /// Display form
    pub display: &'static str,
}

const fn entry(internal: char, pattern: &'static str, display: &'static str) -> MorseChar {
    MorseChar {
        internal,
        pattern,
        display,
    }
}

/// The code table, grouped as letters, digits, punctuation, prosigns and
/// umlauts. Random character pools index into these groups.
pub const CODE_TABLE: &[MorseChar] = &[
    entry('a', ".-", "a"),
    entry('b', "-...", "b"),
    entry('c', "-.-.", "c"),
    entry('d', "-..", "d"),
    entry('e', ".", "e"),
    entry('f', "..-.", "f"),
    entry('g', "--.", "g"),
    entry('h', "....", "h"),
    entry('i', "..", "i"),
    entry('j', ".---", "j"),
    entry('k', "-.-", "k"),
    entry('l', ".-..", "l"),
    entry('m', "--", "m"),
    entry('n', "-.", "n"),
    entry('o', "---", "o"),
    entry('p', ".--.", "p"),
    entry('q', "--.-", "q"),
    entry('r', ".-.", "r"),
    entry('s', "...", "s"),
    entry('t', "-", "t"),
    entry('u', "..-", "u"),
    entry('v', "...-", "v"),
    entry('w', ".--", "w"),
    entry('x', "-..-", "x"),
    entry('y', "-.--", "y"),
    entry('z', "--..", "z"),
    entry('0', "-----", "0"),
    entry('1', ".----", "1"),
    entry('2', "..---", "2"),
    entry('3', "...--", "3"),
    entry('4', "....-", "4"),
    entry('5', ".....", "5"),
    entry('6', "-....", "6"),
    entry('7', "--...", "7"),
    entry('8', "---..", "8"),
    entry('9', "----.", "9"),
    entry('.', ".-.-.-", "."),
    entry(',', "--..--", ","),
    entry(':', "---...", ":"),
    entry('-', "-....-", "-"),
    entry('/', "-..-.", "/"),
    entry('=', "-...-", "="),
    entry('?', "..--..", "?"),
    entry('@', ".--.-.", "@"),
    entry('+', ".-.-.", "<ar>"),
    entry('S', ".-...", "<as>"),
    entry('A', "-.-.-", "<ka>"),
    entry('N', "-.--.", "<kn>"),
    entry('K', "...-.-", "<sk>"),
    entry('E', "...-.", "<ve>"),
    entry('H', "----", "<ch>"),
    entry('X', "...---...", "<sos>"),
    entry('R', "........", "<err>"),
    entry('ä', ".-.-", "ä"),
    entry('ö', "---.", "ö"),
    entry('ü', "..--", "ü"),
];

/// Table index ranges of the character groups
pub mod groups {
    use core::ops::Range;

    /// Letters
    pub const ALPHA: Range<usize> = 0..26;
    /// Digits
    pub const NUMBERS: Range<usize> = 26..36;
    /// Punctuation
    pub const PUNCTUATION: Range<usize> = 36..44;
    /// Prosigns usable in practice text (excludes `<err>`)
    pub const PROSIGNS: Range<usize> = 44..52;
}

/// Internal form of the error prosign
pub const ERROR_CHAR: char = 'R';

/// Display form of a keyed pattern that is not in the table
pub const UNKNOWN_DISPLAY: &str = "*";

/// Look up a character in internal form
#[must_use]
pub fn find_internal(c: char) -> Option<&'static MorseChar> {
    CODE_TABLE.iter().find(|m| m.internal == c)
}

/// Look up a display token (`a`, `<sk>`, ...), ignoring ASCII case
#[must_use]
pub fn find_display(token: &str) -> Option<&'static MorseChar> {
    CODE_TABLE
        .iter()
        .find(|m| m.display.eq_ignore_ascii_case(token))
}

/// Look up a keyed pattern
#[must_use]
pub fn decode_elements(elements: &[Element]) -> Option<&'static MorseChar> {
    CODE_TABLE.iter().find(|m| {
        m.pattern.len() == elements.len()
            && m.pattern
                .bytes()
                .zip(elements)
                .all(|(b, e)| (b == b'-') == (*e == Element::Dah))
    })
}

/// Iterate the elements of a table entry
pub fn elements(m: &MorseChar) -> impl Iterator<Item = Element> + '_ {
    m.pattern.bytes().map(|b| {
        if b == b'-' {
            Element::Dah
        } else {
            Element::Dit
        }
    })
}

/// Convert display text to internal form
///
/// Letters are folded to lower case, prosign tokens (`<ka>`, also written
/// `[ka]`) become their internal letters, `ß` becomes `ss`. Characters the
/// table does not know are kept so the generator can flag them.
#[must_use]
pub fn display_to_internal(text: &str) -> Word {
    let mut out = Word::new();
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if c == '<' || c == '[' {
            let close = if c == '<' { '>' } else { ']' };
            if let Some(end) = rest.find(close) {
                let inner = &rest[1..end];
                if let Some(m) = CODE_TABLE.iter().find(|m| {
                    m.display.len() == inner.len() + 2
                        && m.display.starts_with('<')
                        && m.display[1..m.display.len() - 1].eq_ignore_ascii_case(inner)
                }) {
                    let _ = out.push(m.internal);
                    rest = &rest[end + close.len_utf8()..];
                    continue;
                }
            }
        }
        let folded = match c {
            'Ä' => 'ä',
            'Ö' => 'ö',
            'Ü' => 'ü',
            'ß' => {
                let _ = out.push_str("ss");
                rest = &rest[c.len_utf8()..];
                continue;
            }
            _ => c.to_ascii_lowercase(),
        };
        let _ = out.push(folded);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Display form of one internal character, `None` if unknown
#[must_use]
pub fn display_of(c: char) -> Option<&'static str> {
    find_internal(c).map(|m| m.display)
}

/// Symbol of a generated or transmitted Morse stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CwSymbol {
    /// Short element
    Dit,
    /// Long element
    Dah,
    /// End of a character
    CharEnd,
    /// End of a word
    WordEnd,
}

impl From<Element> for CwSymbol {
    fn from(element: Element) -> Self {
        match element {
            Element::Dit => Self::Dit,
            Element::Dah => Self::Dah,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for CwSymbol {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Dit => defmt::write!(f, "."),
            Self::Dah => defmt::write!(f, "-"),
            Self::CharEnd => defmt::write!(f, "|"),
            Self::WordEnd => defmt::write!(f, "_"),
        }
    }
}

/// Symbols of one word, consumed front to back by the generator
///
/// Every known character is followed by [`CwSymbol::CharEnd`]. A word with
/// an unknown character is replaced as a whole by the error pattern (eight
/// dits). The end of the word is the exhaustion of the sequence.
#[derive(Clone, Debug, Default)]
pub struct CwSymbolSequence {
    symbols: Deque<CwSymbol, MAX_WORD_SYMBOLS>,
    error: bool,
}

impl CwSymbolSequence {
    /// Create an empty sequence
    #[must_use]
    pub const fn new() -> Self {
        Self {
            symbols: Deque::new(),
            error: false,
        }
    }

    /// Encode a word in internal form
    #[must_use]
    pub fn from_internal(word: &str) -> Self {
        let mut seq = Self::new();
        for c in word.chars() {
            let Some(m) = find_internal(c) else {
                seq.symbols.clear();
                seq.push_char(ERROR_CHAR);
                seq.error = true;
                return seq;
            };
            seq.push_entry(m);
        }
        seq
    }

    fn push_char(&mut self, c: char) {
        if let Some(m) = find_internal(c) {
            self.push_entry(m);
        }
    }

    fn push_entry(&mut self, m: &MorseChar) {
        for element in elements(m) {
            let _ = self.symbols.push_back(element.into());
        }
        let _ = self.symbols.push_back(CwSymbol::CharEnd);
    }

    /// Take the next symbol
    pub fn pop(&mut self) -> Option<CwSymbol> {
        self.symbols.pop_front()
    }

    /// Look at the next symbol
    #[must_use]
    pub fn peek(&self) -> Option<CwSymbol> {
        self.symbols.front().copied()
    }

    /// True when only the final character end is left
    #[must_use]
    pub fn at_word_end(&self) -> bool {
        self.symbols.len() == 1 && self.peek() == Some(CwSymbol::CharEnd)
    }

    /// True when the word contained an unknown character
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error
    }

    /// Number of symbols left
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when all symbols have been consumed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Drop all symbols
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.error = false;
    }

    /// Iterate the remaining symbols
    pub fn iter(&self) -> impl Iterator<Item = &CwSymbol> {
        self.symbols.iter()
    }
}

/// Collects keyed elements and decodes them to a character
#[derive(Clone, Debug, Default)]
pub struct CharacterDecoder {
    elements: heapless::Vec<Element, MAX_CHAR_ELEMENTS>,
    overflow: bool,
}

impl CharacterDecoder {
    /// Create an empty decoder
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: heapless::Vec::new(),
            overflow: false,
        }
    }

    /// Add a keyed element
    pub fn push(&mut self, element: Element) {
        if self.elements.push(element).is_err() {
            self.overflow = true;
        }
    }

    /// Elements keyed so far
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Decode and clear; unknown patterns give [`UNKNOWN_DISPLAY`]
    pub fn finish(&mut self) -> &'static str {
        let text = if self.overflow {
            UNKNOWN_DISPLAY
        } else {
            decode_elements(&self.elements).map_or(UNKNOWN_DISPLAY, |m| m.display)
        };
        self.clear();
        text
    }

    /// Forget the elements keyed so far
    pub fn clear(&mut self) {
        self.elements.clear();
        self.overflow = false;
    }
}
