//! Word Buffer
//!
//! Accumulates keyed characters into space separated words and matches
//! the tail of the buffer against protocol templates. A template is a list
//! of words; `#` matches any single word and every `#` of a template must
//! match the same word. Literal words compare ASCII case-insensitively.

use crate::config::WORD_BUFFER_LEN;
use crate::types::{bounded, Message};

/// Buffer contents
pub type BufferText = heapless::String<WORD_BUFFER_LEN>;

/// Wildcard token
pub const WILDCARD: &str = "#";

/// Result of a template match
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateMatch {
    /// Words bound by the wildcards, joined by spaces (empty without `#`)
    pub capture: Message,
    /// Byte offset of the first matched word
    pub start: usize,
}

fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split(' ')
        .scan(0usize, |pos, word| {
            let start = *pos;
            *pos += word.len() + 1;
            Some((start, word))
        })
        .filter(|(_, word)| !word.is_empty())
}

/// Match the trailing words of `text` against `template`
#[must_use]
pub fn match_template(text: &str, template: &str) -> Option<TemplateMatch> {
    let wanted = template.split_whitespace().count();
    let total = words(text).count();
    if wanted == 0 || total < wanted {
        return None;
    }

    let mut bound: Option<&str> = None;
    let mut capture = Message::new();
    let mut start = None;
    for ((offset, word), token) in words(text).skip(total - wanted).zip(template.split_whitespace())
    {
        start.get_or_insert(offset);
        if token == WILDCARD {
            if let Some(previous) = bound {
                if !previous.eq_ignore_ascii_case(word) {
                    return None;
                }
            }
            bound = Some(word);
            if !capture.is_empty() {
                let _ = capture.push(' ');
            }
            let _ = capture.push_str(word);
        } else if !token.eq_ignore_ascii_case(word) {
            return None;
        }
    }

    Some(TemplateMatch {
        capture,
        start: start.unwrap_or(0),
    })
}

/// Same words in the same order, ignoring ASCII case and spacing
#[must_use]
pub fn same_words(a: &str, b: &str) -> bool {
    let mut left = a.split_whitespace();
    let mut right = b.split_whitespace();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x.eq_ignore_ascii_case(y) => {}
            _ => return false,
        }
    }
}

/// Words keyed by the operator
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WordBuffer {
    buffer: BufferText,
    word_end: bool,
}

impl WordBuffer {
    /// Create an empty buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: BufferText::new(),
            word_end: false,
        }
    }

    /// Append a complete word
    pub fn add_word(&mut self, word: &str) {
        for part in word.split_whitespace() {
            self.word_end = true;
            self.append(part);
            self.word_end = true;
        }
    }

    /// Append a character (display form) to the current word
    pub fn add_char(&mut self, text: &str) {
        self.append(text);
    }

    /// The current word is complete
    pub fn end_word(&mut self) {
        self.word_end = true;
    }

    fn append(&mut self, text: &str) {
        let separator = usize::from(self.word_end && !self.buffer.is_empty());
        self.make_room(text.len() + separator);
        if separator == 1 {
            let _ = self.buffer.push(' ');
        }
        self.word_end = false;
        let text: BufferText = bounded(text);
        let _ = self.buffer.push_str(&text);
    }

    // drop the oldest words until `needed` more bytes fit
    fn make_room(&mut self, needed: usize) {
        while self.buffer.len() + needed > WORD_BUFFER_LEN && !self.buffer.is_empty() {
            let rest = match self.buffer.find(' ') {
                Some(space) => bounded::<WORD_BUFFER_LEN>(&self.buffer[space + 1..]),
                None => BufferText::new(),
            };
            self.buffer = rest;
        }
    }

    /// Current contents
    #[must_use]
    pub fn get(&self) -> &str {
        &self.buffer
    }

    /// Take the contents and clear the buffer
    pub fn get_and_clear(&mut self) -> BufferText {
        let text = self.buffer.clone();
        self.clear();
        text
    }

    /// Empty the buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.word_end = false;
    }

    /// Nothing keyed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Match the tail of the buffer; returns the wildcard capture
    #[must_use]
    pub fn matches(&self, template: &str) -> Option<Message> {
        match_template(&self.buffer, template).map(|m| m.capture)
    }

    /// The buffer ends with the words of `tokens`
    #[must_use]
    pub fn ends_with(&self, tokens: &str) -> bool {
        match_template(&self.buffer, tokens).is_some()
    }

    /// Remove the matched words and return them, keeping what was keyed
    /// before
    pub fn take_match(&mut self, template: &str) -> Option<BufferText> {
        let found = match_template(&self.buffer, template)?;
        let matched: BufferText = bounded(&self.buffer[found.start..]);
        let remainder: BufferText = bounded(self.buffer[..found.start].trim_end());
        self.buffer = remainder;
        self.word_end = !self.buffer.is_empty();
        Some(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chars_build_words() {
        let mut buf = WordBuffer::new();
        buf.add_char("c");
        buf.add_char("q");
        buf.end_word();
        buf.add_char("d");
        buf.add_char("e");
        assert_eq!(buf.get(), "cq de");
    }

    #[test]
    fn wildcard_captures_call() {
        let mut buf = WordBuffer::new();
        buf.add_word("cq");
        buf.add_word("cq de XX0YYY");
        assert_eq!(buf.matches("cq de #").unwrap().as_str(), "XX0YYY");
    }

    #[test]
    fn repeated_wildcard_must_bind_same_word() {
        assert!(match_template("hallo hello", "# #").is_none());
        let m = match_template("hallo hello hallo hallo", "# #").unwrap();
        assert_eq!(m.capture.as_str(), "hallo hallo");
        assert_eq!(m.start, 12);
    }

    #[test]
    fn literal_tokens_ignore_case() {
        assert!(match_template("CQ DE xx1dx", "cq de #").is_some());
        assert!(match_template("cq", "cq de #").is_none());
    }

    #[test]
    fn take_match_keeps_remainder() {
        let mut buf = WordBuffer::new();
        buf.add_word("oops cq de XX0YYY");
        assert_eq!(buf.take_match("cq de #").unwrap().as_str(), "cq de XX0YYY");
        assert_eq!(buf.get(), "oops");
    }

    #[test]
    fn full_buffer_drops_oldest_words() {
        let mut buf = WordBuffer::new();
        for _ in 0..40 {
            buf.add_word("abcd");
        }
        assert!(buf.get().len() <= WORD_BUFFER_LEN);
        assert!(buf.get().starts_with("abcd"));
        assert!(buf.get().ends_with("abcd"));
    }

    #[test]
    fn same_words_ignores_spacing_and_case() {
        assert!(same_words("XX1DX  de xx0yyy", "xx1dx de XX0YYY"));
        assert!(!same_words("hallo", "hallo hallo"));
    }
}
