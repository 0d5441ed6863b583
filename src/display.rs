//! Display Sink
//!
//! Text output of the trainer. The OLED renderer lives outside the core
//! and implements [`DisplaySink`].

use crate::types::TextStyle;

/// Scrolling text display
pub trait DisplaySink {
    /// Print one character (display form, prosigns as `<ka>`)
    fn print_character(&mut self, text: &str, style: TextStyle);
    /// End the current word
    fn print_word_break(&mut self);
    /// Clear a status line
    fn clear_line(&mut self, line: u8);
    /// Push buffered text to the screen
    fn flush(&mut self) {}
}

/// Display that drops everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn print_character(&mut self, _text: &str, _style: TextStyle) {}
    fn print_word_break(&mut self) {}
    fn clear_line(&mut self, _line: u8) {}
}
