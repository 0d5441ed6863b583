//! Morse Tennis
//!
//! A two-station game over the radio link: open a contact with `cq de`,
//! exchange calls, then take turns sending a word twice and answering it.
//! The game logic is a ten-state machine fed with what the operator keys
//! (collected in a [`WordBuffer`]) and with received messages.

pub mod machine;
pub mod word_buffer;

pub use machine::{GameState, Player, TennisClient, TennisMachine, TennisState};
pub use word_buffer::{match_template, same_words, TemplateMatch, WordBuffer};
