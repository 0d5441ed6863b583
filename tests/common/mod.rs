//! Recording outputs shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;

use morse_firmware::display::DisplaySink;
use morse_firmware::lora::{self, Packet, RadioLink};
use morse_firmware::morse::code::CwSymbol;
use morse_firmware::morse::key_out::{KeyLine, KeyOut};
use morse_firmware::morse::timing::TimingParameters;
use morse_firmware::morse::Context;
use morse_firmware::types::TextStyle;

/// Something that happened on the key line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEvent {
    ToneOn(u16),
    ToneOff,
    Transmit(bool),
}

/// Key line that remembers every call
#[derive(Debug, Default)]
pub struct RecordingLine {
    pub events: Vec<LineEvent>,
    pub tone: Option<u16>,
    pub transmitting: bool,
}

impl KeyLine for RecordingLine {
    fn tone_on(&mut self, pitch_hz: u16) {
        self.tone = Some(pitch_hz);
        self.events.push(LineEvent::ToneOn(pitch_hz));
    }

    fn tone_off(&mut self) {
        self.tone = None;
        self.events.push(LineEvent::ToneOff);
    }

    fn key_transmitter(&mut self, down: bool) {
        self.transmitting = down;
        self.events.push(LineEvent::Transmit(down));
    }
}

/// Display that collects the printed text
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub text: String,
    pub styled: Vec<(String, TextStyle)>,
    pub cleared: usize,
    pub flushes: usize,
}

impl RecordingDisplay {
    /// Everything printed in `style`, concatenated
    pub fn text_in(&self, style: TextStyle) -> String {
        self.styled
            .iter()
            .filter(|(_, s)| *s == style)
            .map(|(t, _)| t.as_str())
            .collect()
    }
}

impl DisplaySink for RecordingDisplay {
    fn print_character(&mut self, text: &str, style: TextStyle) {
        self.text.push_str(text);
        self.styled.push((text.to_string(), style));
    }

    fn print_word_break(&mut self) {
        self.text.push(' ');
    }

    fn clear_line(&mut self, _line: u8) {
        self.cleared += 1;
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

/// Radio link that keeps sent packets and hands out queued ones
#[derive(Debug, Default)]
pub struct RecordingRadio {
    pub pending: Vec<CwSymbol>,
    pub sent: Vec<Vec<CwSymbol>>,
    pub inbox: VecDeque<Packet>,
    pub wpm: u8,
}

impl RecordingRadio {
    /// Clear text of the n-th sent packet
    pub fn sent_text(&self, index: usize) -> String {
        symbols_to_text(&self.sent[index])
    }
}

impl RadioLink for RecordingRadio {
    fn encode_element(&mut self, symbol: CwSymbol) {
        self.pending.push(symbol);
    }

    fn finalize_and_send(&mut self) {
        if !self.pending.is_empty() {
            self.sent.push(std::mem::take(&mut self.pending));
        }
    }

    fn receive_packet(&mut self) -> Option<Packet> {
        self.inbox.pop_front()
    }

    fn set_wpm(&mut self, wpm: u8) {
        self.wpm = wpm;
    }
}

/// Decode a symbol stream to text
pub fn symbols_to_text(symbols: &[CwSymbol]) -> String {
    let packet = Packet {
        elements: heapless::Vec::from_slice(symbols).unwrap(),
        wpm: 20,
        rssi: 0,
        valid: true,
    };
    packet.to_text().as_str().to_string()
}

/// Packet as the other station would send `text`
pub fn packet_for(text: &str, wpm: u8) -> Packet {
    let mut radio = RecordingRadio::default();
    lora::send_text(&mut radio, text);
    Packet {
        elements: heapless::Vec::from_slice(&radio.sent[0]).unwrap(),
        wpm,
        rssi: -80,
        valid: true,
    }
}

/// Outputs and time for driving state machines by hand
#[derive(Debug)]
pub struct Bench {
    pub now_ms: u64,
    pub timing: TimingParameters,
    pub key: KeyOut,
    pub line: RecordingLine,
    pub display: RecordingDisplay,
    pub radio: RecordingRadio,
}

impl Bench {
    pub fn new(wpm: u8) -> Self {
        Self {
            now_ms: 0,
            timing: TimingParameters::recompute(wpm, 3, 7),
            key: KeyOut::new(),
            line: RecordingLine::default(),
            display: RecordingDisplay::default(),
            radio: RecordingRadio::default(),
        }
    }

    /// Run `f` with a context at the current time
    pub fn with<T>(&mut self, f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let mut ctx = Context {
            now_ms: self.now_ms,
            timing: self.timing,
            key: &mut self.key,
            line: &mut self.line,
            display: &mut self.display,
            radio: &mut self.radio,
        };
        f(&mut ctx)
    }

    pub fn tone_on(&self) -> bool {
        self.line.tone.is_some()
    }
}

/// Key-down intervals `(start, end)` seen while stepping
#[derive(Debug, Default)]
pub struct ToneLog {
    pub intervals: Vec<(u64, u64)>,
    started: Option<u64>,
}

impl ToneLog {
    pub fn observe(&mut self, now_ms: u64, on: bool) {
        match (self.started, on) {
            (None, true) => self.started = Some(now_ms),
            (Some(start), false) => {
                self.intervals.push((start, now_ms));
                self.started = None;
            }
            _ => {}
        }
    }

    pub fn durations(&self) -> Vec<u64> {
        self.intervals.iter().map(|(s, e)| e - s).collect()
    }
}
