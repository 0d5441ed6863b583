//! LoRa CW Link
//!
//! Morse is exchanged over the radio as compressed element streams rather
//! than audio. Each element takes two bits:
//!
//! ```text
//! 00 = character end   01 = dit   10 = dah   11 = word end
//! ```
//!
//! A frame is `[version, wpm, packed elements...]`, four elements per byte
//! (first element in the high bits), padded with word ends.

use core::fmt;

use heapless::Vec;

use crate::config::{MAX_PACKET_ELEMENTS, MAX_PACKET_LEN, MAX_WPM, MIN_WPM};
use crate::morse::code::{self, CharacterDecoder, CwSymbol};
use crate::types::{Element, Message};

/// Protocol version carried in the first byte of every frame
pub const PROTOCOL_VERSION: u8 = 1;

/// Header bytes before the element payload
pub const HEADER_LEN: usize = 2;

/// Raw frame as delivered by the radio driver
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFrame {
    /// Frame bytes
    pub bytes: Vec<u8, MAX_PACKET_LEN>,
    /// Received signal strength in dBm
    pub rssi: i16,
}

/// Decoded radio packet
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Packet {
    /// Element stream
    pub elements: Vec<CwSymbol, MAX_PACKET_ELEMENTS>,
    /// Sender's keying speed
    pub wpm: u8,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// False if the frame could not be decoded
    pub valid: bool,
}

impl Packet {
    /// Packet for a frame that failed to decode
    #[must_use]
    pub fn invalid(rssi: i16) -> Self {
        Self {
            rssi,
            ..Self::default()
        }
    }

    /// Decode the element stream to display text, words separated by
    /// single spaces
    #[must_use]
    pub fn to_text(&self) -> Message {
        let mut text = Message::new();
        let mut decoder = CharacterDecoder::new();
        for symbol in &self.elements {
            match symbol {
                CwSymbol::Dit => decoder.push(Element::Dit),
                CwSymbol::Dah => decoder.push(Element::Dah),
                CwSymbol::CharEnd => flush_char(&mut decoder, &mut text),
                CwSymbol::WordEnd => {
                    flush_char(&mut decoder, &mut text);
                    if !text.is_empty() && !text.ends_with(' ') {
                        let _ = text.push(' ');
                    }
                }
            }
        }
        flush_char(&mut decoder, &mut text);
        while text.ends_with(' ') {
            text.pop();
        }
        text
    }
}

fn flush_char(decoder: &mut CharacterDecoder, text: &mut Message) {
    if !decoder.elements().is_empty() {
        let _ = text.push_str(decoder.finish());
    }
}

/// Frame decoding failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Frame shorter than header plus one payload byte
    TooShort,
    /// Unknown protocol version
    BadVersion(u8),
    /// Speed outside the supported range
    BadSpeed(u8),
    /// More elements than a packet can hold
    Overflow,
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "frame too short"),
            Self::BadVersion(v) => write!(f, "unknown protocol version {v}"),
            Self::BadSpeed(wpm) => write!(f, "speed {wpm} wpm out of range"),
            Self::Overflow => write!(f, "too many elements"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PacketError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::TooShort => defmt::write!(f, "TooShort"),
            Self::BadVersion(v) => defmt::write!(f, "BadVersion({})", v),
            Self::BadSpeed(wpm) => defmt::write!(f, "BadSpeed({})", wpm),
            Self::Overflow => defmt::write!(f, "Overflow"),
        }
    }
}

const fn symbol_code(symbol: CwSymbol) -> u8 {
    match symbol {
        CwSymbol::CharEnd => 0b00,
        CwSymbol::Dit => 0b01,
        CwSymbol::Dah => 0b10,
        CwSymbol::WordEnd => 0b11,
    }
}

const fn code_symbol(code: u8) -> CwSymbol {
    match code & 0b11 {
        0b00 => CwSymbol::CharEnd,
        0b01 => CwSymbol::Dit,
        0b10 => CwSymbol::Dah,
        _ => CwSymbol::WordEnd,
    }
}

/// Accumulates elements until the packet is sent
#[derive(Clone, Debug, Default)]
pub struct CwPacketEncoder {
    symbols: Vec<CwSymbol, MAX_PACKET_ELEMENTS>,
}

impl CwPacketEncoder {
    /// Create an empty encoder
    #[must_use]
    pub const fn new() -> Self {
        Self {
            symbols: Vec::new(),
        }
    }

    /// Append an element
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::Overflow`] when the packet is full.
    pub fn push(&mut self, symbol: CwSymbol) -> Result<(), PacketError> {
        self.symbols.push(symbol).map_err(|_| PacketError::Overflow)
    }

    /// Nothing encoded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Elements encoded so far
    #[must_use]
    pub fn symbols(&self) -> &[CwSymbol] {
        &self.symbols
    }

    /// Build the frame and start over
    pub fn finish(&mut self, wpm: u8) -> Vec<u8, MAX_PACKET_LEN> {
        let mut frame = Vec::new();
        let _ = frame.push(PROTOCOL_VERSION);
        let _ = frame.push(wpm);
        for chunk in self.symbols.chunks(4) {
            let mut byte = 0u8;
            for slot in 0..4 {
                let code = chunk
                    .get(slot)
                    .map_or(symbol_code(CwSymbol::WordEnd), |s| symbol_code(*s));
                byte |= code << (6 - 2 * slot);
            }
            let _ = frame.push(byte);
        }
        self.symbols.clear();
        frame
    }
}

/// Decode a frame into speed and element stream
///
/// # Errors
///
/// Returns a [`PacketError`] for short frames, unknown versions, speeds
/// out of range and oversized payloads.
pub fn decode_frame(bytes: &[u8]) -> Result<(u8, Vec<CwSymbol, MAX_PACKET_ELEMENTS>), PacketError> {
    if bytes.len() <= HEADER_LEN {
        return Err(PacketError::TooShort);
    }
    if bytes[0] != PROTOCOL_VERSION {
        return Err(PacketError::BadVersion(bytes[0]));
    }
    let wpm = bytes[1];
    if !(MIN_WPM..=MAX_WPM).contains(&wpm) {
        return Err(PacketError::BadSpeed(wpm));
    }
    let mut elements = Vec::new();
    for byte in &bytes[HEADER_LEN..] {
        for slot in 0..4 {
            elements
                .push(code_symbol(byte >> (6 - 2 * slot)))
                .map_err(|_| PacketError::Overflow)?;
        }
    }
    Ok((wpm, elements))
}

/// Radio as seen by the modes
pub trait RadioLink {
    /// Queue one element for the next packet
    fn encode_element(&mut self, symbol: CwSymbol);
    /// Send the queued elements
    fn finalize_and_send(&mut self);
    /// Take a received packet, if any
    fn receive_packet(&mut self) -> Option<Packet>;
    /// Keying speed announced in sent packets
    fn set_wpm(&mut self, _wpm: u8) {}
}

/// Physical radio below the packet boundary
pub trait RadioDriver {
    /// Transmit a frame
    fn transmit(&mut self, frame: &[u8]);
    /// Take a received frame without blocking
    fn poll(&mut self) -> Option<RawFrame>;
}

/// [`RadioLink`] over a LoRa driver
#[derive(Debug)]
pub struct LoraCw<D: RadioDriver> {
    driver: D,
    encoder: CwPacketEncoder,
    wpm: u8,
}

impl<D: RadioDriver> LoraCw<D> {
    /// Wrap a driver
    pub const fn new(driver: D, wpm: u8) -> Self {
        Self {
            driver,
            encoder: CwPacketEncoder::new(),
            wpm,
        }
    }

    /// Access the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Access the driver mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: RadioDriver> RadioLink for LoraCw<D> {
    fn encode_element(&mut self, symbol: CwSymbol) {
        if self.encoder.push(symbol).is_err() {
            warn!("radio: packet full, element dropped");
        }
    }

    fn finalize_and_send(&mut self) {
        if self.encoder.is_empty() {
            return;
        }
        let frame = self.encoder.finish(self.wpm);
        debug!("radio: tx {} bytes at {} wpm", frame.len(), self.wpm);
        self.driver.transmit(&frame);
    }

    fn receive_packet(&mut self) -> Option<Packet> {
        let raw = self.driver.poll()?;
        match decode_frame(&raw.bytes) {
            Ok((wpm, elements)) => Some(Packet {
                elements,
                wpm,
                rssi: raw.rssi,
                valid: true,
            }),
            Err(err) => {
                warn!("radio: dropped frame: {}", err);
                Some(Packet::invalid(raw.rssi))
            }
        }
    }

    fn set_wpm(&mut self, wpm: u8) {
        self.wpm = wpm;
    }
}

/// Radio link that is not connected
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRadio;

impl RadioLink for NoRadio {
    fn encode_element(&mut self, _symbol: CwSymbol) {}
    fn finalize_and_send(&mut self) {}
    fn receive_packet(&mut self) -> Option<Packet> {
        None
    }
}

/// Encode display text (words and `<xx>` prosigns) and send it as one
/// packet
pub fn send_text(radio: &mut dyn RadioLink, text: &str) {
    for word in text.split_whitespace() {
        let internal = code::display_to_internal(word);
        for c in internal.chars() {
            if let Some(m) = code::find_internal(c) {
                for element in code::elements(m) {
                    radio.encode_element(element.into());
                }
                radio.encode_element(CwSymbol::CharEnd);
            }
        }
        radio.encode_element(CwSymbol::WordEnd);
    }
    radio.finalize_and_send();
}
