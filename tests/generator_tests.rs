//! CW Generator Tests
//!
//! Playback timing, word sequencing and radio forwarding.

mod common;

use common::{Bench, ToneLog};
use morse_firmware::config::{END_SEQUENCE, START_SEQUENCE};
use morse_firmware::morse::code::{CharacterDecoder, CwSymbol, CwSymbolSequence, CODE_TABLE};
use morse_firmware::morse::generator::{
    CwGenerator, DefaultSpacing, GeneratorConfig, GeneratorState, WordEndPolicy, WordSequencer,
};
use morse_firmware::morse::timing::TimingSource;
use morse_firmware::morse::words::{QueuedWords, WordSource};
use morse_firmware::types::Element;

type Words = QueuedWords<8>;

fn words(list: &[&str]) -> Words {
    let mut q = Words::new();
    for w in list {
        assert!(q.push_internal(w, None));
    }
    q
}

fn run(
    bench: &mut Bench,
    generator: &mut CwGenerator,
    source: &mut dyn WordSource,
    policy: &mut dyn WordEndPolicy,
    until_ms: u64,
) -> ToneLog {
    let mut log = ToneLog::default();
    while bench.now_ms < until_ms {
        bench.with(|ctx| generator.step(ctx, &mut *source, &mut *policy));
        log.observe(bench.now_ms, bench.tone_on());
        bench.now_ms += 1;
    }
    log
}

struct FixedGap(u32);

impl WordEndPolicy for FixedGap {
    fn word_end_delay(&mut self, _default_ms: u32) -> Option<u32> {
        Some(self.0)
    }
}

// =============================================================================
// Timing
// =============================================================================

#[test]
fn plays_elements_with_exact_lengths() {
    let mut bench = Bench::new(20);
    let mut g = CwGenerator::default();
    let mut src = words(&["a"]);

    let log = run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 1000);
    assert_eq!(log.intervals, vec![(0, 60), (120, 300)]);
    assert_eq!(bench.display.text.trim(), "a");
}

#[test]
fn character_gap_between_letters() {
    let mut bench = Bench::new(20);
    let mut g = CwGenerator::default();
    let mut src = words(&["ee"]);

    let log = run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 1000);
    assert_eq!(log.intervals, vec![(0, 60), (240, 300)]);
}

#[test]
fn word_gap_between_words() {
    let mut bench = Bench::new(20);
    let mut g = CwGenerator::default();
    let mut src = words(&["e", "t"]);

    let log = run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 1000);
    assert_eq!(log.intervals, vec![(0, 60), (480, 660)]);
    assert_eq!(bench.display.text.trim(), "e t");
}

#[test]
fn step_before_deadline_changes_nothing() {
    let mut bench = Bench::new(20);
    let mut g = CwGenerator::default();
    let mut src = words(&["a"]);

    bench.with(|ctx| g.step(ctx, &mut src, &mut DefaultSpacing));
    assert_eq!(g.state(), GeneratorState::KeyDown);
    let events = bench.line.events.len();
    let deadline = g.deadline_ms();

    for t in 1..60 {
        bench.now_ms = t;
        bench.with(|ctx| g.step(ctx, &mut src, &mut DefaultSpacing));
        assert_eq!(g.state(), GeneratorState::KeyDown);
        assert_eq!(g.deadline_ms(), deadline);
        assert_eq!(bench.line.events.len(), events);
    }
}

#[test]
fn word_end_policy_replaces_gap() {
    let mut bench = Bench::new(20);
    let mut g = CwGenerator::default();
    let mut src = words(&["e", "e"]);

    let log = run(&mut bench, &mut g, &mut src, &mut FixedGap(1000), 1200);
    assert_eq!(log.intervals, vec![(0, 60), (1060, 1120)]);
}

#[test]
fn rx_timing_follows_sender_speed() {
    let mut bench = Bench::new(20);
    let mut config = GeneratorConfig::default();
    config.timing = TimingSource::Rx;
    let mut g = CwGenerator::new(config, WordSequencer::default());
    let mut src = Words::new();
    src.push_internal("e", Some(10));

    let log = run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 500);
    assert_eq!(log.durations(), vec![120]);
    assert_eq!(g.rx_timing().dit_ms, 120);
}

// =============================================================================
// Error Words and Radio
// =============================================================================

#[test]
fn unknown_character_plays_error_pattern() {
    let mut bench = Bench::new(20);
    let mut g = CwGenerator::default();
    let mut src = words(&["a%"]);

    let log = run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 2000);
    assert_eq!(log.intervals.len(), 8);
    assert!(log.durations().iter().all(|&d| d == 60));
    assert_eq!(bench.display.text.trim(), "<err>");
}

/// Decode a generated symbol stream character by character
fn decode(seq: &CwSymbolSequence) -> String {
    let mut decoder = CharacterDecoder::new();
    let mut text = String::new();
    for symbol in seq.iter() {
        match symbol {
            CwSymbol::Dit => decoder.push(Element::Dit),
            CwSymbol::Dah => decoder.push(Element::Dah),
            CwSymbol::CharEnd => text.push_str(decoder.finish()),
            CwSymbol::WordEnd => {}
        }
    }
    text
}

#[test]
fn every_table_entry_decodes_to_its_display_form() {
    for m in CODE_TABLE {
        let seq = CwSymbolSequence::from_internal(m.internal.encode_utf8(&mut [0; 4]));
        assert!(!seq.is_error(), "{} encoded as error", m.display);
        assert_eq!(decode(&seq), m.display, "pattern {}", m.pattern);
    }
}

#[test]
fn unknown_character_turns_whole_word_into_error() {
    let seq = CwSymbolSequence::from_internal("a%");
    assert!(seq.is_error());
    assert_eq!(decode(&seq), "<err>");

    let seq = CwSymbolSequence::from_internal("paris");
    assert_eq!(decode(&seq), "paris");
}

#[test]
fn forwards_word_to_radio() {
    let mut bench = Bench::new(20);
    let mut config = GeneratorConfig::default();
    config.send_to_radio = true;
    let mut g = CwGenerator::new(config, WordSequencer::default());
    let mut src = words(&["e", "t"]);

    let log = run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 1500);
    assert_eq!(
        bench.radio.sent[0],
        vec![CwSymbol::Dit, CwSymbol::CharEnd, CwSymbol::WordEnd]
    );
    assert_eq!(bench.radio.sent_text(1), "t");
    // word gap grows by a character gap and a dit while sending
    assert_eq!(log.intervals[1].0, 60 + 420 + 180 + 60);
}

#[test]
fn silent_generator_does_not_key() {
    let mut bench = Bench::new(20);
    let mut config = GeneratorConfig::default();
    config.key = false;
    let mut g = CwGenerator::new(config, WordSequencer::default());
    let mut src = words(&["abc"]);

    run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 2000);
    assert!(bench.line.events.is_empty());
    assert_eq!(bench.display.text.trim(), "abc");
}

#[test]
fn pause_releases_key_and_skips_rest_of_word() {
    let mut bench = Bench::new(20);
    let mut g = CwGenerator::default();
    let mut src = words(&["ab", "e"]);

    run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 30);
    assert!(bench.tone_on());
    bench.with(|ctx| g.pause(ctx));
    assert!(!bench.tone_on());
    assert!(g.is_idle());

    run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 200);
    assert_eq!(bench.display.text.trim(), "e");
}

// =============================================================================
// Sequencing
// =============================================================================

#[test]
fn max_sequence_ends_with_marker() {
    let mut src = words(&["ab", "cd", "ef", "gh"]);
    let mut seq = WordSequencer::new(false, 3, 1);

    assert_eq!(seq.next_word(&mut src).as_str(), "ab");
    assert_eq!(seq.next_word(&mut src).as_str(), "cd");
    assert_eq!(seq.next_word(&mut src).as_str(), END_SEQUENCE);
    assert!(seq.next_word(&mut src).is_empty());
    assert!(seq.is_stopped());
}

#[test]
fn start_sequence_after_restart() {
    let mut src = words(&["ab", "cd"]);
    let mut seq = WordSequencer::new(true, 0, 1);

    assert_eq!(seq.next_word(&mut src).as_str(), START_SEQUENCE);
    assert_eq!(seq.next_word(&mut src).as_str(), "ab");
    seq.restart();
    assert_eq!(seq.next_word(&mut src).as_str(), START_SEQUENCE);
    assert_eq!(seq.next_word(&mut src).as_str(), "cd");
}

#[test]
fn repeat_last_plays_word_again() {
    let mut src = words(&["ab", "cd"]);
    let mut seq = WordSequencer::new(false, 0, 1);

    assert_eq!(seq.next_word(&mut src).as_str(), "ab");
    seq.repeat_last();
    assert_eq!(seq.next_word(&mut src).as_str(), "ab");
    assert_eq!(seq.next_word(&mut src).as_str(), "cd");
    assert_eq!(seq.last(), "cd");
}

#[test]
fn repeated_word_does_not_count_towards_max_sequence() {
    let mut src = words(&["ab", "cd"]);
    let mut seq = WordSequencer::new(false, 2, 1);

    assert_eq!(seq.next_word(&mut src).as_str(), "ab");
    seq.repeat_last();
    assert_eq!(seq.next_word(&mut src).as_str(), "ab");
    assert!(!seq.at_end());
    assert_eq!(seq.next_word(&mut src).as_str(), END_SEQUENCE);
    assert!(seq.at_end());
    assert!(seq.next_word(&mut src).is_empty());
}

#[test]
fn repeat_each_plays_words_n_times() {
    let mut src = words(&["ab", "cd"]);
    let mut seq = WordSequencer::new(false, 0, 3);

    let played: Vec<_> = (0..6).map(|_| seq.next_word(&mut src)).collect();
    let played: Vec<&str> = played.iter().map(|w| w.as_str()).collect();
    assert_eq!(played, ["ab", "ab", "ab", "cd", "cd", "cd"]);
}

#[test]
fn generator_stops_after_sequence() {
    let mut bench = Bench::new(20);
    let mut g = CwGenerator::new(GeneratorConfig::default(), WordSequencer::new(false, 2, 1));
    let mut src = words(&["e", "e", "e"]);

    run(&mut bench, &mut g, &mut src, &mut DefaultSpacing, 3000);
    assert!(g.is_stopped());
    assert!(g.is_idle());
    assert_eq!(bench.display.text.trim(), "e <ar>");
    assert_eq!(src.len(), 2);
}
