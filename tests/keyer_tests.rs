//! Paddle Keyer Tests
//!
//! Drives the keyer one millisecond per step, the way the trainer loop
//! does, and checks timing, squeeze behaviour and decoding.

mod common;

use common::{Bench, LineEvent, ToneLog};
use morse_firmware::config::{Preferences, PADDLE_DEBOUNCE_US};
use morse_firmware::morse::code::CwSymbol;
use morse_firmware::morse::keyer::{
    IambicKeyer, KeyerConfig, KeyerListener, KeyerState, PaddleDebouncer, PaddleState,
};
use morse_firmware::morse::Context;
use morse_firmware::types::{KeyerMode, PaddlePolarity};

#[derive(Debug, Default)]
struct Collect {
    chars: String,
    words: usize,
}

impl KeyerListener for Collect {
    fn on_character(&mut self, _ctx: &mut Context<'_>, text: &str) {
        self.chars.push_str(text);
    }

    fn on_word_end(&mut self, _ctx: &mut Context<'_>) {
        self.words += 1;
    }
}

fn keyer(mode: KeyerMode) -> IambicKeyer {
    let mut prefs = Preferences::default();
    prefs.keyer_mode = mode;
    IambicKeyer::new(KeyerConfig::from_preferences(&prefs))
}

fn run(
    bench: &mut Bench,
    keyer: &mut IambicKeyer,
    listener: &mut Collect,
    until_ms: u64,
    paddles: impl Fn(u64) -> PaddleState,
) -> ToneLog {
    let mut log = ToneLog::default();
    while bench.now_ms < until_ms {
        let p = paddles(bench.now_ms);
        bench.with(|ctx| keyer.step(ctx, p, &mut *listener));
        log.observe(bench.now_ms, bench.tone_on());
        bench.now_ms += 1;
    }
    log
}

fn dit_until(end: u64) -> impl Fn(u64) -> PaddleState {
    move |t| PaddleState::new(t < end, false)
}

fn dah_until(end: u64) -> impl Fn(u64) -> PaddleState {
    move |t| PaddleState::new(false, t < end)
}

fn squeeze_until(end: u64) -> impl Fn(u64) -> PaddleState {
    move |t| PaddleState::new(t < end, t < end)
}

// =============================================================================
// Timing
// =============================================================================

#[test]
fn single_dit_lasts_one_dit() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicB);
    let mut out = Collect::default();

    let log = run(&mut bench, &mut k, &mut out, 1000, dit_until(10));

    assert_eq!(log.intervals.len(), 1);
    let d = log.durations()[0];
    assert!((60..=62).contains(&d), "dit lasted {d} ms");
    assert_eq!(out.chars, "e");
    assert_eq!(out.words, 1);
    assert!(k.is_idle());
}

#[test]
fn held_dah_repeats_with_element_gap() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicB);
    let mut out = Collect::default();

    let log = run(&mut bench, &mut k, &mut out, 1000, dah_until(400));

    assert_eq!(log.intervals.len(), 2);
    for d in log.durations() {
        assert!((180..=182).contains(&d), "dah lasted {d} ms");
    }
    let gap = log.intervals[1].0 - log.intervals[0].1;
    assert!((60..=64).contains(&gap), "gap {gap} ms");
    assert_eq!(out.chars, "m");
}

#[test]
fn word_end_after_five_dits() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicB);
    let mut out = Collect::default();

    // the character completes at 124 ms, the word gap is 300 ms
    run(&mut bench, &mut k, &mut out, 420, dit_until(10));
    assert_eq!(out.words, 0);
    run(&mut bench, &mut k, &mut out, 430, dit_until(0));
    assert_eq!(out.words, 1);
}

#[test]
fn keys_at_configured_pitch() {
    let mut bench = Bench::new(20);
    let mut prefs = Preferences::default();
    prefs.sidetone_hz = 700;
    let mut k = IambicKeyer::new(KeyerConfig::from_preferences(&prefs));
    let mut out = Collect::default();

    run(&mut bench, &mut k, &mut out, 200, dit_until(10));
    assert!(bench.line.events.contains(&LineEvent::ToneOn(700)));
    assert!(!bench.line.events.contains(&LineEvent::Transmit(true)));
}

#[test]
fn transmitter_follows_internal_key_when_enabled() {
    let mut bench = Bench::new(20);
    bench.key.set_transmit_enabled(true);
    let mut k = keyer(KeyerMode::IambicB);
    let mut out = Collect::default();

    run(&mut bench, &mut k, &mut out, 200, dit_until(10));
    assert!(bench.line.events.contains(&LineEvent::Transmit(true)));
    assert!(!bench.line.transmitting);
}

// =============================================================================
// Squeeze Modes
// =============================================================================

#[test]
fn iambic_b_squeeze_alternates() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicB);
    let mut out = Collect::default();

    run(&mut bench, &mut k, &mut out, 600, squeeze_until(180));
    assert_eq!(out.chars, "a");
}

#[test]
fn iambic_b_latches_dah_tapped_late_in_dit() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicB);
    let mut out = Collect::default();

    // dah tapped after the Curtis point but before the dit ends
    run(&mut bench, &mut k, &mut out, 800, |t| {
        PaddleState::new(t < 5, (55..60).contains(&t))
    });
    assert_eq!(out.chars, "a");
}

#[test]
fn iambic_a_ignores_dah_released_during_dit() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicA);
    let mut out = Collect::default();

    run(&mut bench, &mut k, &mut out, 800, |t| {
        PaddleState::new(t < 5, (55..60).contains(&t))
    });
    assert_eq!(out.chars, "e");
}

#[test]
fn ultimatic_repeats_the_second_paddle() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::Ultimatic);
    let mut out = Collect::default();

    run(&mut bench, &mut k, &mut out, 1200, squeeze_until(450));
    assert_eq!(out.chars, "w");
}

#[test]
fn non_squeeze_repeats_the_first_paddle() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::NonSqueeze);
    let mut out = Collect::default();

    run(&mut bench, &mut k, &mut out, 800, squeeze_until(180));
    assert_eq!(out.chars, "i");
}

// =============================================================================
// ACS and Radio
// =============================================================================

#[test]
fn acs_holds_next_character() {
    let mut prefs = Preferences::default();
    prefs.acs_length = 3;
    let mut k = IambicKeyer::new(KeyerConfig::from_preferences(&prefs));
    let mut bench = Bench::new(20);
    let mut out = Collect::default();

    // first character completes at 124 ms; ACS holds until 124 + 3 dits
    let log = run(&mut bench, &mut k, &mut out, 700, |t| {
        PaddleState::new(t < 5 || (150..155).contains(&t), false)
    });
    assert_eq!(log.intervals.len(), 2);
    assert!(log.intervals[1].0 >= 304, "second dit at {}", log.intervals[1].0);
    assert_eq!(out.chars, "ee");
}

#[test]
fn without_acs_next_character_starts_at_once() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicB);
    let mut out = Collect::default();

    let log = run(&mut bench, &mut k, &mut out, 700, |t| {
        PaddleState::new(t < 5 || (150..155).contains(&t), false)
    });
    assert_eq!(log.intervals.len(), 2);
    assert!(log.intervals[1].0 <= 153);
}

#[test]
fn radio_gets_one_packet_per_word() {
    let mut prefs = Preferences::default();
    prefs.keyer_mode = KeyerMode::IambicB;
    let mut config = KeyerConfig::from_preferences(&prefs);
    config.encode_for_radio = true;
    let mut k = IambicKeyer::new(config);
    let mut bench = Bench::new(20);
    let mut out = Collect::default();

    run(&mut bench, &mut k, &mut out, 1000, dit_until(10));
    assert_eq!(bench.radio.sent.len(), 1);
    assert_eq!(
        bench.radio.sent[0],
        vec![CwSymbol::Dit, CwSymbol::CharEnd, CwSymbol::WordEnd]
    );
    assert_eq!(bench.radio.sent_text(0), "e");
}

#[test]
fn abort_releases_key() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicB);
    let mut out = Collect::default();

    run(&mut bench, &mut k, &mut out, 20, dit_until(10));
    assert_eq!(k.state(), KeyerState::Keyed);
    assert!(bench.tone_on());

    bench.with(|ctx| k.abort(ctx));
    assert!(!bench.tone_on());
    assert!(k.is_idle());
    assert!(!k.latch().any_paddle());
}

#[test]
fn idle_step_reports_no_paddle() {
    let mut bench = Bench::new(20);
    let mut k = keyer(KeyerMode::IambicB);
    let busy = bench.with(|ctx| k.step(ctx, PaddleState::default(), &mut ()));
    assert!(!busy);
    assert!(k.is_idle());
}

// =============================================================================
// Debouncing
// =============================================================================

#[test]
fn contact_accepted_after_debounce_window() {
    let mut d = PaddleDebouncer::new();
    let m = KeyerMode::IambicB;
    let p = PaddlePolarity::DitLeft;

    assert!(d.sample(1_000, true, false, m, p).is_idle());
    assert!(d.sample(1_000 + PADDLE_DEBOUNCE_US, true, false, m, p).is_idle());
    let state = d.sample(1_001 + PADDLE_DEBOUNCE_US, true, false, m, p);
    assert!(state.dit);
    assert!(!state.dah);
}

#[test]
fn bouncing_contact_is_ignored() {
    let mut d = PaddleDebouncer::new();
    let m = KeyerMode::IambicB;
    let p = PaddlePolarity::DitLeft;

    for i in 0..10u64 {
        let state = d.sample(1_000 + i * 200, i % 2 == 0, false, m, p);
        assert!(state.is_idle());
    }
}

#[test]
fn polarity_maps_right_contact_to_dit() {
    let mut d = PaddleDebouncer::new();
    let m = KeyerMode::IambicB;
    let p = PaddlePolarity::DitRight;

    d.sample(1_000, false, true, m, p);
    let state = d.sample(3_000, false, true, m, p);
    assert!(state.dit);
    assert!(!state.dah);
}

#[test]
fn non_squeeze_ignores_both_contacts() {
    let mut d = PaddleDebouncer::new();
    let m = KeyerMode::NonSqueeze;
    let p = PaddlePolarity::DitLeft;

    d.sample(1_000, true, true, m, p);
    assert!(d.sample(5_000, true, true, m, p).is_idle());
    assert_eq!(d.contacts(), (false, false));
}
