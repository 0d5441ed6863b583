//! Morse Trainer Main Application
//!
//! Entry point for the STM32G474-based Morse trainer firmware.
//! Initializes the paddle inputs and key outputs and spawns the trainer
//! loop, the radio bridge and the heartbeat.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::peripherals::TIM1;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::{Channel as PwmChannel, CountingMode};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use morse_firmware::board::{PinKeyLine, PwmSidetone};
use morse_firmware::lora::{LoraCw, RawFrame};
use morse_firmware::mode::{CwPlayback, EchoTrainer, PaddleKeying};
use morse_firmware::morse::words::{RandomWords, WordMode};
use morse_firmware::prelude::*;

/// Frames received by the modem, drained by the trainer loop
static RADIO_RX: Channel<CriticalSectionRawMutex, RawFrame, 4> = Channel::new();

/// Frames queued for the modem
static RADIO_TX: Channel<CriticalSectionRawMutex, Vec<u8, MAX_PACKET_LEN>, 4> = Channel::new();

/// Radio driver backed by the modem channels
struct ChannelRadio;

impl RadioDriver for ChannelRadio {
    fn transmit(&mut self, frame: &[u8]) {
        let Ok(bytes) = Vec::from_slice(frame) else {
            warn!("radio: frame too long");
            return;
        };
        if RADIO_TX.try_send(bytes).is_err() {
            warn!("radio: tx queue full, frame dropped");
        }
    }

    fn poll(&mut self) -> Option<RawFrame> {
        RADIO_RX.try_receive().ok()
    }
}

/// Display sink that writes lines to RTT
struct RttDisplay {
    line: String<MAX_MESSAGE_LEN>,
}

impl RttDisplay {
    const fn new() -> Self {
        Self { line: String::new() }
    }
}

impl DisplaySink for RttDisplay {
    fn print_character(&mut self, text: &str, _style: TextStyle) {
        if self.line.push_str(text).is_err() {
            self.flush();
            let _ = self.line.push_str(text);
        }
    }

    fn print_word_break(&mut self) {
        if self.line.push(' ').is_err() {
            self.flush();
        }
    }

    fn clear_line(&mut self, _line: u8) {
        self.line.clear();
    }

    fn flush(&mut self) {
        if !self.line.is_empty() {
            info!("display: {}", self.line.as_str());
            self.line.clear();
        }
    }
}

type Line = PinKeyLine<PwmSidetone<'static, TIM1>, Output<'static>>;
type Radio = LoraCw<ChannelRadio>;
type MorseTrainer = Trainer<Line, RttDisplay, Radio, RandomWords>;

/// The trainer lives for the whole run; the loop task borrows it
static TRAINER: StaticCell<MorseTrainer> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Morse Trainer Firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    // Status LED (PA5 on Nucleo boards)
    let led = Output::new(p.PA5, Level::Low, Speed::Low);

    // Paddle contacts close to ground
    let left = Input::new(p.PA0, Pull::Up);
    let right = Input::new(p.PA1, Pull::Up);

    let key = Output::new(p.PB0, Level::Low, Speed::Low);
    let tone_pin = PwmPin::new_ch1(p.PA8, OutputType::PushPull);
    let pwm = SimplePwm::new(
        p.TIM1,
        Some(tone_pin),
        None,
        None,
        None,
        Hertz(u32::from(DEFAULT_SIDETONE_HZ)),
        CountingMode::EdgeAlignedUp,
    );
    let line = PinKeyLine::new(PwmSidetone::new(pwm, PwmChannel::Ch1), key);

    info!(
        "Paddles on {}/{}, key on {}, sidetone on {}",
        pins::PADDLE_LEFT,
        pins::PADDLE_RIGHT,
        pins::KEY_OUT,
        pins::SIDETONE
    );

    // A paddle held at power-up picks the trainer: left for the generator,
    // right for the echo trainer
    let prefs = Preferences::default();
    let seed = Instant::now().as_ticks();
    let mode: ActiveMode<RandomWords> = if left.is_low() {
        ActiveMode::Generator(CwPlayback::new(&prefs, RandomWords::with_seed(seed, WordMode::default())))
    } else if right.is_low() {
        ActiveMode::Echo(EchoTrainer::new(&prefs, RandomWords::with_seed(seed, WordMode::default())))
    } else {
        ActiveMode::Keyer(PaddleKeying::new(&prefs))
    };

    let radio: Radio = LoraCw::new(ChannelRadio, prefs.wpm);
    let trainer = match Trainer::new(prefs, line, RttDisplay::new(), radio, mode) {
        Ok(trainer) => TRAINER.init(trainer),
        Err(err) => {
            error!("config: {}", err);
            return;
        }
    };

    defmt::unwrap!(spawner.spawn(heartbeat_task(led)));
    defmt::unwrap!(spawner.spawn(radio_task()));
    defmt::unwrap!(spawner.spawn(morse_task(trainer, left, right)));

    info!("Tasks spawned");
}

/// Trainer loop, one step per millisecond
#[embassy_executor::task]
async fn morse_task(trainer: &'static mut MorseTrainer, left: Input<'static>, right: Input<'static>) {
    let mut ticker = Ticker::every(Duration::from_millis(LOOP_TICK_MS));
    loop {
        trainer.tick(Instant::now().as_micros(), left.is_low(), right.is_low());
        ticker.next().await;
    }
}

/// Hands queued frames to the modem
///
/// The modem driver sits below the packet boundary; until it is attached
/// frames are logged and dropped.
#[embassy_executor::task]
async fn radio_task() {
    loop {
        let frame = RADIO_TX.receive().await;
        debug!("radio: tx frame {=[u8]:02x}", frame.as_slice());
    }
}

/// Heartbeat task - blinks LED to show system is running
#[embassy_executor::task]
async fn heartbeat_task(mut led: Output<'static>) {
    loop {
        led.set_high();
        Timer::after(Duration::from_millis(100)).await;
        led.set_low();
        Timer::after(Duration::from_millis(900)).await;
    }
}
