//! Board Outputs
//!
//! Key line made of a sidetone generator and the transmitter key GPIO.
//! On the target the sidetone is a PWM channel whose frequency follows the
//! requested pitch. Pin errors are logged and otherwise ignored; a stuck
//! pin must not stall the loop.

use embedded_hal::digital::OutputPin;

use crate::morse::key_out::KeyLine;

/// Tone source behind the sidetone
pub trait Sidetone {
    /// Sound at `pitch_hz`
    fn start(&mut self, pitch_hz: u16);
    /// Silence
    fn stop(&mut self);
}

/// Key line built from a sidetone and a key GPIO
pub struct PinKeyLine<T: Sidetone, K: OutputPin> {
    tone: T,
    key: K,
}

impl<T: Sidetone, K: OutputPin> PinKeyLine<T, K> {
    /// Create the key line with tone and transmitter off
    pub fn new(mut tone: T, mut key: K) -> Self {
        tone.stop();
        if key.set_low().is_err() {
            warn!("board: key line init failed");
        }
        Self { tone, key }
    }
}

impl<T: Sidetone, K: OutputPin> KeyLine for PinKeyLine<T, K> {
    fn tone_on(&mut self, pitch_hz: u16) {
        self.tone.start(pitch_hz);
    }

    fn tone_off(&mut self) {
        self.tone.stop();
    }

    fn key_transmitter(&mut self, down: bool) {
        let result = if down {
            self.key.set_high()
        } else {
            self.key.set_low()
        };
        if result.is_err() {
            warn!("board: key pin error");
        }
    }
}

#[cfg(feature = "embedded")]
pub use pwm::PwmSidetone;

#[cfg(feature = "embedded")]
mod pwm {
    use embassy_stm32::time::Hertz;
    use embassy_stm32::timer::simple_pwm::SimplePwm;
    use embassy_stm32::timer::{Channel, GeneralInstance4Channel};

    use super::Sidetone;

    /// Square wave sidetone on one timer channel
    pub struct PwmSidetone<'d, T: GeneralInstance4Channel> {
        pwm: SimplePwm<'d, T>,
        channel: Channel,
        pitch_hz: u16,
    }

    impl<'d, T: GeneralInstance4Channel> PwmSidetone<'d, T> {
        /// Use `channel` of an already configured timer
        pub fn new(mut pwm: SimplePwm<'d, T>, channel: Channel) -> Self {
            let mut ch = pwm.channel(channel);
            ch.set_duty_cycle_fully_off();
            ch.enable();
            Self {
                pwm,
                channel,
                pitch_hz: 0,
            }
        }
    }

    impl<T: GeneralInstance4Channel> Sidetone for PwmSidetone<'_, T> {
        fn start(&mut self, pitch_hz: u16) {
            if pitch_hz == 0 {
                self.stop();
                return;
            }
            if pitch_hz != self.pitch_hz {
                self.pwm.set_frequency(Hertz(u32::from(pitch_hz)));
                self.pitch_hz = pitch_hz;
            }
            // duty is relative to the period, re-apply after a frequency change
            self.pwm.channel(self.channel).set_duty_cycle_percent(50);
        }

        fn stop(&mut self) {
            self.pwm.channel(self.channel).set_duty_cycle_fully_off();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct Tone {
        playing: Option<u16>,
        starts: u32,
    }

    impl Sidetone for &mut Tone {
        fn start(&mut self, pitch_hz: u16) {
            self.playing = Some(pitch_hz);
            self.starts += 1;
        }
        fn stop(&mut self) {
            self.playing = None;
        }
    }

    #[derive(Default)]
    struct Pin {
        high: bool,
    }

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn tone_follows_requested_pitch() {
        let mut tone = Tone::default();
        let mut pin = Pin::default();
        {
            let mut line = PinKeyLine::new(&mut tone, &mut pin);
            line.tone_on(650);
            line.tone_on(550);
        }
        assert_eq!(tone.playing, Some(550));
        assert_eq!(tone.starts, 2);
    }

    #[test]
    fn starts_silent_and_unkeyed() {
        let mut tone = Tone {
            playing: Some(700),
            starts: 0,
        };
        let mut pin = Pin { high: true };
        PinKeyLine::new(&mut tone, &mut pin);
        assert_eq!(tone.playing, None);
        assert!(!pin.high);
    }

    #[test]
    fn key_and_tone_are_independent() {
        let mut tone = Tone::default();
        let mut pin = Pin::default();
        {
            let mut line = PinKeyLine::new(&mut tone, &mut pin);
            line.key_transmitter(true);
            line.tone_on(600);
            line.tone_off();
        }
        assert_eq!(tone.playing, None);
        assert!(pin.high);
    }
}
