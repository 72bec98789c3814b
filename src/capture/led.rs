//! LED activation policy and scoped guard

use crate::config::DayNightBoundary;
use crate::hardware::{Gpio, GpioError};
use chrono::{NaiveTime, Timelike};
use tracing::{debug, error};

/// Decide whether the illuminator runs for this capture.
///
/// Disabled LED wins over everything; without the night restriction the LED
/// always runs; with it, only when `now` falls outside the day interval.
pub fn should_use_led(
    use_led: bool,
    night_led_only: bool,
    boundary: &DayNightBoundary,
    now: NaiveTime,
) -> bool {
    if !use_led {
        return false;
    }
    if !night_led_only {
        return true;
    }
    !boundary.is_day(now.hour() as u8)
}

/// Scoped LED activation.
///
/// Construction drives the pin high; `Drop` drives it low. Because release
/// lives in `Drop`, the LED goes off on every exit from the owning scope —
/// normal return, `?` early-exit, or the whole cycle future being dropped at
/// shutdown. The illuminator can never be left stuck on.
pub struct LedGuard<'a, G: Gpio> {
    gpio: &'a G,
    pin: u8,
}

impl<'a, G: Gpio> LedGuard<'a, G> {
    pub fn activate(gpio: &'a G, pin: u8) -> Result<Self, GpioError> {
        gpio.set_output(pin, true)?;
        debug!(pin, "LED on");
        Ok(Self { gpio, pin })
    }
}

impl<G: Gpio> Drop for LedGuard<'_, G> {
    fn drop(&mut self) {
        match self.gpio.set_output(self.pin, false) {
            Ok(()) => debug!(pin = self.pin, "LED off"),
            Err(e) => error!(pin = self.pin, error = %e, "Failed to deactivate LED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::simulated::SimGpio;

    fn boundary() -> DayNightBoundary {
        DayNightBoundary {
            start_hour: 6,
            end_hour: 19,
        }
    }

    fn at(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    #[test]
    fn disabled_led_never_runs() {
        assert!(!should_use_led(false, true, &boundary(), at(3)));
        assert!(!should_use_led(false, false, &boundary(), at(12)));
    }

    #[test]
    fn unrestricted_led_always_runs() {
        assert!(should_use_led(true, false, &boundary(), at(3)));
        assert!(should_use_led(true, false, &boundary(), at(12)));
    }

    #[test]
    fn night_only_led_follows_day_boundary() {
        assert!(should_use_led(true, true, &boundary(), at(3)));
        assert!(!should_use_led(true, true, &boundary(), at(12)));
        // Boundary edges: 6 is day, 19 is night (half-open interval)
        assert!(!should_use_led(true, true, &boundary(), at(6)));
        assert!(should_use_led(true, true, &boundary(), at(19)));
    }

    #[test]
    fn guard_pairs_on_and_off() {
        let gpio = SimGpio::new();
        {
            let _led = LedGuard::activate(&gpio, 27).unwrap();
            assert!(gpio.level(27));
        }
        assert!(!gpio.level(27));
        assert_eq!(gpio.writes(27), vec![true, false]);
    }
}
