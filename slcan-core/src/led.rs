//! Status LED timing
//!
//! The bus LED follows the bus state. The activity LED flashes on each
//! transmitted or received frame, with minimum on and off times so bursts
//! stay visible as blinks rather than a steady glow. All comparisons use
//! wrapping millisecond arithmetic.

use slcan_hal::OutputPin;

/// One LED with flash timing
pub struct Indicator<P: OutputPin> {
    pin: P,
    lit: bool,
    steady: bool,
    last_on: u32,
    last_off: u32,
    min_on_ms: u32,
    min_off_ms: u32,
}

impl<P: OutputPin> Indicator<P> {
    /// Wrap a pin, initially dark and ready to flash
    pub fn new(mut pin: P, min_on_ms: u32, min_off_ms: u32) -> Self {
        pin.set_low();
        Self {
            pin,
            lit: false,
            steady: false,
            last_on: 0,
            last_off: 0u32.wrapping_sub(min_off_ms),
            min_on_ms,
            min_off_ms,
        }
    }

    /// Check if the LED is currently lit
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Light the LED briefly, if it has been dark long enough
    ///
    /// Ignored while lit, so a burst extends nothing; `service` turns the
    /// LED back off once the on time has elapsed.
    pub fn flash(&mut self, now_ms: u32) {
        if self.lit || now_ms.wrapping_sub(self.last_off) < self.min_off_ms {
            return;
        }
        self.pin.set_high();
        self.lit = true;
        self.last_on = now_ms;
    }

    /// Turn a flashed LED off once its on time has elapsed
    pub fn service(&mut self, now_ms: u32) {
        if !self.lit || self.steady {
            return;
        }
        if now_ms.wrapping_sub(self.last_on) >= self.min_on_ms {
            self.pin.set_low();
            self.lit = false;
            self.last_off = now_ms;
        }
    }

    /// Hold the LED on, or release it to dark
    pub fn set_steady(&mut self, on: bool, now_ms: u32) {
        self.steady = on;
        self.pin.set_state(on);
        if on {
            self.last_on = now_ms;
        } else if self.lit {
            self.last_off = now_ms;
        }
        self.lit = on;
    }

    /// Drive the pin directly, bypassing flash timing
    pub fn force(&mut self, on: bool) {
        self.pin.set_state(on);
        self.lit = on;
    }
}

/// The adapter's two LEDs
pub struct StatusLeds<B: OutputPin, A: OutputPin> {
    /// Lit while on the bus
    pub bus: Indicator<B>,
    /// Flashes on frame traffic
    pub activity: Indicator<A>,
}

impl<B: OutputPin, A: OutputPin> StatusLeds<B, A> {
    pub fn new(bus: B, activity: A, on_ms: u32, off_ms: u32) -> Self {
        Self {
            bus: Indicator::new(bus, on_ms, off_ms),
            activity: Indicator::new(activity, on_ms, off_ms),
        }
    }

    /// Advance flash timing on both LEDs
    pub fn service(&mut self, now_ms: u32) {
        self.bus.service(now_ms);
        self.activity.service(now_ms);
    }

    /// Alternate the LEDs `cycles` times to show the firmware booted
    ///
    /// `delay_ms` blocks for the given time; it runs before any timebase
    /// is available. Both LEDs end dark.
    pub fn startup_blink(&mut self, cycles: u8, period_ms: u32, mut delay_ms: impl FnMut(u32)) {
        for _ in 0..cycles {
            self.bus.force(true);
            self.activity.force(false);
            delay_ms(period_ms);
            self.bus.force(false);
            self.activity.force(true);
            delay_ms(period_ms);
        }
        self.bus.force(false);
        self.activity.force(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPin;

    fn indicator() -> Indicator<MockPin> {
        Indicator::new(MockPin::default(), 10, 10)
    }

    #[test]
    fn test_flash_then_service() {
        let mut led = indicator();
        led.flash(100);
        assert!(led.pin().high);

        led.service(105);
        assert!(led.pin().high);

        led.service(110);
        assert!(!led.pin().high);
    }

    #[test]
    fn test_first_flash_allowed_at_zero() {
        let mut led = indicator();
        led.flash(0);
        assert!(led.is_lit());
    }

    #[test]
    fn test_min_off_time_enforced() {
        let mut led = indicator();
        led.flash(100);
        led.service(110);

        led.flash(115);
        assert!(!led.is_lit());

        led.flash(120);
        assert!(led.is_lit());
    }

    #[test]
    fn test_burst_does_not_extend_flash() {
        let mut led = indicator();
        led.flash(100);
        led.flash(105);
        led.service(110);
        assert!(!led.is_lit());
    }

    #[test]
    fn test_timing_across_wrap() {
        let mut led = indicator();
        led.flash(100);
        led.service(110);

        led.flash(u32::MAX - 4);
        led.service(2);
        assert!(led.is_lit());
        led.service(5);
        assert!(!led.is_lit());
    }

    #[test]
    fn test_steady_ignores_service() {
        let mut led = indicator();
        led.set_steady(true, 0);
        led.service(1_000);
        assert!(led.pin().high);

        led.set_steady(false, 1_000);
        assert!(!led.pin().high);
    }

    #[test]
    fn test_startup_blink() {
        let mut leds = StatusLeds::new(MockPin::default(), MockPin::default(), 10, 10);
        let mut delays = std::vec::Vec::new();
        leds.startup_blink(3, 50, |ms| delays.push(ms));

        assert_eq!(delays, [50; 6]);
        assert_eq!(leds.bus.pin().transitions, 6);
        assert!(!leds.bus.is_lit());
        assert!(!leds.activity.is_lit());
    }
}
