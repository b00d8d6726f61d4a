//! Status LED output for STM32F0

use embassy_stm32::gpio::{Level, Output, Pin, Speed};
use embassy_stm32::Peri;
use slcan_hal::OutputPin;

/// An LED on a push-pull GPIO
///
/// `set_high` always means "lit"; active-low wiring is handled here.
pub struct Led {
    pin: Output<'static>,
    active_low: bool,
}

impl Led {
    /// Configure `pin` as an output with the LED dark
    pub fn new(pin: Peri<'static, impl Pin>, active_low: bool) -> Self {
        let dark = if active_low { Level::High } else { Level::Low };
        Self {
            pin: Output::new(pin, dark, Speed::Low),
            active_low,
        }
    }
}

impl OutputPin for Led {
    fn set_high(&mut self) {
        if self.active_low {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }

    fn set_low(&mut self) {
        if self.active_low {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high() != self.active_low
    }
}
