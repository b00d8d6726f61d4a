//! GPIO pin abstractions
//!
//! The adapter only drives outputs (status LEDs), so only the output side
//! of the pin model is exposed.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip, including any active-low inversion of the LED.
pub trait OutputPin {
    /// Turn the output on (LED lit)
    fn set_high(&mut self);

    /// Turn the output off (LED dark)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}
