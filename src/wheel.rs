//! Scroll accumulator that drives animation time and label reveals.

use crate::config::WheelConfig;

/// A single accumulated wheel value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelState {
    value: f64,
}

impl WheelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Adds `delta` to the accumulated value and returns the result.
    ///
    /// The wrap check runs before the addition, so a value may overshoot the
    /// threshold once and is reset on the following call.
    pub fn accumulate(&mut self, delta: f64, config: &WheelConfig) -> f64 {
        if self.value.abs() > config.wrap_threshold {
            self.value = 0.0;
        }
        self.value += delta;
        self.value
    }

    /// Animation time in seconds for the current value.
    pub fn mixer_time(&self, config: &WheelConfig) -> f64 {
        self.value / config.units_per_second
    }

    /// Visibility of the two scroll-revealed labels.
    pub fn revealed(&self, config: &WheelConfig) -> [bool; 2] {
        revealed_labels(self.value, config)
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

pub fn revealed_labels(value: f64, config: &WheelConfig) -> [bool; 2] {
    let (first, second) = if value < 0.0 {
        config.backward_reveal
    } else {
        config.forward_reveal
    };
    [value > first, value > second]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_the_call_after_crossing() {
        let config = WheelConfig::default();
        let mut wheel = WheelState::new();
        assert_eq!(wheel.accumulate(4400.0, &config), 4400.0);
        assert_eq!(wheel.accumulate(200.0, &config), 4600.0);
        // magnitude now exceeds 4500, so this call starts from zero
        assert_eq!(wheel.accumulate(100.0, &config), 100.0);
    }

    #[test]
    fn exact_threshold_does_not_wrap() {
        let config = WheelConfig::default();
        let mut wheel = WheelState::new();
        wheel.accumulate(4500.0, &config);
        assert_eq!(wheel.accumulate(10.0, &config), 4510.0);
    }

    #[test]
    fn wraps_backwards_too() {
        let config = WheelConfig::default();
        let mut wheel = WheelState::new();
        wheel.accumulate(-4600.0, &config);
        assert_eq!(wheel.accumulate(-50.0, &config), -50.0);
    }

    #[test]
    fn reveal_rules() {
        let config = WheelConfig::default();
        assert_eq!(revealed_labels(0.0, &config), [false, false]);
        assert_eq!(revealed_labels(1000.0, &config), [false, false]);
        assert_eq!(revealed_labels(1500.0, &config), [true, false]);
        assert_eq!(revealed_labels(2500.0, &config), [true, true]);
        assert_eq!(revealed_labels(-500.0, &config), [true, true]);
        assert_eq!(revealed_labels(-1200.0, &config), [false, true]);
        assert_eq!(revealed_labels(-1500.0, &config), [false, false]);
    }

    #[test]
    fn mixer_time_is_seconds() {
        let config = WheelConfig::default();
        let mut wheel = WheelState::new();
        wheel.accumulate(2500.0, &config);
        assert_eq!(wheel.mixer_time(&config), 2.5);
    }
}
