//! The range control mirrored over the channel: a bounded value that moves
//! in fixed steps and renders as a numeric string.

/// A linear range control
#[derive(Debug, Clone)]
pub struct Slider {
    min: f64,
    max: f64,
    step: f64,
    value: f64,
}

impl Default for Slider {
    fn default() -> Self {
        // 0..100 in whole steps, starting at the midpoint
        Self {
            min: 0.0,
            max: 100.0,
            step: 1.0,
            value: 50.0,
        }
    }
}

impl Slider {
    /// Build a slider from already-validated bounds (min < max, step > 0).
    /// The initial value is clamped into range.
    pub fn new(min: f64, max: f64, step: f64, initial: f64) -> Self {
        Self {
            min,
            max,
            step,
            value: initial.clamp(min, max),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Move one step up. Returns false when already pinned at max.
    pub fn increase(&mut self) -> bool {
        self.set((self.value + self.step).min(self.max))
    }

    /// Move one step down. Returns false when already pinned at min.
    pub fn decrease(&mut self) -> bool {
        self.set((self.value - self.step).max(self.min))
    }

    pub fn jump_min(&mut self) -> bool {
        self.set(self.min)
    }

    pub fn jump_max(&mut self) -> bool {
        self.set(self.max)
    }

    fn set(&mut self, value: f64) -> bool {
        if (value - self.value).abs() < f64::EPSILON {
            return false;
        }
        self.value = value;
        true
    }

    /// Position within the range as 0.0..=1.0, for the gauge widget
    pub fn ratio(&self) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        ((self.value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Wire form of the current value: a numeric string, with integral
    /// values rendered without a decimal point ("42", not "42.0")
    pub fn wire_value(&self) -> String {
        if self.value.fract().abs() < f64::EPSILON {
            format!("{}", self.value as i64)
        } else {
            format!("{}", self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_and_midpoint() {
        let slider = Slider::default();
        assert_eq!(slider.min(), 0.0);
        assert_eq!(slider.max(), 100.0);
        assert_eq!(slider.wire_value(), "50");
    }

    #[test]
    fn nudges_move_by_step_and_clamp() {
        let mut slider = Slider::new(0.0, 10.0, 1.0, 9.0);
        assert!(slider.increase());
        assert_eq!(slider.wire_value(), "10");
        // Pinned at max: no change, no input event
        assert!(!slider.increase());
        assert_eq!(slider.wire_value(), "10");

        assert!(slider.jump_min());
        assert!(!slider.decrease());
        assert_eq!(slider.wire_value(), "0");
    }

    #[test]
    fn initial_value_is_clamped() {
        let slider = Slider::new(0.0, 100.0, 1.0, 250.0);
        assert_eq!(slider.wire_value(), "100");
    }

    #[test]
    fn fractional_values_keep_their_fraction() {
        let mut slider = Slider::new(0.0, 1.0, 0.25, 0.0);
        slider.increase();
        assert_eq!(slider.wire_value(), "0.25");
    }

    #[test]
    fn ratio_spans_the_range() {
        let slider = Slider::new(50.0, 150.0, 1.0, 75.0);
        assert!((slider.ratio() - 0.25).abs() < 1e-9);
    }
}
