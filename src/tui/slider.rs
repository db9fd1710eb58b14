//! Power-level slider state.
//!
//! The slider keeps two values: `pending` follows every key press, while
//! `committed` only changes on `commit`. Readings and redraws are driven by the
//! committed value alone.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSlider {
    min: f64,
    max: f64,
    step: f64,
    pending: f64,
    committed: f64,
}

impl PowerSlider {
    /// A slider over `[min, max]`, starting (and committed) at `min`.
    ///
    /// A reversed range is swapped; a non-positive step falls back to the full span.
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        let (min, max) = if max < min { (max, min) } else { (min, max) };
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            (max - min).max(f64::EPSILON)
        };
        Self {
            min,
            max,
            step,
            pending: min,
            committed: min,
        }
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn pending(&self) -> f64 {
        self.pending
    }

    pub fn committed(&self) -> f64 {
        self.committed
    }

    /// `true` while the pending value differs from the committed one.
    pub fn is_dirty(&self) -> bool {
        self.pending != self.committed
    }

    /// Move the pending value by a whole number of steps.
    pub fn nudge(&mut self, steps: i64) {
        self.pending = self.snap(self.pending + steps as f64 * self.step);
    }

    pub fn set_pending(&mut self, value: f64) {
        if value.is_finite() {
            self.pending = self.snap(value);
        }
    }

    /// Commit the pending value and return it.
    pub fn commit(&mut self) -> f64 {
        self.committed = self.snap(self.pending);
        self.pending = self.committed;
        self.committed
    }

    /// Position of the pending value in `[0, 1]` along the track.
    pub fn fraction(&self) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 { (self.pending - self.min) / span } else { 0.0 }
    }

    /// Clamp to the range and snap to `min + k * step`; `max` itself is always reachable.
    fn snap(&self, value: f64) -> f64 {
        let v = value.clamp(self.min, self.max);
        if v >= self.max {
            return self.max;
        }
        let k = ((v - self.min) / self.step).round();
        (self.min + k * self.step).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_minimum() {
        let s = PowerSlider::new(5.0, 100.0, 0.1);
        assert_eq!(s.pending(), 5.0);
        assert_eq!(s.committed(), 5.0);
        assert!(!s.is_dirty());
    }

    #[test]
    fn moving_without_commit_keeps_committed_value() {
        let mut s = PowerSlider::new(5.0, 100.0, 0.1);
        s.nudge(25);
        assert!((s.pending() - 7.5).abs() < 1e-9);
        assert_eq!(s.committed(), 5.0);
        assert!(s.is_dirty());

        let v = s.commit();
        assert!((v - 7.5).abs() < 1e-9);
        assert!(!s.is_dirty());
    }

    #[test]
    fn commit_clamps_and_snaps() {
        let mut s = PowerSlider::new(5.0, 100.0, 0.1);
        s.set_pending(42.123);
        assert!((s.commit() - 42.1).abs() < 1e-9);

        s.set_pending(250.0);
        assert_eq!(s.commit(), 100.0);

        s.nudge(-10_000);
        assert_eq!(s.commit(), 5.0);
    }

    #[test]
    fn off_grid_maximum_is_reachable() {
        let mut s = PowerSlider::new(0.0, 1.1, 0.25);
        s.nudge(100);
        assert_eq!(s.commit(), 1.1);
        s.set_pending(1.05);
        assert!((s.commit() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_step_is_replaced() {
        let s = PowerSlider::new(10.0, 20.0, 0.0);
        assert_eq!(s.step(), 10.0);
    }
}
