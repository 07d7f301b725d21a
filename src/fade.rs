//! Linear volume ramps, sampled from the animation loop.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeFade {
    from: f64,
    to: f64,
    start_ms: f64,
    duration_ms: f64,
}

impl VolumeFade {
    pub fn new(from: f64, to: f64, start_ms: f64, duration_ms: f64) -> Self {
        Self {
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            start_ms,
            duration_ms: duration_ms.max(0.0),
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn value_at(&self, now_ms: f64) -> f64 {
        if self.duration_ms == 0.0 {
            return self.to;
        }
        let p = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * p
    }

    pub fn is_done(&self, now_ms: f64) -> bool {
        now_ms - self.start_ms >= self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_and_clamps() {
        let f = VolumeFade::new(0.0, 0.28, 100.0, 300.0);
        assert_eq!(f.value_at(0.0), 0.0);
        assert!((f.value_at(250.0) - 0.14).abs() < 1e-12);
        assert!((f.value_at(10_000.0) - 0.28).abs() < 1e-12);
        assert!(!f.is_done(399.0));
        assert!(f.is_done(400.0));
    }

    #[test]
    fn zero_duration_jumps() {
        let f = VolumeFade::new(0.5, 2.0, 0.0, 0.0);
        assert_eq!(f.value_at(0.0), 1.0);
        assert!(f.is_done(0.0));
    }
}
