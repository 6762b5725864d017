//! Looping progress of the markers that travel along each arc.

/// Progress gained per second; one full traversal every 10 seconds.
pub const DEFAULT_ARC_RATE: f64 = 0.1;

/// Advance one arc's progress by `delta` seconds.
///
/// Progress runs from `phase` to `1 + phase` and then restarts at `phase`.
#[inline]
pub fn advance(progress: f64, delta: f64, rate: f64, phase: f64) -> f64 {
    let next = progress + delta * rate;
    if next > 1.0 + phase {
        phase
    } else {
        next
    }
}

/// Curve parameter for a progress value.
#[inline]
pub fn effective_t(progress: f64, phase: f64) -> f64 {
    (progress - phase).clamp(0.0, 1.0)
}

/// Owns the progress of every arc in a scene.
#[derive(Debug, Clone)]
pub struct ArcDriver {
    phases: Vec<f64>,
    progress: Vec<f64>,
    rate: f64,
}

impl ArcDriver {
    pub fn new(phases: Vec<f64>, rate: f64) -> Self {
        let progress = phases.clone();
        Self { phases, progress, rate }
    }

    pub fn tick(&mut self, delta: f64) {
        for (p, &phase) in self.progress.iter_mut().zip(&self.phases) {
            *p = advance(*p, delta, self.rate, phase);
        }
    }

    /// Curve parameter of arc `index`.
    pub fn t(&self, index: usize) -> f64 {
        effective_t(self.progress[index], self.phases[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl ArcDriver {
        fn progress(&self, index: usize) -> f64 {
            self.progress[index]
        }
    }

    #[test]
    fn test_wrap_resets_to_phase() {
        let phase = 0.3;
        // Raw progress would reach 0.3 + 10.5 * 0.1 = 1.35
        let p = advance(phase, 10.5, 0.1, phase);
        assert_eq!(p, 0.3);
    }

    #[test]
    fn test_no_wrap_at_exact_boundary() {
        let p = advance(1.0, 0.0, 0.1, 0.0);
        assert_eq!(p, 1.0);
        assert_eq!(effective_t(p, 0.0), 1.0);
    }

    #[test]
    fn test_effective_t_clamps() {
        assert_eq!(effective_t(0.3, 0.3), 0.0);
        assert_eq!(effective_t(0.2, 0.3), 0.0);
        assert!((effective_t(0.8, 0.3) - 0.5).abs() < 1e-12);
        assert_eq!(effective_t(1.5, 0.3), 1.0);
    }

    #[test]
    fn test_driver_starts_at_phase_and_stays_in_range() {
        let phases = vec![0.0, 0.3, 0.75];
        let mut driver = ArcDriver::new(phases.clone(), DEFAULT_ARC_RATE);
        for (i, &phase) in phases.iter().enumerate() {
            assert_eq!(driver.progress(i), phase);
            assert_eq!(driver.t(i), 0.0);
        }

        for _ in 0..5000 {
            driver.tick(1.0 / 60.0);
            for (i, &phase) in phases.iter().enumerate() {
                let p = driver.progress(i);
                assert!(p >= phase && p <= 1.0 + phase);
                assert!((0.0..=1.0).contains(&driver.t(i)));
            }
        }
    }

    #[test]
    fn test_loop_is_periodic() {
        let mut driver = ArcDriver::new(vec![0.5], 0.1);

        // Count restarts over 35 seconds at 100 ticks per second
        let mut restarts = 0;
        let mut last = driver.progress(0);
        for _ in 0..3500 {
            driver.tick(0.01);
            let p = driver.progress(0);
            if p < last {
                restarts += 1;
            }
            last = p;
        }
        assert_eq!(restarts, 3);
    }

    #[test]
    fn test_arcs_share_cadence() {
        let mut driver = ArcDriver::new(vec![0.1, 0.6], 0.1);
        driver.tick(2.0);
        assert!((driver.t(0) - 0.2).abs() < 1e-9);
        assert!((driver.t(0) - driver.t(1)).abs() < 1e-9);
        driver.tick(7.0);
        assert!((driver.t(1) - 0.9).abs() < 1e-9);
        driver.tick(1.5);
        assert_eq!(driver.t(0), 0.0);
        assert_eq!(driver.t(1), 0.0);
        assert_eq!(driver.progress(1), 0.6);
    }
}
