//! Dogleg-constrained path smoothing.
//!
//! Single forward pass: every resolved point may move at most
//! `delta_z * horizontal_length` away from the last resolved (or anchored)
//! point. Lengths are 2-D horizontal distances; lengths of unresolved points
//! in between accumulate. The pass is causal, no global fit is attempted.

/// Smoothing input for one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Raw target depth from the contact; subject to the dogleg constraint.
    Resolved(f64),
    /// Pinned depth; taken exactly and restarts propagation.
    Anchored(f64),
    /// No target; keeps the original depth and is skipped by propagation.
    Unresolved(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// Horizontal length from the previous point (ignored for the first).
    pub length: f64,
    pub target: Target,
}

/// Forward constraint propagation with a maximum TVD slope.
#[derive(Debug, Clone, Copy)]
pub struct PathSmoother {
    delta_z: f64,
}

impl PathSmoother {
    /// `delta_z` is the maximum TVD change per metre of horizontal length.
    /// An infinite value disables the constraint.
    pub const fn new(delta_z: f64) -> Self {
        Self { delta_z }
    }

    pub const fn delta_z(&self) -> f64 {
        self.delta_z
    }

    /// Largest allowed TVD change over `length` metres.
    pub fn max_step(&self, length: f64) -> f64 {
        if self.delta_z.is_infinite() {
            f64::INFINITY
        } else {
            self.delta_z * length
        }
    }

    /// Clamp `raw` to within `max_step` of `previous`.
    fn clamp_step(previous: f64, raw: f64, max_step: f64) -> f64 {
        let delta = raw - previous;
        if delta.abs() <= max_step {
            raw
        } else {
            previous + max_step.copysign(delta)
        }
    }

    pub fn smooth(&self, samples: &[PathSample]) -> Vec<f64> {
        let mut out = Vec::with_capacity(samples.len());
        let mut last: Option<f64> = None;
        let mut walked = 0.0;

        for sample in samples {
            walked += sample.length;
            match sample.target {
                Target::Unresolved(original) => out.push(original),
                Target::Anchored(depth) => {
                    out.push(depth);
                    last = Some(depth);
                    walked = 0.0;
                }
                Target::Resolved(raw) => {
                    let depth = match last {
                        None => raw,
                        Some(previous) => Self::clamp_step(previous, raw, self.max_step(walked)),
                    };
                    out.push(depth);
                    last = Some(depth);
                    walked = 0.0;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(lengths: &[f64], targets: &[f64]) -> Vec<PathSample> {
        lengths
            .iter()
            .zip(targets)
            .map(|(&length, &t)| PathSample {
                length,
                target: Target::Resolved(t),
            })
            .collect()
    }

    #[test]
    fn test_clamps_steep_step() {
        let delta_z = 0.5 / 45.0;
        let out = PathSmoother::new(delta_z).smooth(&resolved(&[0.0, 20.0], &[2014.5, 2016.0]));
        assert!((out[0] - 2014.5).abs() < 1e-12);
        assert!((out[1] - (2014.5 + 20.0 * delta_z)).abs() < 1e-12);
        assert!((out[1] - 2014.7222).abs() < 1e-4);
    }

    #[test]
    fn test_clamps_in_both_directions() {
        let out = PathSmoother::new(0.01).smooth(&resolved(&[0.0, 100.0, 100.0], &[1000.0, 990.0, 1003.0]));
        assert_eq!(out, vec![1000.0, 999.0, 1000.0]);
    }

    #[test]
    fn test_bound_holds_everywhere() {
        let targets = [1500.0, 1510.0, 1490.0, 1491.0, 1530.0, 1470.0, 1500.0];
        let lengths = [0.0, 30.0, 25.0, 10.0, 50.0, 40.0, 5.0];
        let smoother = PathSmoother::new(0.0167);
        let out = smoother.smooth(&resolved(&lengths, &targets));
        for i in 1..out.len() {
            assert!(
                (out[i] - out[i - 1]).abs() <= smoother.max_step(lengths[i]) + 1e-9,
                "step {i}: {} -> {}",
                out[i - 1],
                out[i]
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let lengths = [0.0, 30.0, 25.0, 10.0, 50.0];
        let smoother = PathSmoother::new(0.03);
        let first = smoother.smooth(&resolved(&lengths, &[1500.0, 1540.0, 1480.0, 1481.0, 1600.0]));
        let second = smoother.smooth(&resolved(&lengths, &first));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unconstrained_when_infinite() {
        let out = PathSmoother::new(f64::INFINITY).smooth(&resolved(&[0.0, 0.0, 10.0], &[10.0, 500.0, -3.0]));
        assert_eq!(out, vec![10.0, 500.0, -3.0]);
    }

    #[test]
    fn test_anchor_is_exact_and_restarts_propagation() {
        let samples = vec![
            PathSample { length: 0.0, target: Target::Resolved(1000.0) },
            PathSample { length: 10.0, target: Target::Anchored(1020.0) },
            PathSample { length: 10.0, target: Target::Resolved(1000.0) },
        ];
        let out = PathSmoother::new(0.1).smooth(&samples);
        assert_eq!(out[1], 1020.0);
        assert!((out[2] - 1019.0).abs() < 1e-12);
    }

    #[test]
    fn test_unresolved_points_are_jumped_over() {
        let samples = vec![
            PathSample { length: 0.0, target: Target::Resolved(1000.0) },
            PathSample { length: 10.0, target: Target::Unresolved(1200.0) },
            PathSample { length: 10.0, target: Target::Unresolved(800.0) },
            PathSample { length: 10.0, target: Target::Resolved(1010.0) },
        ];
        let out = PathSmoother::new(0.1).smooth(&samples);
        assert_eq!(out[1], 1200.0);
        assert_eq!(out[2], 800.0);
        // Allowed step measured over 30 m from the last resolved point
        assert!((out[3] - 1003.0).abs() < 1e-12);
    }

    #[test]
    fn test_leading_unresolved_points_do_not_anchor() {
        let samples = vec![
            PathSample { length: 0.0, target: Target::Unresolved(50.0) },
            PathSample { length: 10.0, target: Target::Resolved(1000.0) },
        ];
        let out = PathSmoother::new(0.01).smooth(&samples);
        assert_eq!(out, vec![50.0, 1000.0]);
    }
}
