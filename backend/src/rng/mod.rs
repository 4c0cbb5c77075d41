//! Deterministic random number generation
//!
//! Service durations are the only stochastic quantity in the model. They are
//! drawn through [`UniformSource`] so a run can be replayed from its seed, and
//! tests can script the exact uniforms an operator sees.

mod xorshift;

pub use xorshift::RngManager;

/// A source of uniform samples in `[0.0, 1.0)`
pub trait UniformSource {
    /// Next sample in `[0.0, 1.0)`
    fn next_uniform(&mut self) -> f64;

    /// Sample an exponentially distributed duration with the given mean
    ///
    /// Uses inversion: `-ln(1 - U) * mean`. Since `U < 1`, the logarithm is
    /// always finite.
    fn exponential(&mut self, mean: f64) -> f64 {
        let u = self.next_uniform();
        -(1.0 - u).ln() * mean
    }
}

impl UniformSource for RngManager {
    fn next_uniform(&mut self) -> f64 {
        self.next_f64()
    }
}

/// Replays a fixed list of uniforms, cycling when exhausted
///
/// Handy for pinning service durations in scenarios:
/// `U = 1 - e^(-d/mean)` yields duration `d`.
///
/// # Example
/// ```
/// use smo_simulator_core_rs::rng::{ScriptedUniforms, UniformSource};
///
/// let mut source = ScriptedUniforms::new(vec![0.0, 0.5]);
/// assert_eq!(source.next_uniform(), 0.0);
/// assert_eq!(source.next_uniform(), 0.5);
/// assert_eq!(source.next_uniform(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedUniforms {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedUniforms {
    /// # Panics
    /// Panics if `values` is empty or any value lies outside `[0.0, 1.0)`
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "scripted uniforms must not be empty");
        assert!(
            values.iter().all(|v| (0.0..1.0).contains(v)),
            "scripted uniforms must lie in [0, 1)"
        );
        Self { values, cursor: 0 }
    }

    /// Script that produces exactly the given durations for the given mean
    pub fn for_durations(durations: &[f64], mean: f64) -> Self {
        let values = durations
            .iter()
            .map(|d| 1.0 - (-d / mean).exp())
            .collect();
        Self::new(values)
    }
}

impl UniformSource for ScriptedUniforms {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.cursor];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }
}
