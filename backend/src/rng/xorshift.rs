//! xorshift64* random number generator
//!
//! Small, fast and fully deterministic: the same seed always yields the same
//! sequence, which is what makes a simulation run reproducible.

use serde::{Deserialize, Serialize};

/// Seeded xorshift64* generator
///
/// # Example
/// ```
/// use smo_simulator_core_rs::RngManager;
///
/// let mut a = RngManager::new(7);
/// let mut b = RngManager::new(7);
/// assert_eq!(a.next_f64(), b.next_f64());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a generator from a seed
    ///
    /// xorshift has a fixed point at zero, so a zero seed is replaced by 1.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Next raw 64-bit value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Next value in `[0.0, 1.0)` built from the top 53 bits
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Internal state, for checkpointing
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Resume from a checkpointed state
    pub fn from_state(state: u64) -> Self {
        Self::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        assert_eq!(RngManager::new(0).state(), 1);
    }

    #[test]
    fn test_next_f64_in_range() {
        let mut rng = RngManager::new(12345);
        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!((0.0..1.0).contains(&val), "value {} outside [0, 1)", val);
        }
    }

    #[test]
    fn test_state_roundtrip_continues_sequence() {
        let mut rng = RngManager::new(99);
        rng.next_u64();
        let mut resumed = RngManager::from_state(rng.state());
        assert_eq!(rng.next_u64(), resumed.next_u64());
    }
}
