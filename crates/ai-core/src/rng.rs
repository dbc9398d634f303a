/// Deterministic RNG helpers.
///
/// This is intentionally small and dependency-free. It is **not** cryptographic.

pub trait DeterministicRng {
    fn next_u64(&mut self) -> u64;

    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_f32_unit(&mut self) -> f32 {
        // 24 bits of mantissa -> [0, 1)
        let x = self.next_u32() >> 8;
        (x as f32) / ((1u32 << 24) as f32)
    }

    /// Uniform sample in `[min, max]`. Returns `min` when the range is empty.
    fn next_f32_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f32_unit()
    }

    /// Roll a randomized duration `base ± spread`, clamped so it never goes negative.
    ///
    /// The result always lies in `[max(0, base - spread), base + spread]`.
    fn roll_duration(&mut self, base: f32, spread: f32) -> f32 {
        let spread = spread.abs();
        let min = (base - spread).max(0.0);
        let max = (base + spread).max(min);
        if spread <= 0.0 {
            return min;
        }
        self.next_f32_range(min, max).clamp(min, max)
    }
}

/// SplitMix64: good seeding RNG and small deterministic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn step(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl Default for SplitMix64 {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.step()
    }
}

pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

/// Derive an independent stream seed for one agent.
pub fn derive_seed(global_seed: u64, agent_id: u64, stream: u64) -> u64 {
    let x = global_seed ^ mix64(agent_id.wrapping_add(0x9E3779B97F4A7C15)) ^ mix64(stream);
    mix64(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_duration_stays_in_clamped_range() {
        let mut rng = SplitMix64::new(7);
        for _ in 0..1000 {
            let v = rng.roll_duration(0.5, 1.0);
            assert!((0.0..=1.5).contains(&v), "{v}");
        }
    }

    #[test]
    fn roll_duration_without_spread_is_exact() {
        let mut rng = SplitMix64::new(7);
        assert_eq!(rng.roll_duration(2.0, 0.0), 2.0);
        assert_eq!(rng.roll_duration(-1.0, 0.0), 0.0);
    }

    #[test]
    fn derived_seeds_differ_per_agent() {
        assert_ne!(derive_seed(1, 1, 0), derive_seed(1, 2, 0));
        assert_eq!(derive_seed(1, 1, 0), derive_seed(1, 1, 0));
    }
}
