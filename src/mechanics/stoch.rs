/// Stochastic mechanics: an owned, seedable random stream and the draws the
/// meal generator needs.
///
/// Every draw consumes the stream in a fixed order, so a seed reproduces the
/// same sequence on every run.
use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};

/// Rejection attempts before a truncated draw falls back to clamping.
pub const TRUNC_MAX_ATTEMPTS: usize = 1000;

/// Uniform in [0, 1) from the top 53 bits of one `u64`.
#[inline]
pub fn uniform01(rng: &mut WyRand) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Gaussian(0,1) via Box–Muller, two uniforms per draw.
#[inline]
pub fn gaussian01(rng: &mut WyRand) -> f64 {
    // 1 - u lies in (0, 1], keeping ln finite.
    let u1 = 1.0 - uniform01(rng);
    let u2 = uniform01(rng);
    let r = (-2.0 * u1.ln()).sqrt();
    let t = 2.0 * std::f64::consts::PI * u2;
    r * t.cos()
}

/// Bernoulli(p): one uniform, true when it falls below `p`.
#[inline]
pub fn bernoulli(rng: &mut WyRand, p: f64) -> bool {
    uniform01(rng) < p.clamp(0.0, 1.0)
}

/// Normal(mean, sd). A zero sd returns `mean` without drawing.
#[inline]
pub fn normal(rng: &mut WyRand, mean: f64, sd: f64) -> f64 {
    if sd > 0.0 {
        mean + sd * gaussian01(rng)
    } else {
        mean
    }
}

/// Normal(mean, sd) restricted to [lo, hi] by rejection.
///
/// A zero sd returns the clamped mean without drawing. After
/// [`TRUNC_MAX_ATTEMPTS`] misses the last draw is clamped into range.
pub fn truncated_normal(rng: &mut WyRand, mean: f64, sd: f64, lo: f64, hi: f64) -> f64 {
    if !(sd > 0.0) {
        return mean.clamp(lo, hi);
    }
    let mut x = mean;
    for _ in 0..TRUNC_MAX_ATTEMPTS {
        x = mean + sd * gaussian01(rng);
        if (lo..=hi).contains(&x) {
            return x;
        }
    }
    x.clamp(lo, hi)
}

/// A random stream owned by exactly one consumer, remembering its seed.
pub struct RandomStream {
    seed: u64,
    rng: WyRand,
}

impl std::fmt::Debug for RandomStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomStream").field("seed", &self.seed).finish_non_exhaustive()
    }
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        Self { seed, rng: WyRand::from_seed(seed.to_le_bytes()) }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewind to the start of the seeded sequence.
    pub fn rewind(&mut self) {
        self.rng = WyRand::from_seed(self.seed.to_le_bytes());
    }

    pub fn uniform01(&mut self) -> f64 {
        uniform01(&mut self.rng)
    }

    pub fn bernoulli(&mut self, p: f64) -> bool {
        bernoulli(&mut self.rng, p)
    }

    pub fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        normal(&mut self.rng, mean, sd)
    }

    pub fn truncated_normal(&mut self, mean: f64, sd: f64, lo: f64, hi: f64) -> f64 {
        truncated_normal(&mut self.rng, mean, sd, lo, hi)
    }
}
