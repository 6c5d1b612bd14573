//! Seeded random sampling of values inside a range.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution as _, Exp, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RejectedEdit;

/// Non-uniform draws that land outside the range are retried this many
/// times before being clamped.
const MAX_REDRAWS: usize = 16;

/// Source of values inside `[min, max]`.
pub trait Sampler {
    /// Draw a value in `[min, max]`. When `min == max` this is exactly `min`.
    fn sample(&mut self, min: f64, max: f64) -> f64;
}

/// Shape of the spread of sampled values across a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Distribution {
    /// Flat over `[min, max)`.
    #[default]
    Uniform,
    /// Centred on the range midpoint, with the range spanning six sigma.
    Normal,
    /// Decaying from `min`, with its mean at the range midpoint.
    Exponential,
}

impl Distribution {
    pub const ALL: [Distribution; 3] = [
        Distribution::Uniform,
        Distribution::Normal,
        Distribution::Exponential,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Distribution::Uniform => "Uniform",
            Distribution::Normal => "Normal",
            Distribution::Exponential => "Exponential",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Distribution {
    type Err = RejectedEdit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Distribution::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RejectedEdit::UnknownName {
                input: s.to_string(),
            })
    }
}

/// [`Sampler`] backed by a seeded [`StdRng`].
///
/// The seed is kept so a session can log it and be replayed later.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
    seed: u64,
    distribution: Distribution,
}

impl RandomSampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            distribution: Distribution::default(),
        }
    }

    /// Seed from the thread-local generator, for a fresh session.
    pub fn from_entropy() -> Self {
        let seed: u64 = rand::rng().random();
        info!("Seeding sampler with {}", seed);
        Self::seeded(seed)
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the sequence from `seed`. The distribution is kept.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = seed;
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn set_distribution(&mut self, distribution: Distribution) {
        self.distribution = distribution;
    }

    fn draw_bounded<D>(&mut self, dist: &D, offset: f64, min: f64, max: f64) -> f64
    where
        D: rand_distr::Distribution<f64>,
    {
        for _ in 0..MAX_REDRAWS {
            let value = offset + dist.sample(&mut self.rng);
            if (min..=max).contains(&value) {
                return value;
            }
        }
        (offset + dist.sample(&mut self.rng)).clamp(min, max)
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self, min: f64, max: f64) -> f64 {
        // Also covers min == max without touching the generator.
        if !(min < max) {
            return min;
        }

        let span = max - min;
        match self.distribution {
            Distribution::Uniform => self.rng.random_range(min..max),
            Distribution::Normal => match Normal::new(min + span / 2.0, span / 6.0) {
                Ok(normal) => self.draw_bounded(&normal, 0.0, min, max),
                Err(_) => self.rng.random_range(min..max),
            },
            Distribution::Exponential => match Exp::new(2.0 / span) {
                Ok(exp) => self.draw_bounded(&exp, min, min, max),
                Err(_) => self.rng.random_range(min..max),
            },
        }
    }
}
