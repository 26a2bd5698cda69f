//! Random source abstraction for the simulation.
//!
//! Every random branch (template choice, station placement, station
//! activation, species pick) draws from a `SimRng` handed in by the caller,
//! so a seeded `Xoshiro256StarStar` makes whole runs reproducible.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

/// Random number source used by the simulation
pub trait SimRng {
    /// Uniform f32 in [0.0, 1.0)
    fn gen_f32(&mut self) -> f32;

    /// Uniform index in [0, len). `len` must be non-zero.
    fn gen_index(&mut self, len: usize) -> usize;

    /// True with the given probability. 0.0 never fires, 1.0 always fires.
    fn check_probability(&mut self, probability: f32) -> bool {
        self.gen_f32() < probability
    }

    /// Uniform f32 in [min, max)
    fn gen_range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.gen_f32()
    }
}

impl<T: ?Sized + rand::Rng> SimRng for T {
    fn gen_f32(&mut self) -> f32 {
        rand::Rng::gen(self)
    }

    fn gen_index(&mut self, len: usize) -> usize {
        rand::Rng::gen_range(self, 0..len)
    }
}

/// The engine's deterministic generator
pub fn seeded(seed: u64) -> Xoshiro256StarStar {
    Xoshiro256StarStar::seed_from_u64(seed)
}

/// Replays a fixed sequence of values; for tests that need exact branches.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl SimRng for ScriptedRng {
    fn gen_f32(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }

    fn gen_index(&mut self, len: usize) -> usize {
        ((self.gen_f32() * len as f32) as usize).min(len.saturating_sub(1))
    }
}
