//! Session clock and end-of-session statistics.
//!
//! The clock is the player's oxygen: it drains in real time and is topped
//! up by standing next to an active resource station. When it hits zero
//! the session is over and the stats are frozen.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{SCORE_STATION_TIME_PENALTY, SCORE_STRONG_ATTACK_PENALTY};
use crate::creature::TIMER_EPSILON;
use crate::engine::config::SessionConfig;
use crate::generation::LandType;

/// Remaining session time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClock {
    game_time: f32,
    remaining: f32,
    elapsed: f32,
    ended: bool,
}

impl SessionClock {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            game_time: config.game_time,
            remaining: config.game_time,
            elapsed: 0.0,
            ended: config.game_time <= 0.0,
        }
    }

    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Simulated seconds since the session started
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Fraction of the full clock left, for progress bars
    pub fn fraction_remaining(&self) -> f32 {
        if self.game_time <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.game_time).clamp(0.0, 1.0)
    }

    /// Advance by `dt`. Returns true on the tick the session ends.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.ended {
            return false;
        }
        self.elapsed += dt;
        self.remaining = (self.remaining - dt).max(0.0);
        if self.remaining < TIMER_EPSILON {
            self.remaining = 0.0;
            self.ended = true;
            info!(elapsed = self.elapsed, "session clock ran out");
            return true;
        }
        false
    }

    /// Add time back, never beyond the full clock. Returns the amount
    /// actually added.
    pub fn refill(&mut self, seconds: f32) -> f32 {
        if self.ended || seconds <= 0.0 {
            return 0.0;
        }
        let before = self.remaining;
        self.remaining = (self.remaining + seconds).min(self.game_time);
        self.remaining - before
    }
}

/// Counters shown on the results screen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    species_encountered: BTreeSet<u32>,
    land_types: BTreeSet<LandType>,
    strong_attacks: u32,
    station_time: f32,
    discovered: u32,
}

impl SessionStats {
    pub fn record_encounter(&mut self, species_id: u32) -> bool {
        self.species_encountered.insert(species_id)
    }

    pub fn record_strong_attack(&mut self) {
        self.strong_attacks += 1;
    }

    pub fn record_land_type(&mut self, land_type: LandType) {
        self.land_types.insert(land_type);
    }

    pub fn add_station_time(&mut self, seconds: f32) {
        self.station_time += seconds;
    }

    /// Species the player has registered in the (external) dex
    pub fn set_discovered(&mut self, count: u32) {
        self.discovered = count;
    }

    pub fn unique_species_encountered(&self) -> usize {
        self.species_encountered.len()
    }

    pub fn land_types_encountered(&self) -> usize {
        self.land_types.len()
    }

    pub fn strong_attacks(&self) -> u32 {
        self.strong_attacks
    }

    pub fn station_time(&self) -> f32 {
        self.station_time
    }

    pub fn discovered(&self) -> u32 {
        self.discovered
    }

    pub fn score(&self) -> f32 {
        let score = self.discovered as f32 + self.land_types.len() as f32
            - SCORE_STRONG_ATTACK_PENALTY * self.strong_attacks as f32
            - SCORE_STATION_TIME_PENALTY * self.station_time;
        score.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(game_time: f32) -> SessionClock {
        SessionClock::new(&SessionConfig { game_time })
    }

    #[test]
    fn test_clock_counts_down_and_ends_once() {
        let mut c = clock(1.0);
        assert!(!c.tick(0.5));
        assert!((c.remaining() - 0.5).abs() < 1e-6);
        assert!(c.tick(0.5));
        assert!(c.is_ended());
        assert!(!c.tick(0.5));
        assert_eq!(c.elapsed(), 1.0);
    }

    #[test]
    fn test_refill_caps_at_game_time() {
        let mut c = clock(10.0);
        c.tick(3.0);
        assert_eq!(c.refill(1.0), 1.0);
        assert_eq!(c.refill(5.0), 2.0);
        assert_eq!(c.remaining(), 10.0);
    }

    #[test]
    fn test_refill_after_end_is_ignored() {
        let mut c = clock(1.0);
        c.tick(2.0);
        assert_eq!(c.refill(5.0), 0.0);
        assert_eq!(c.remaining(), 0.0);
    }

    #[test]
    fn test_score() {
        let mut stats = SessionStats::default();
        stats.set_discovered(4);
        stats.record_land_type(LandType::GrassLand);
        stats.record_land_type(LandType::GrassLand);
        stats.record_land_type(LandType::FireLand);
        stats.record_strong_attack();
        stats.record_strong_attack();
        stats.add_station_time(50.0);
        // 4 + 2 - 1.0 - 0.5
        assert!((stats.score() - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_score_never_negative() {
        let mut stats = SessionStats::default();
        for _ in 0..10 {
            stats.record_strong_attack();
        }
        assert_eq!(stats.score(), 0.0);
    }

    #[test]
    fn test_encounters_are_unique() {
        let mut stats = SessionStats::default();
        assert!(stats.record_encounter(7));
        assert!(!stats.record_encounter(7));
        assert!(stats.record_encounter(8));
        assert_eq!(stats.unique_species_encountered(), 2);
    }
}
