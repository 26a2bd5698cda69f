use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Failure to load or validate a [`WildsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// When a Strong creature's warning timer returns to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WarningResetPolicy {
    /// Cleared right after an expulsion lands, so a returning intruder
    /// starts a fresh episode with a fresh warning cue.
    #[default]
    OnExpulsion,
    /// Cleared only while no intruder is in range. An intruder that stays
    /// in range after being thrown is expelled again on reacquisition.
    OnAbsence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureTuning {
    pub flee_range: f32,
    pub flee_duration: f32,
    pub observation_window: f32,
    pub curiosity_range: f32,
    pub stopping_distance: f32,
    pub territory_range: f32,
    pub attack_threshold: f32,
    pub throw_out_force: f32,
    pub player_detection_max: f32,
    pub turn_rate: f32,
    pub move_speed: f32,
    pub warning_reset: WarningResetPolicy,
}

impl Default for CreatureTuning {
    fn default() -> Self {
        Self {
            flee_range: FLEE_RANGE,
            flee_duration: FLEE_DURATION_SECS,
            observation_window: OBSERVATION_WINDOW_SECS,
            curiosity_range: CURIOSITY_RANGE,
            stopping_distance: CURIOUS_STOPPING_DISTANCE,
            territory_range: TERRITORY_RANGE,
            attack_threshold: ATTACK_THRESHOLD_SECS,
            throw_out_force: THROW_OUT_FORCE,
            player_detection_max: PLAYER_DETECTION_MAX_SECS,
            turn_rate: TURN_RATE_RADIANS,
            move_speed: CREATURE_MOVE_SPEED,
            warning_reset: WarningResetPolicy::default(),
        }
    }
}

impl CreatureTuning {
    /// Largest of the three detection radii
    pub fn max_detection_range(&self) -> f32 {
        self.flee_range
            .max(self.curiosity_range)
            .max(self.territory_range)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    pub weak_threshold: u32,
    pub strong_threshold: u32,
    pub curious_mean: f32,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            weak_threshold: WEAK_STAT_THRESHOLD,
            strong_threshold: STRONG_STAT_THRESHOLD,
            curious_mean: CURIOUS_MEAN_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub land_check_radius: f32,
    pub generation_distance: f32,
    pub max_live_tiles: usize,
    pub prune_interval: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            land_check_radius: LAND_CHECK_RADIUS,
            generation_distance: GENERATION_DISTANCE,
            max_live_tiles: MAX_LIVE_TILES,
            prune_interval: PRUNE_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub placement_probability: f32,
    pub activation_probability: f32,
    pub max_spawn_attempts: u32,
    pub height_offset: f32,
    pub clearance_radius: f32,
    pub interaction_radius: f32,
    pub refill_rate: f32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            placement_probability: STATION_PLACEMENT_PROBABILITY,
            activation_probability: STATION_ACTIVATION_PROBABILITY,
            max_spawn_attempts: STATION_MAX_SPAWN_ATTEMPTS,
            height_offset: STATION_HEIGHT_OFFSET,
            clearance_radius: STATION_CLEARANCE_RADIUS,
            interaction_radius: STATION_INTERACTION_RADIUS,
            refill_rate: STATION_REFILL_RATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub game_time: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game_time: SESSION_GAME_TIME_SECS,
        }
    }
}

/// Complete tuning for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WildsConfig {
    pub seed: u64,
    pub creatures: CreatureTuning,
    pub classification: ClassificationThresholds,
    pub growth: GrowthConfig,
    pub stations: StationConfig,
    pub session: SessionConfig,
}

impl Default for WildsConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            creatures: CreatureTuning::default(),
            classification: ClassificationThresholds::default(),
            growth: GrowthConfig::default(),
            stations: StationConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl WildsConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.creatures;
        let non_negative = [
            ("creatures.flee_range", c.flee_range),
            ("creatures.flee_duration", c.flee_duration),
            ("creatures.observation_window", c.observation_window),
            ("creatures.curiosity_range", c.curiosity_range),
            ("creatures.stopping_distance", c.stopping_distance),
            ("creatures.territory_range", c.territory_range),
            ("creatures.attack_threshold", c.attack_threshold),
            ("creatures.throw_out_force", c.throw_out_force),
            ("creatures.player_detection_max", c.player_detection_max),
            ("creatures.turn_rate", c.turn_rate),
            ("creatures.move_speed", c.move_speed),
            ("growth.land_check_radius", self.growth.land_check_radius),
            ("growth.generation_distance", self.growth.generation_distance),
            ("growth.prune_interval", self.growth.prune_interval),
            ("stations.height_offset", self.stations.height_offset),
            ("stations.clearance_radius", self.stations.clearance_radius),
            ("stations.interaction_radius", self.stations.interaction_radius),
            ("stations.refill_rate", self.stations.refill_rate),
            ("session.game_time", self.session.game_time),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }

        let probabilities = [
            (
                "stations.placement_probability",
                self.stations.placement_probability,
            ),
            (
                "stations.activation_probability",
                self.stations.activation_probability,
            ),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1] (got {p})"
                )));
            }
        }

        if self.growth.max_live_tiles == 0 {
            return Err(ConfigError::Invalid(
                "growth.max_live_tiles must be at least 1".into(),
            ));
        }

        let t = &self.classification;
        if t.weak_threshold > t.strong_threshold {
            return Err(ConfigError::Invalid(format!(
                "classification.weak_threshold ({}) exceeds strong_threshold ({})",
                t.weak_threshold, t.strong_threshold
            )));
        }

        Ok(())
    }
}
