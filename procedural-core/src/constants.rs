//! Centralized game constants for the wilds procedural core.
//!
//! These are the defaults behind [`crate::engine::WildsConfig`]. Anything a
//! designer may want to tune is read through the config, never from here
//! directly, so tests can override it.

// =====================================================
// Creature classification
// =====================================================

/// Attack and special attack both below this => Weak
pub const WEAK_STAT_THRESHOLD: u32 = 50;

/// Attack or special attack strictly above this => Strong
pub const STRONG_STAT_THRESHOLD: u32 = 110;

/// Mean of attack and special attack at or above this => Curious, else Normal
pub const CURIOUS_MEAN_THRESHOLD: f32 = 75.0;

// =====================================================
// Creature behavior
// =====================================================

/// Radius inside which a Weak creature bolts
pub const FLEE_RANGE: f32 = 5.0;

/// Seconds a flee lasts before the creature settles into Normal
pub const FLEE_DURATION_SECS: f32 = 3.0;

/// Seconds of post-flee observation before a creature turns Weak again
pub const OBSERVATION_WINDOW_SECS: f32 = 4.0;

/// Radius inside which a Curious creature approaches the player
pub const CURIOSITY_RANGE: f32 = 10.0;

/// Remaining distance at which a Curious approach halts
pub const CURIOUS_STOPPING_DISTANCE: f32 = 2.0;

/// Radius a Strong creature defends
pub const TERRITORY_RANGE: f32 = 7.0;

/// Seconds of continuous intrusion before an expulsion
pub const ATTACK_THRESHOLD_SECS: f32 = 2.0;

/// Impulse magnitude applied to an expelled intruder
pub const THROW_OUT_FORCE: f32 = 15.0;

/// Gap left between an expelled creature's collider and the territory edge
pub const THROW_OUT_CLEARANCE: f32 = 1.0;

/// Value the player-detection timer resets to while the player is near
pub const PLAYER_DETECTION_MAX_SECS: f32 = 10.0;

/// Yaw turn rate toward the player (radians per second)
pub const TURN_RATE_RADIANS: f32 = std::f32::consts::PI;

/// Navigation speed (world units per second)
pub const CREATURE_MOVE_SPEED: f32 = 3.5;

// =====================================================
// World growth
// =====================================================

/// Radius used to decide whether a generation slot already has land
pub const LAND_CHECK_RADIUS: f32 = 6.0;

/// Player distance at which a generation slot grows a tile
pub const GENERATION_DISTANCE: f32 = 30.0;

/// Maximum number of live land tiles after a pruning pass
pub const MAX_LIVE_TILES: usize = 3;

/// Seconds between pruning checks
pub const PRUNE_INTERVAL_SECS: f32 = 1.0;

// =====================================================
// Resource stations
// =====================================================

/// Chance a new tile attempts to host a station
pub const STATION_PLACEMENT_PROBABILITY: f32 = 0.5;

/// Chance a placed station starts active
pub const STATION_ACTIVATION_PROBABILITY: f32 = 0.5;

/// Random points sampled before placement gives up
pub const STATION_MAX_SPAWN_ATTEMPTS: u32 = 10;

/// Height of a station above the tile's top surface
pub const STATION_HEIGHT_OFFSET: f32 = 1.0;

/// Clearance radius a candidate station point must keep free
pub const STATION_CLEARANCE_RADIUS: f32 = 0.75;

/// Radius around a station inside which the player refills
pub const STATION_INTERACTION_RADIUS: f32 = 2.5;

/// Seconds of session time restored per second spent at an active station
pub const STATION_REFILL_RATE: f32 = 1.0;

// =====================================================
// Session
// =====================================================

/// Starting session time in seconds (5 minutes)
pub const SESSION_GAME_TIME_SECS: f32 = 300.0;

/// Score penalty per expulsion of the player
pub const SCORE_STRONG_ATTACK_PENALTY: f32 = 0.5;

/// Score penalty per second spent refilling
pub const SCORE_STATION_TIME_PENALTY: f32 = 0.01;

// =====================================================
// Capture
// =====================================================

/// Base stat total mapped to the shortest capture time
pub const CAPTURE_MIN_TOTAL: f32 = 180.0;

/// Base stat span between shortest and longest capture time
pub const CAPTURE_TOTAL_SPAN: f32 = 540.0;

/// Shortest / longest capture time in seconds
pub const CAPTURE_TIME_MIN_SECS: f32 = 2.5;
pub const CAPTURE_TIME_MAX_SECS: f32 = 5.0;

// =====================================================
// Colliders
// =====================================================

/// Radius of the player's collider in the spatial index
pub const PLAYER_COLLIDER_RADIUS: f32 = 0.5;

/// Radius of a creature's collider in the spatial index
pub const CREATURE_COLLIDER_RADIUS: f32 = 0.5;

/// First id used for pre-placed land; generated tiles count up from 1
pub const STATIC_LAND_ID_BASE: u64 = 1 << 32;
