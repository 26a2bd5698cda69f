//! Simulation engine, integration layer
//!
//! [`WildsEngine`] owns the spatial index, the growth manager, the station
//! placer, every creature and the session clock, and advances them in a
//! fixed order once per tick:
//!
//!   session clock → player sync → growth (+ stations, + population)
//!     → pruning cadence → creatures by ascending id → station refill
//!
//! Hosts either drive it directly (`tick(dt, player)`) or through
//! [`WildsPlugin`], which runs it inside a bevy `App`.

pub mod config;
pub mod messages;
pub mod plugin;
pub mod simulation;

pub use config::{ConfigError, WarningResetPolicy, WildsConfig};
pub use messages::*;
pub use plugin::{WarningCueEvent, WildsEngineResource, WildsPlayer, WildsPlugin, WildsSimEvent};
pub use simulation::{WildsEngine, WorldDefinition};

// =====================================================
// Tests
// =====================================================
