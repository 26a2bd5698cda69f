//! Weird Wilds - Procedural Core Library
//!
//! Deterministic simulation core for an exploration game where land grows
//! around the player and wild creatures react to them:
//! - Creature behavior state machine (Weak / Normal / Curious / Strong)
//! - Territory defence for Strong creatures (warn, then throw out)
//! - World growth from generation slots, farthest-first pruning
//! - Resource (oxygen) station placement and the session clock
//! - Session statistics and score
//! - Bevy plugin wiring the core into an `App`

pub mod constants;
pub mod creature;
pub mod engine;
pub mod generation;
pub mod logging;
pub mod rng;
pub mod session;
pub mod spatial;

pub use creature::{BehaviorState, Creature, CreatureStateMachine, CreatureStats};
pub use engine::{SimEvent, SimWarning, WildsConfig, WildsEngine, WildsPlugin, WorldDefinition};
pub use generation::{LandTile, WorldGrowthManager};
pub use spatial::{EntityKind, EntityRef};
