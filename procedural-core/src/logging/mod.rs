//! Structured logging.
//!
//! The core logs through `tracing` macros only. This module decides where
//! the records go: one compact `fmt` subscriber with a level per subsystem,
//! installed once per process. `RUST_LOG` overrides the config.

use std::str::FromStr;
use std::sync::Once;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Installs the tracing subscriber when added to an `App`
#[derive(Default)]
pub struct LoggingPlugin {
    pub config: TracingConfig,
}

impl LoggingPlugin {
    /// Debug output for creatures and growth, info elsewhere
    pub fn verbose() -> Self {
        Self {
            config: TracingConfig::default()
                .with_level(Subsystem::Creature, LogLevel::Debug)
                .with_level(Subsystem::Generation, LogLevel::Debug),
        }
    }
}

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_tracing(&self.config);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| format!("unknown log level '{name}'"))
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Parts of the core that can be filtered separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subsystem {
    Creature,
    Generation,
    Engine,
    Session,
}

impl Subsystem {
    pub const ALL: [Subsystem; 4] = [
        Subsystem::Creature,
        Subsystem::Generation,
        Subsystem::Engine,
        Subsystem::Session,
    ];

    /// `tracing` target prefix of the subsystem's module
    pub fn target(&self) -> &'static str {
        match self {
            Subsystem::Creature => "wilds_core::creature",
            Subsystem::Generation => "wilds_core::generation",
            Subsystem::Engine => "wilds_core::engine",
            Subsystem::Session => "wilds_core::session",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Level for everything outside the core, bevy included
    pub default_level: LogLevel,
    pub creature: LogLevel,
    pub generation: LogLevel,
    pub engine: LogLevel,
    pub session: LogLevel,
    pub show_targets: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Warn,
            creature: LogLevel::Info,
            generation: LogLevel::Info,
            engine: LogLevel::Info,
            session: LogLevel::Info,
            show_targets: true,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    pub fn level(&self, subsystem: Subsystem) -> LogLevel {
        match subsystem {
            Subsystem::Creature => self.creature,
            Subsystem::Generation => self.generation,
            Subsystem::Engine => self.engine,
            Subsystem::Session => self.session,
        }
    }

    pub fn with_level(mut self, subsystem: Subsystem, level: LogLevel) -> Self {
        let slot = match subsystem {
            Subsystem::Creature => &mut self.creature,
            Subsystem::Generation => &mut self.generation,
            Subsystem::Engine => &mut self.engine,
            Subsystem::Session => &mut self.session,
        };
        *slot = level;
        self
    }

    /// `EnvFilter` directive string, e.g. `warn,wilds_core::creature=debug`
    pub fn directives(&self) -> String {
        std::iter::once(self.default_level.as_str().to_string())
            .chain(
                Subsystem::ALL
                    .iter()
                    .map(|s| format!("{}={}", s.target(), self.level(*s).as_str())),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

static TRACING_INIT: Once = Once::new();

/// Install the subscriber with `TracingConfig::default()`
pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Install the global subscriber. The first call in a process wins.
pub fn init_tracing(config: &TracingConfig) {
    let directives = config.directives();
    let (show_targets, show_file_line) = (config.show_targets, config.show_file_line);
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(show_targets)
            .with_file(show_file_line)
            .with_line_number(show_file_line)
            .compact();

        // bevy's LogPlugin may have set one already
        let _ = subscriber.try_init();
    });
}

/// Span covering one engine tick; records inside carry the tick number
pub fn tick_span(tick: u64, dt: f32) -> tracing::span::EnteredSpan {
    tracing::debug_span!(target: "wilds_core::engine", "tick", tick, dt).entered()
}
