//! # Repset Core Library
//!
//! Core business logic for the Repset interval-training timer. All
//! operations are available through a standalone CLI binary; any GUI is
//! a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Phase Engine**: a deterministic state machine over (plan,
//!   position) that the caller advances by dispatching one-second tick
//!   events
//! - **Plan Store**: the ordered list of timer definitions with
//!   validated mutation (add/remove/update/reorder)
//! - **Session**: owns the engine plus injected persistence and cue
//!   collaborators; persists the full state blob after every dispatch
//! - **Storage**: SQLite-backed key-value blob store and workout log,
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: the phase state machine
//! - [`Session`]: dispatch point wiring engine, store and cues
//! - [`Database`]: blob persistence and workout history
//! - [`Config`]: application configuration

pub mod cue;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use cue::{CueKind, CuePlayer, NullCuePlayer};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{Action, Event};
pub use storage::{Config, Database, WorkoutStats};
pub use timer::{
    MemoryStore, Phase, Plan, Position, Session, SessionState, StateStore, TimerEngine,
    TimerField, TimerItem,
};
