mod engine;
mod plan;
mod session;

pub use engine::{Phase, Position, SessionState, TimerEngine};
pub use plan::{Plan, TimerField, TimerItem, DEFAULT_INTERVAL_SECS, DEFAULT_WORK_SECS};
pub use session::{MemoryStore, Session, StateStore};
