use repset_core::storage::{Config, Database};
use repset_core::{CuePlayer, NullCuePlayer, Session};

pub mod config;
pub mod plan;
pub mod stats;
pub mod timer;

/// Open the persisted session. The configured seed durations shape the
/// fallback plan when nothing usable was persisted.
fn open_session_with<C: CuePlayer>(
    cues: C,
) -> Result<Session<Database, C>, Box<dyn std::error::Error>> {
    let cfg = Config::load_or_default();
    let db = Database::open()?;
    Ok(Session::open_with_defaults(
        db,
        cues,
        cfg.timer.default_work,
        cfg.timer.default_interval,
    ))
}

/// Open the persisted session with no audio attached. One-shot
/// commands never cue; the foreground run loop wires its own player.
fn open_session() -> Result<Session<Database, NullCuePlayer>, Box<dyn std::error::Error>> {
    open_session_with(NullCuePlayer)
}
