use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cue::CueKind;
use crate::timer::{Phase, SessionState, TimerField};

/// The full action surface of the engine.
///
/// All events (ticks, transport, edits) are serialized through one
/// dispatch point; no two actions are ever processed concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    Start,
    Stop,
    Reset,
    Tick,
    NextPhase,
    AddTimer,
    RemoveTimer { id: String },
    UpdateTimer { id: String, fields: Vec<TimerField> },
    SetDefaultInterval { secs: u32 },
    ReorderTimer { source_index: usize, destination_index: usize },
    LoadState { state: Box<SessionState> },
}

/// Every noteworthy state change produces an Event.
///
/// The CLI prints them as JSON; the session maps them to cues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        timer_index: usize,
        set_index: usize,
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// A phase was exhausted and the cursor moved into the next one.
    PhaseAdvanced {
        timer_index: usize,
        set_index: usize,
        phase: Phase,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// The final work phase of the final timer was exhausted.
    WorkoutFinished {
        at: DateTime<Utc>,
    },
    StateLoaded {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        is_running: bool,
        is_finished: bool,
        phase: Phase,
        timer_index: usize,
        set_index: usize,
        timer_label: String,
        remaining_secs: u32,
        total_secs: u32,
        plan_progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Cue to play for this event, if any. Exactly one cue fires per
    /// phase exhaustion.
    pub fn cue(&self) -> Option<CueKind> {
        match self {
            Event::PhaseAdvanced { .. } | Event::WorkoutFinished { .. } => Some(CueKind::Finish),
            _ => None,
        }
    }
}
