//! Phase engine implementation.
//!
//! The engine is a deterministic state machine over (plan, position),
//! advanced by one-second tick events. It owns no threads and no clock:
//! the caller drives it by dispatching `Tick` once per second while
//! running, and `NextPhase` when it observes an exhausted phase.
//!
//! ## Phase transitions
//!
//! ```text
//! Work(t,s) -> Interval(t,s) -> Work(t,s+1)
//!                            -> Work(t+1,0)
//!                            -> Finished
//! Work(t,s) -> Finished          (last set of the last timer)
//! ```
//!
//! Every handler is total: a disallowed transition returns the state
//! unchanged and produces no event.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::plan::{Plan, TimerField, TimerItem, DEFAULT_INTERVAL_SECS, DEFAULT_WORK_SECS};
use crate::error::ValidationError;
use crate::events::{Action, Event};

/// Segment kind of a timer's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Interval,
}

/// The engine's execution cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default)]
    pub current_timer_index: usize,
    /// Older payloads predate set tracking.
    #[serde(default)]
    pub current_set_index: usize,
    #[serde(default)]
    pub is_interval: bool,
    /// Seconds left in the current phase, counts down to 0.
    #[serde(default)]
    pub remaining_time: u32,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub is_finished: bool,
}

impl Position {
    /// Cursor at the untouched start of a plan.
    pub fn start_of(plan: &Plan) -> Self {
        Self {
            current_timer_index: 0,
            current_set_index: 0,
            is_interval: false,
            remaining_time: plan.timers.first().map(|t| t.work_duration).unwrap_or(0),
            is_running: false,
            is_finished: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_interval {
            Phase::Interval
        } else {
            Phase::Work
        }
    }
}

/// Plan + position, persisted as one JSON blob after every dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(flatten)]
    pub plan: Plan,
    #[serde(flatten)]
    pub position: Position,
}

impl SessionState {
    pub fn with_plan(plan: Plan) -> Self {
        let position = Position::start_of(&plan);
        Self { plan, position }
    }

    /// The default single-item plan used when nothing was persisted.
    pub fn default_state() -> Self {
        Self::with_plan(Plan::single(DEFAULT_WORK_SECS, DEFAULT_INTERVAL_SECS))
    }

    /// Deserialize a persisted blob and bring it back into a consistent
    /// shape: never running on load, indices clamped into range, items
    /// without a set count migrated.
    pub fn restore(blob: &str) -> Result<Self, serde_json::Error> {
        let mut state: SessionState = serde_json::from_str(blob)?;
        state.position.is_running = false;
        state.normalize();
        Ok(state)
    }

    /// Re-establish the position invariants against the current plan.
    pub fn normalize(&mut self) {
        if self.plan.timers.is_empty() {
            *self = Self::default_state();
            return;
        }
        let last = self.plan.timers.len() - 1;
        if self.position.current_timer_index > last {
            self.position.current_timer_index = last;
        }
        let sets = self.plan.timers[self.position.current_timer_index].sets.max(1) as usize;
        if self.position.current_set_index >= sets {
            self.position.current_set_index = sets - 1;
        }
        if self.position.is_finished {
            self.position.is_running = false;
        }
    }

    /// Structural checks for imported state. Load-time migration is
    /// lenient; an explicit import is not.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.plan.timers.is_empty() {
            return Err(ValidationError::EmptyCollection("plan.timers".into()));
        }
        for item in &self.plan.timers {
            if item.work_duration == 0 {
                return Err(ValidationError::InvalidValue {
                    field: "workDuration".into(),
                    message: format!("must be positive (timer {})", item.id),
                });
            }
            if item.sets == 0 {
                return Err(ValidationError::InvalidValue {
                    field: "sets".into(),
                    message: format!("must be at least 1 (timer {})", item.id),
                });
            }
        }
        Ok(())
    }

    /// Seconds of the plan already behind the cursor.
    fn elapsed_secs(&self) -> u64 {
        if self.position.is_finished {
            return self.plan.total_secs();
        }
        let idx = self.position.current_timer_index;
        let mut elapsed: u64 = self
            .plan
            .timers
            .iter()
            .take(idx)
            .map(|t| t.sets as u64 * t.set_secs())
            .sum();
        let Some(item) = self.plan.timers.get(idx) else {
            return elapsed;
        };
        elapsed += self.position.current_set_index as u64 * item.set_secs();
        let remaining = self.position.remaining_time as u64;
        if self.position.is_interval {
            elapsed += item.work_duration as u64;
            elapsed += (item.interval_duration as u64).saturating_sub(remaining);
        } else {
            elapsed += (item.work_duration as u64).saturating_sub(remaining);
        }
        elapsed
    }

    /// 0.0 .. 100.0 progress across the entire plan.
    pub fn plan_progress_pct(&self) -> f64 {
        let total = self.plan.total_secs();
        if total == 0 {
            return 0.0;
        }
        (self.elapsed_secs() as f64 / total as f64 * 100.0).min(100.0)
    }
}

/// Core phase engine.
///
/// One synchronous dispatch point; the caller serializes all events
/// through [`TimerEngine::apply`].
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: SessionState,
}

impl TimerEngine {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_item(&self) -> Option<&TimerItem> {
        self.state
            .plan
            .timers
            .get(self.state.position.current_timer_index)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let pos = &self.state.position;
        let idx = pos.current_timer_index;
        let item = self.current_item();
        let total_secs = match (item, pos.is_finished) {
            (_, true) | (None, _) => 0,
            (Some(item), false) => match pos.phase() {
                Phase::Work => item.work_duration,
                Phase::Interval => item.interval_duration,
            },
        };
        Event::StateSnapshot {
            is_running: pos.is_running,
            is_finished: pos.is_finished,
            phase: pos.phase(),
            timer_index: idx,
            set_index: pos.current_set_index,
            timer_label: item.map(|i| i.label(idx)).unwrap_or_default(),
            remaining_secs: pos.remaining_time,
            total_secs,
            plan_progress_pct: self.state.plan_progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Apply one action. Returns the produced event, if any.
    pub fn apply(&mut self, action: Action) -> Option<Event> {
        match action {
            Action::Start => self.start(),
            Action::Stop => self.stop(),
            Action::Reset => self.reset(),
            Action::Tick => self.tick(),
            Action::NextPhase => self.next_phase(),
            Action::AddTimer => self.add_timer(),
            Action::RemoveTimer { id } => self.remove_timer(&id),
            Action::UpdateTimer { id, fields } => self.update_timer(&id, fields),
            Action::SetDefaultInterval { secs } => self.set_default_interval(secs),
            Action::ReorderTimer {
                source_index,
                destination_index,
            } => self.reorder_timer(source_index, destination_index),
            Action::LoadState { state } => self.load_state(*state),
        }
    }

    // ── Transport ────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let pos = &mut self.state.position;
        if pos.is_finished || pos.is_running {
            return None;
        }
        pos.is_running = true;
        Some(Event::TimerStarted {
            timer_index: pos.current_timer_index,
            set_index: pos.current_set_index,
            phase: pos.phase(),
            remaining_secs: pos.remaining_time,
            at: Utc::now(),
        })
    }

    pub fn stop(&mut self) -> Option<Event> {
        let pos = &mut self.state.position;
        if !pos.is_running {
            return None;
        }
        pos.is_running = false;
        Some(Event::TimerPaused {
            remaining_secs: pos.remaining_time,
            at: Utc::now(),
        })
    }

    /// Back to the untouched start of the plan. The plan itself is kept.
    pub fn reset(&mut self) -> Option<Event> {
        self.state.position = Position::start_of(&self.state.plan);
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// One second elapsed. A no-op unless running; an exhausted phase is
    /// left at 0 for `next_phase`, so exactly one cue fires per
    /// exhaustion.
    pub fn tick(&mut self) -> Option<Event> {
        let pos = &mut self.state.position;
        if !pos.is_running {
            return None;
        }
        if pos.remaining_time > 0 {
            pos.remaining_time -= 1;
        }
        None
    }

    /// Perform the phase transition for an exhausted phase.
    ///
    /// The driver fires this when it observes `running && remaining == 0`.
    /// A zero-length phase is entered and exhausted within the same
    /// scheduler second, since the exhaustion check re-fires immediately.
    pub fn next_phase(&mut self) -> Option<Event> {
        if self.state.position.is_finished {
            return None;
        }
        let SessionState { plan, position } = &mut self.state;
        let t = position.current_timer_index;
        let item = plan.timers.get(t)?;
        let at = Utc::now();

        if position.is_interval {
            // Interval exhausted: next set, next timer, or done.
            if position.current_set_index + 1 < item.sets as usize {
                position.is_interval = false;
                position.current_set_index += 1;
                position.remaining_time = item.work_duration;
                return Some(Event::PhaseAdvanced {
                    timer_index: t,
                    set_index: position.current_set_index,
                    phase: Phase::Work,
                    duration_secs: item.work_duration,
                    at,
                });
            }
            let Some(next_item) = plan.timers.get(t + 1) else {
                return Some(Self::finish(position));
            };
            position.is_interval = false;
            position.current_timer_index = t + 1;
            position.current_set_index = 0;
            position.remaining_time = next_item.work_duration;
            Some(Event::PhaseAdvanced {
                timer_index: t + 1,
                set_index: 0,
                phase: Phase::Work,
                duration_secs: next_item.work_duration,
                at,
            })
        } else {
            // Work exhausted. The final set of the final timer finishes
            // outright; there is no trailing interval.
            let is_last_set = position.current_set_index + 1 >= item.sets as usize;
            let is_last_timer = t + 1 >= plan.timers.len();
            if is_last_set && is_last_timer {
                return Some(Self::finish(position));
            }
            position.is_interval = true;
            position.remaining_time = item.interval_duration;
            Some(Event::PhaseAdvanced {
                timer_index: t,
                set_index: position.current_set_index,
                phase: Phase::Interval,
                duration_secs: item.interval_duration,
                at,
            })
        }
    }

    fn finish(position: &mut Position) -> Event {
        position.is_finished = true;
        position.is_running = false;
        position.remaining_time = 0;
        Event::WorkoutFinished { at: Utc::now() }
    }

    // ── Plan edits ───────────────────────────────────────────────────

    pub fn add_timer(&mut self) -> Option<Event> {
        self.state.plan.add_timer();
        None
    }

    /// Remove a timer. The last remaining item stays put. Removing the
    /// active item snaps the cursor to the item now occupying its slot,
    /// at the untouched start of its work phase.
    pub fn remove_timer(&mut self, id: &str) -> Option<Event> {
        let was_active = self
            .state
            .plan
            .index_of(id)
            .is_some_and(|idx| idx == self.state.position.current_timer_index);
        let removed = self.state.plan.remove_timer(id)?;

        let SessionState { plan, position } = &mut self.state;
        if was_active {
            let idx = position.current_timer_index.min(plan.timers.len() - 1);
            position.current_timer_index = idx;
            position.current_set_index = 0;
            position.is_interval = false;
            position.remaining_time = plan.timers[idx].work_duration;
        } else if removed < position.current_timer_index {
            position.current_timer_index -= 1;
        }
        None
    }

    /// Merge edit fields into the matching timer.
    ///
    /// When the active item is edited while paused and the remaining
    /// time still equals the old value of the edited field for the
    /// matching phase, the display is resynced to the new value. A
    /// phase the user already let tick down is never clobbered.
    pub fn update_timer(&mut self, id: &str, fields: Vec<TimerField>) -> Option<Event> {
        let idx = self.state.plan.index_of(id)?;
        let item = &self.state.plan.timers[idx];
        let old_work = item.work_duration;
        let old_interval = item.interval_duration;

        let mut new_work = None;
        let mut new_interval = None;
        for field in fields {
            match field {
                TimerField::WorkDuration(secs) => new_work = Some(secs),
                TimerField::IntervalDuration(secs) => new_interval = Some(secs),
                _ => {}
            }
            self.state.plan.timers[idx].apply(field);
        }

        let SessionState { plan, position } = &mut self.state;
        let item = &plan.timers[idx];
        let active = idx == position.current_timer_index;
        if active && !position.is_running {
            if !position.is_interval {
                if let Some(secs) = new_work {
                    if position.remaining_time == old_work {
                        position.remaining_time = secs;
                    }
                }
            } else if let Some(secs) = new_interval {
                if position.remaining_time == old_interval {
                    position.remaining_time = secs;
                }
            }
        }
        // Shrinking the set count below the cursor would break the
        // position invariant.
        if active && position.current_set_index >= item.sets.max(1) as usize {
            position.current_set_index = item.sets.max(1) as usize - 1;
        }
        None
    }

    pub fn set_default_interval(&mut self, secs: u32) -> Option<Event> {
        self.state.plan.default_interval = secs;
        None
    }

    /// Move a timer to a new slot. The active timer keeps its identity
    /// across the move, not its index.
    pub fn reorder_timer(&mut self, source: usize, destination: usize) -> Option<Event> {
        let active_id = self.current_item().map(|t| t.id.clone());
        if !self.state.plan.reorder_timer(source, destination) {
            return None;
        }
        if let Some(idx) = active_id.and_then(|id| self.state.plan.index_of(&id)) {
            self.state.position.current_timer_index = idx;
        }
        None
    }

    /// Replace the entire session state atomically.
    pub fn load_state(&mut self, state: SessionState) -> Option<Event> {
        self.state = state;
        Some(Event::StateLoaded { at: Utc::now() })
    }
}
