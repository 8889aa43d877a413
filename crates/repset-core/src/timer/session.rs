//! The owned session: engine plus injected collaborators.
//!
//! A [`Session`] is constructed once at startup and holds the whole
//! mutable world: the engine state, the persistence seam and the cue
//! seam. After every dispatched action it writes the full state blob
//! and hands the produced cue, if any, to the player. There are no
//! globals; lifecycle is explicit construct/drop.

use std::cell::RefCell;

use super::engine::{SessionState, TimerEngine};
use super::plan::{Plan, DEFAULT_INTERVAL_SECS, DEFAULT_WORK_SECS};
use crate::cue::CuePlayer;
use crate::error::{CoreError, Result};
use crate::events::{Action, Event};

/// Opaque string-blob persistence seam.
///
/// The session treats the medium as a single-key value store; a write
/// is always a full-state overwrite.
pub trait StateStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, blob: &str) -> Result<()>;
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RefCell::new(Some(blob.into())),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.borrow().clone())
    }

    fn save(&self, blob: &str) -> Result<()> {
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}

/// Session state plus its collaborators, behind one dispatch point.
pub struct Session<S: StateStore, C: CuePlayer> {
    engine: TimerEngine,
    store: S,
    cues: C,
}

impl<S: StateStore, C: CuePlayer> Session<S, C> {
    /// Load the persisted state, or fall back to the default
    /// single-item plan. A missing or corrupt blob is the one
    /// recoverable error path.
    pub fn open(store: S, cues: C) -> Self {
        Self::open_with_defaults(store, cues, DEFAULT_WORK_SECS, DEFAULT_INTERVAL_SECS)
    }

    /// Same as [`Session::open`], with configured seed durations for
    /// the synthesized fallback plan.
    pub fn open_with_defaults(store: S, cues: C, work_secs: u32, interval_secs: u32) -> Self {
        let fallback = || SessionState::with_plan(Plan::single(work_secs.max(1), interval_secs));
        let state = match store.load() {
            Ok(Some(blob)) => SessionState::restore(&blob).unwrap_or_else(|_| fallback()),
            Ok(None) | Err(_) => fallback(),
        };
        Self {
            engine: TimerEngine::new(state),
            store,
            cues,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.engine.state()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    /// Apply one action, persist the result, and sound the cue the
    /// produced event calls for. Playback never fails the dispatch.
    pub fn dispatch(&mut self, action: Action) -> Result<Option<Event>> {
        let event = self.engine.apply(action);
        self.persist()?;
        if let Some(kind) = event.as_ref().and_then(Event::cue) {
            self.cues.play(kind);
        }
        Ok(event)
    }

    /// One scheduler second: tick, then advance through every phase
    /// the tick exhausted. A zero-length phase is entered and passed
    /// within the same call, one cue per exhaustion.
    pub fn advance_second(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        if !self.state().position.is_running {
            return Ok(events);
        }
        if let Some(event) = self.dispatch(Action::Tick)? {
            events.push(event);
        }
        while self.state().position.is_running && self.state().position.remaining_time == 0 {
            match self.dispatch(Action::NextPhase)? {
                Some(event) => events.push(event),
                None => break,
            }
        }
        Ok(events)
    }

    fn persist(&self) -> Result<()> {
        let blob = serde_json::to_string(self.engine.state()).map_err(CoreError::from)?;
        self.store.save(&blob)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::cue::{CueKind, NullCuePlayer};
    use crate::timer::plan::{Plan, TimerField};
    use crate::timer::Phase;

    #[derive(Default)]
    struct CountingCuePlayer {
        finishes: Cell<u32>,
        beeps: Cell<u32>,
    }

    impl CuePlayer for CountingCuePlayer {
        fn play(&self, kind: CueKind) {
            match kind {
                CueKind::Finish => self.finishes.set(self.finishes.get() + 1),
                CueKind::Beep => self.beeps.set(self.beeps.get() + 1),
            }
        }
    }

    fn session_with(plan: Plan) -> Session<MemoryStore, CountingCuePlayer> {
        let store = MemoryStore::with_blob(
            serde_json::to_string(&SessionState::with_plan(plan)).unwrap(),
        );
        Session::open(store, CountingCuePlayer::default())
    }

    #[test]
    fn open_without_blob_yields_default_plan() {
        let session = Session::open(MemoryStore::new(), NullCuePlayer);
        let state = session.state();
        assert_eq!(state.plan.timers.len(), 1);
        assert_eq!(state.plan.timers[0].work_duration, 60);
        assert_eq!(state.plan.timers[0].interval_duration, 30);
        assert_eq!(state.plan.timers[0].sets, 1);
        assert_eq!(state.plan.default_interval, 30);
        assert!(!state.position.is_running);
    }

    #[test]
    fn open_with_defaults_seeds_fallback_plan() {
        let session =
            Session::open_with_defaults(MemoryStore::new(), NullCuePlayer, 45, 15);
        let item = &session.state().plan.timers[0];
        assert_eq!(item.work_duration, 45);
        assert_eq!(item.interval_duration, 15);
        assert_eq!(session.state().plan.default_interval, 15);

        // A zero work seed would violate the plan invariant.
        let session = Session::open_with_defaults(MemoryStore::new(), NullCuePlayer, 0, 15);
        assert_eq!(session.state().plan.timers[0].work_duration, 1);
    }

    #[test]
    fn open_with_corrupt_blob_yields_default_plan() {
        let session = Session::open(MemoryStore::with_blob("{garbage"), NullCuePlayer);
        assert_eq!(session.state().plan.timers.len(), 1);
        assert_eq!(session.state().plan.timers[0].work_duration, 60);
    }

    #[test]
    fn every_dispatch_persists() {
        let mut session = Session::open(MemoryStore::new(), NullCuePlayer);
        session.dispatch(Action::AddTimer).unwrap();
        let blob = session.store().load().unwrap().unwrap();
        let persisted = SessionState::restore(&blob).unwrap();
        assert_eq!(persisted.plan.timers.len(), 2);
    }

    #[test]
    fn advance_second_walks_work_and_interval() {
        let mut plan = Plan::single(2, 1);
        plan.timers[0].sets = 2;
        let mut session = session_with(plan);
        session.dispatch(Action::Start).unwrap();

        session.advance_second().unwrap();
        assert_eq!(session.state().position.remaining_time, 1);

        // Second 2 exhausts the work phase and enters the interval.
        let events = session.advance_second().unwrap();
        assert_eq!(events.len(), 1);
        assert!(session.state().position.is_interval);
        assert_eq!(session.state().position.remaining_time, 1);
        assert_eq!(session.cues.finishes.get(), 1);
    }

    #[test]
    fn zero_length_interval_passes_in_one_second() {
        let mut plan = Plan::single(1, 0);
        plan.timers[0].sets = 2;
        let mut session = session_with(plan);
        session.dispatch(Action::Start).unwrap();

        // Work exhausts, the empty interval is entered and exhausted,
        // and the second set starts -- all within one scheduler second.
        let events = session.advance_second().unwrap();
        assert_eq!(events.len(), 2);
        let pos = &session.state().position;
        assert_eq!(pos.phase(), Phase::Work);
        assert_eq!(pos.current_set_index, 1);
        assert_eq!(pos.remaining_time, 1);
        assert_eq!(session.cues.finishes.get(), 2);
    }

    #[test]
    fn one_cue_per_exhaustion() {
        let mut session = session_with(Plan::single(2, 0));
        session.dispatch(Action::Start).unwrap();
        session.advance_second().unwrap();
        session.advance_second().unwrap();
        assert!(session.state().position.is_finished);
        assert_eq!(session.cues.finishes.get(), 1);
        assert_eq!(session.cues.beeps.get(), 0);

        // Once finished the loop goes quiet.
        session.advance_second().unwrap();
        assert_eq!(session.cues.finishes.get(), 1);
    }

    #[test]
    fn advance_second_is_noop_while_paused() {
        let mut session = session_with(Plan::single(5, 0));
        let before = session.state().clone();
        let events = session.advance_second().unwrap();
        assert!(events.is_empty());
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn plan_edits_do_not_cue() {
        let mut session = session_with(Plan::single(5, 0));
        let id = session.state().plan.timers[0].id.clone();
        session.dispatch(Action::AddTimer).unwrap();
        session
            .dispatch(Action::UpdateTimer {
                id,
                fields: vec![TimerField::Name("Plank".into())],
            })
            .unwrap();
        assert_eq!(session.cues.finishes.get(), 0);
        assert_eq!(session.cues.beeps.get(), 0);
    }
}
