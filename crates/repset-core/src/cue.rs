//! Audible cue abstraction.
//!
//! The engine only decides *that* a cue should sound; producing the
//! sound is a collaborator's job. Playback is fire-and-forget: a player
//! must never block or fail a dispatch, and a missing audio device is
//! tolerated silently.

use serde::{Deserialize, Serialize};

/// Kind of audible signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    /// Short high ping. Available but unused by current transitions.
    Beep,
    /// Phase-change bell: layered tone, sharp attack, exponential decay.
    Finish,
}

/// Fire-and-forget sound output.
pub trait CuePlayer {
    fn play(&self, kind: CueKind);
}

/// Silent player, used until audio has been explicitly initialized.
#[derive(Debug, Default)]
pub struct NullCuePlayer;

impl CuePlayer for NullCuePlayer {
    fn play(&self, _kind: CueKind) {}
}

impl<C: CuePlayer + ?Sized> CuePlayer for Box<C> {
    fn play(&self, kind: CueKind) {
        (**self).play(kind);
    }
}
