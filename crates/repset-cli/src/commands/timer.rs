use std::io::Write as _;
use std::time::Duration;

use clap::Subcommand;
use repset_core::storage::Config;
use repset_core::{Action, CuePlayer, NullCuePlayer, SessionState};

use crate::audio::SynthCuePlayer;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the workout and tick in the foreground until it finishes
    Start {
        /// Disable audio cues for this run
        #[arg(long)]
        mute: bool,
    },
    /// Pause the workout, keeping the current position
    Pause,
    /// Go back to the start of the plan
    Reset,
    /// Print the current state as JSON
    Status,
    /// Force the current phase to finish
    FinishPhase,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Start { mute } => run_loop(mute),
        TimerAction::Pause => {
            let mut session = super::open_session()?;
            let event = session.dispatch(Action::Stop)?;
            match event {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("{}", serde_json::to_string_pretty(&session.snapshot())?),
            }
            Ok(())
        }
        TimerAction::Reset => {
            let mut session = super::open_session()?;
            if let Some(event) = session.dispatch(Action::Reset)? {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
            Ok(())
        }
        TimerAction::Status => {
            let session = super::open_session()?;
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
            Ok(())
        }
        TimerAction::FinishPhase => {
            let mut session = super::open_session()?;
            let event = session.dispatch(Action::NextPhase)?;
            match event {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("{}", serde_json::to_string_pretty(&session.snapshot())?),
            }
            Ok(())
        }
    }
}

/// Drive the one-second tick loop until the workout finishes or the
/// user interrupts. Ctrl-C pauses and persists, it never loses the
/// position.
fn run_loop(mute: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let cues: Box<dyn CuePlayer> = if mute || !config.sound.enabled {
        Box::new(NullCuePlayer)
    } else {
        match SynthCuePlayer::open(config.sound.volume) {
            Some(player) => Box::new(player),
            // No output device: run silent.
            None => Box::new(NullCuePlayer),
        }
    };

    let mut session = super::open_session_with(cues)?;
    if session.state().position.is_finished {
        println!("workout already finished; run `repset timer reset` first");
        return Ok(());
    }
    session.dispatch(Action::Start)?;
    print_status_line(session.state());

    let rt = tokio::runtime::Runtime::new()?;
    let finished: Result<bool, repset_core::CoreError> = rt.block_on(async {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        // The first interval tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    session.dispatch(Action::Stop)?;
                    return Ok(false);
                }
                _ = ticker.tick() => {
                    session.advance_second()?;
                    print_status_line(session.state());
                    if session.state().position.is_finished {
                        return Ok(true);
                    }
                }
            }
        }
    });
    println!();

    if finished? {
        let state = session.state();
        let work_secs: u64 = state
            .plan
            .timers
            .iter()
            .map(|t| t.sets as u64 * t.work_duration as u64)
            .sum();
        session
            .store()
            .record_workout(chrono::Utc::now(), state.plan.timers.len(), work_secs)?;
        println!("workout finished");
    } else {
        println!("paused");
    }
    Ok(())
}

fn print_status_line(state: &SessionState) {
    let pos = &state.position;
    let Some(item) = state.plan.timers.get(pos.current_timer_index) else {
        return;
    };
    let phase = if pos.is_interval { "rest" } else { "work" };
    print!(
        "\r{} [set {}/{}] {} {:>4}s  {:5.1}%   ",
        item.label(pos.current_timer_index),
        pos.current_set_index + 1,
        item.sets,
        phase,
        pos.remaining_time,
        state.plan_progress_pct(),
    );
    let _ = std::io::stdout().flush();
}
