use std::path::PathBuf;

use clap::Subcommand;
use repset_core::{Action, SessionState, TimerField};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Append a new timer seeded from the default interval
    Add,
    /// Remove a timer by id
    Remove {
        /// Timer id (see `plan show`)
        id: String,
    },
    /// Update fields of a timer
    Update {
        /// Timer id (see `plan show`)
        id: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Work seconds, must be positive
        #[arg(long)]
        work: Option<u32>,
        /// Rest seconds, may be zero
        #[arg(long)]
        interval: Option<u32>,
        /// Set count, at least 1
        #[arg(long)]
        sets: Option<u32>,
    },
    /// Move a timer from one slot to another
    Reorder { source: usize, destination: usize },
    /// Set the rest seconds seeded into newly added timers
    SetInterval { secs: u32 },
    /// Print the plan and current position
    Show,
    /// Write the full session state to stdout as JSON
    Export,
    /// Replace the full session state from a JSON file
    Import { path: PathBuf },
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PlanAction::Add => {
            let mut session = super::open_session()?;
            session.dispatch(Action::AddTimer)?;
            print_plan(session.state());
        }
        PlanAction::Remove { id } => {
            let mut session = super::open_session()?;
            if session.state().plan.index_of(&id).is_none() {
                return Err(format!("no timer with id {id}").into());
            }
            let before = session.state().plan.timers.len();
            session.dispatch(Action::RemoveTimer { id })?;
            if session.state().plan.timers.len() == before {
                println!("a plan keeps at least one timer; nothing removed");
            } else {
                print_plan(session.state());
            }
        }
        PlanAction::Update {
            id,
            name,
            work,
            interval,
            sets,
        } => {
            let mut fields = Vec::new();
            if let Some(name) = name {
                fields.push(TimerField::Name(name));
            }
            if let Some(secs) = work {
                fields.push(TimerField::WorkDuration(secs));
            }
            if let Some(secs) = interval {
                fields.push(TimerField::IntervalDuration(secs));
            }
            if let Some(n) = sets {
                fields.push(TimerField::Sets(n));
            }
            if fields.is_empty() {
                return Err(
                    "nothing to update; pass at least one of --name/--work/--interval/--sets"
                        .into(),
                );
            }
            // The engine assumes validated payloads; filter here.
            for field in &fields {
                if !field.is_valid() {
                    return Err(match field {
                        TimerField::WorkDuration(_) => "work duration must be positive",
                        TimerField::Sets(_) => "sets must be at least 1",
                        _ => "invalid field value",
                    }
                    .into());
                }
            }
            let mut session = super::open_session()?;
            if session.state().plan.index_of(&id).is_none() {
                return Err(format!("no timer with id {id}").into());
            }
            session.dispatch(Action::UpdateTimer { id, fields })?;
            print_plan(session.state());
        }
        PlanAction::Reorder {
            source,
            destination,
        } => {
            let mut session = super::open_session()?;
            let len = session.state().plan.timers.len();
            if source >= len {
                return Err(format!("source index {source} out of range (plan has {len})").into());
            }
            session.dispatch(Action::ReorderTimer {
                source_index: source,
                destination_index: destination,
            })?;
            print_plan(session.state());
        }
        PlanAction::SetInterval { secs } => {
            let mut session = super::open_session()?;
            session.dispatch(Action::SetDefaultInterval { secs })?;
            println!("default interval set to {secs}s");
        }
        PlanAction::Show => {
            let session = super::open_session()?;
            print_plan(session.state());
        }
        PlanAction::Export => {
            let session = super::open_session()?;
            println!("{}", serde_json::to_string_pretty(session.state())?);
        }
        PlanAction::Import { path } => {
            let content = std::fs::read_to_string(&path)?;
            let state = SessionState::restore(&content)
                .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
            state.validate()?;
            let mut session = super::open_session()?;
            session.dispatch(Action::LoadState {
                state: Box::new(state),
            })?;
            print_plan(session.state());
        }
    }
    Ok(())
}

fn print_plan(state: &SessionState) {
    let pos = &state.position;
    println!("default interval: {}s", state.plan.default_interval);
    for (idx, item) in state.plan.timers.iter().enumerate() {
        let marker = if idx == pos.current_timer_index && !pos.is_finished {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {idx}. {:<20} work {:>4}s  rest {:>4}s  sets {}  [{}]",
            item.label(idx),
            item.work_duration,
            item.interval_duration,
            item.sets,
            item.id,
        );
    }
}
