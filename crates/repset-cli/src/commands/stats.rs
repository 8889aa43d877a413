use clap::Subcommand;
use repset_core::storage::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's completed workouts
    Today,
    /// All-time totals
    All,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let stats = db.stats()?;
    match action {
        StatsAction::Today => {
            let today = serde_json::json!({
                "workouts": stats.today_workouts,
                "work_secs": stats.today_work_secs,
            });
            println!("{}", serde_json::to_string_pretty(&today)?);
        }
        StatsAction::All => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
