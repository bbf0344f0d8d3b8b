use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals
    Today,
    /// This week's totals (Monday-first)
    Week,
    /// This calendar month's totals
    Month,
    /// All-time ledger
    Lifetime,
    /// Personal records
    Records,
    /// Current and longest streak
    Streak,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = super::load_engine()?;
    let now = Utc::now();

    let output = match action {
        StatsAction::Today => json!({
            "seconds": engine.today_secs_at(now),
            "sessions": engine.today_session_count_at(now),
        }),
        StatsAction::Week => json!({ "seconds": engine.week_secs_at(now) }),
        StatsAction::Month => json!({ "seconds": engine.month_secs_at(now) }),
        StatsAction::Lifetime => serde_json::to_value(engine.counters())?,
        StatsAction::Records => serde_json::to_value(engine.records())?,
        StatsAction::Streak => serde_json::to_value(engine.streak())?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
