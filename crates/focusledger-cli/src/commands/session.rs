use clap::Subcommand;
use focusledger_core::{Event, SessionTrigger};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a focus session
    Start {
        /// Mark the session as manually started rather than token-tapped
        #[arg(long)]
        manual: bool,
    },
    /// End the active session and run the accounting pipeline
    End,
    /// Drive one engine tick (milestone earning, break countdown)
    Tick,
    /// Print the current engine state as JSON
    Status,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = super::load_engine()?;

    match action {
        SessionAction::Start { manual } => {
            let trigger = if manual {
                SessionTrigger::Manual
            } else {
                SessionTrigger::TokenTap
            };
            match engine.start_session(trigger) {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => eprintln!("session already active"),
            }
        }
        SessionAction::End => {
            let events = engine.end_session();
            if events.is_empty() {
                eprintln!("no active session");
            } else {
                println!("{}", serde_json::to_string_pretty(&events)?);
            }
        }
        SessionAction::Tick => {
            let events: Vec<Event> = engine.tick();
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        SessionAction::Status => {
            let snapshot = engine.state_snapshot_at(chrono::Utc::now());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }
    Ok(())
}
