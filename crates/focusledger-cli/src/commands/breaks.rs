use clap::Subcommand;

#[derive(Subcommand)]
pub enum BreakAction {
    /// List earned break options
    List,
    /// Start an earned break by index
    Start {
        #[arg(default_value = "0")]
        index: usize,
    },
    /// End the running break early
    End,
}

pub fn run(action: BreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = super::load_engine()?;

    match action {
        BreakAction::List => {
            let earned = engine
                .session()
                .map(|s| s.earned_breaks().to_vec())
                .unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&earned)?);
        }
        BreakAction::Start { index } => match engine.start_break(index) {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => eprintln!("no such earned break, or already on break"),
        },
        BreakAction::End => match engine.end_break() {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => eprintln!("not on break"),
        },
    }
    Ok(())
}
