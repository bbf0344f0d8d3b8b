use clap::Subcommand;

#[derive(Subcommand)]
pub enum OverrideAction {
    /// Spend one override
    Use,
    /// Print the allowance and earn-back progress
    Status,
}

pub fn run(action: OverrideAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = super::load_engine()?;

    match action {
        OverrideAction::Use => match engine.use_override() {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => eprintln!("no overrides remaining"),
        },
        OverrideAction::Status => {
            println!("{}", serde_json::to_string_pretty(engine.overrides())?);
        }
    }
    Ok(())
}
