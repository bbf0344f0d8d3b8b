use clap::Subcommand;
use focusledger_core::EnginePolicy;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective policy as JSON
    Show,
    /// Print the config file path
    Path,
    /// Write the default policy to the config file
    Init,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let policy = EnginePolicy::load()?;
            println!("{}", serde_json::to_string_pretty(&policy)?);
        }
        ConfigAction::Path => {
            println!("{}", EnginePolicy::path()?.display());
        }
        ConfigAction::Init => {
            let policy = EnginePolicy::default();
            policy.save()?;
            println!("{}", EnginePolicy::path()?.display());
        }
    }
    Ok(())
}
