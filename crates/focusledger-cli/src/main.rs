use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "focusledger-cli", version, about = "Focusledger CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Break control for the active session
    Break {
        #[command(subcommand)]
        action: commands::breaks::BreakAction,
    },
    /// Derived statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Override allowance
    Override {
        #[command(subcommand)]
        action: commands::overrides::OverrideAction,
    },
    /// Policy configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Break { action } => commands::breaks::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Override { action } => commands::overrides::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
