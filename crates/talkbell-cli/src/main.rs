use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "talkbell-cli", version, about = "Talk reminder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule reminders for one talk
    Schedule(commands::slots::SlotArgs),
    /// Schedule every talk in a schedule JSON file
    Import {
        /// Path to a JSON array of slots
        path: std::path::PathBuf,
    },
    /// Cancel a talk's reminders
    Cancel {
        slot_id: String,
        /// Only cancel the pre-talk reminder
        #[arg(long)]
        partial: bool,
    },
    /// Schedule a talk if untracked, remove it otherwise
    Toggle(commands::slots::SlotArgs),
    /// Show a talk's notification state
    Status { slot_id: String },
    /// List every persisted notification
    List,
    /// Deliver an alarm by hand
    Fire {
        #[command(subcommand)]
        action: commands::fire::FireAction,
    },
    /// Re-arm every persisted notification and drop elapsed ones
    Reset,
    /// Reset, then deliver alarms until none remain
    Run,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TALKBELL_LOG")
                .unwrap_or_else(|_| EnvFilter::new("talkbell_core=warn,talkbell_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Schedule(args) => commands::slots::schedule(args),
        Commands::Import { path } => commands::slots::import(&path),
        Commands::Cancel { slot_id, partial } => commands::slots::cancel(&slot_id, partial),
        Commands::Toggle(args) => commands::slots::toggle(args),
        Commands::Status { slot_id } => commands::slots::status(&slot_id),
        Commands::List => commands::slots::list(),
        Commands::Fire { action } => commands::fire::run(action),
        Commands::Reset => commands::run::reset(),
        Commands::Run => commands::run::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
