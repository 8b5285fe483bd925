use clap::{Parser, Subcommand};

mod commands;
mod context;
mod logging;

#[derive(Parser)]
#[command(name = "studyplan", version, about = "Study planner CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management: sign up, log in, passwords
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Weekly study schedule
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Progress overview
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action).await,
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Schedule { action } => commands::schedule::run(action).await,
        Commands::Dashboard { json } => commands::dashboard::run(json).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
