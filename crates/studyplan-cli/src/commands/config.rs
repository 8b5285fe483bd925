use clap::Subcommand;
use studyplan_core::{Config, ConfigError};

use crate::commands::print_json;
use crate::context::CmdResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (environment overrides applied)
    Show,
    /// Print the config file location
    Path,
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "backend.url", "schedule.day_order")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print_json(&config)?;
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            // Edit the file as written, without environment overrides.
            let mut config = Config::load_file()?;
            config.set_and_save(&key, &value)?;
            println!("ok");
        }
    }
    Ok(())
}
