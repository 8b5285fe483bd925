//! Log setup: STUDYPLAN_LOG wins, then the configured `log.level`.
//! Everything goes to stderr so stdout stays parseable.

use studyplan_core::Config;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";

pub fn init() {
    let filter = EnvFilter::try_from_env("STUDYPLAN_LOG").unwrap_or_else(|_| {
        // Reading the file here must not create it or fail the command.
        let level = Config::path()
            .ok()
            .filter(|path| path.exists())
            .and_then(|path| Config::load_from(&path).ok())
            .map(|cfg| cfg.log.level)
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
