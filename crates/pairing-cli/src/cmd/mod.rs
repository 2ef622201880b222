pub mod config;
pub mod enrich;
pub mod init;
pub mod plan;
pub mod run;

use anyhow::Context;
use pairing_core::config::{Config, DirectoryBackend, WarnLevel};
use pairing_core::directory::{self, EnrichmentReport, GraphDirectory};
use pairing_core::source::load_population;
use pairing_core::types::Participant;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Load the config and refuse to continue on validation errors.
pub(crate) fn load_checked_config(root: &Path) -> anyhow::Result<Config> {
    let config = Config::load(root).context("failed to load config")?;
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => anyhow::bail!("invalid config: {}", w.message),
        }
    }
    Ok(config)
}

pub(crate) fn input_path(root: &Path, config: &Config, input: Option<PathBuf>) -> PathBuf {
    match input {
        Some(p) => p,
        None => config.input_path(root),
    }
}

/// Load the population and fill in reporting lines through the configured
/// directory. Without a directory every record must already name a manager.
pub(crate) fn load_enriched(
    config: &Config,
    input: &Path,
) -> anyhow::Result<(Vec<Participant>, EnrichmentReport)> {
    let mut people = load_population(input)
        .with_context(|| format!("failed to load population from {}", input.display()))?;

    let report = match &config.directory {
        DirectoryBackend::None => {
            directory::require_managers(&people)?;
            EnrichmentReport::default()
        }
        DirectoryBackend::Graph {
            base_url,
            token_env,
            timeout_secs,
        } => {
            let token = std::env::var(token_env)
                .with_context(|| format!("directory token variable {token_env} is not set"))?;
            let graph = GraphDirectory::new(
                base_url.as_str(),
                token,
                Duration::from_secs(*timeout_secs),
            )?;
            directory::enrich(&mut people, &graph)?
        }
    };
    Ok((people, report))
}
