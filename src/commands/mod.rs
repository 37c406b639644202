use std::path::Path;

use clap::ArgMatches;
use jira_relay_adapter::{ConfigError, TransformConfig};

pub mod check_config;
pub mod transform;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "jira-relay.toml";

/// File (or defaults), then `JIRA_RELAY_*` environment, then `--debug`.
pub fn load_config(matches: &ArgMatches) -> Result<TransformConfig, ConfigError> {
    let explicit = matches.get_one::<String>("config");
    let debug_flag = matches.get_flag("debug");
    resolve_config(explicit.map(String::as_str), debug_flag)
}

fn resolve_config(explicit: Option<&str>, debug_flag: bool) -> Result<TransformConfig, ConfigError> {
    let mut config = match explicit {
        Some(path) => TransformConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            TransformConfig::from_file(DEFAULT_CONFIG_FILE)?
        }
        None => TransformConfig::default(),
    };

    config.apply_env()?;
    if debug_flag {
        config.debug = true;
    }
    config.validate()?;

    Ok(config)
}
