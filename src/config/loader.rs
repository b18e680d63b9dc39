use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, error};

use crate::config::sources::ServiceConfig;
use crate::error::ConfigError;

/// Load config from a YAML file, expanding `${VAR}` / `${VAR:default}` first.
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

    debug!("loaded config file '{}'", path.display());
    parse_config(&expand_env_vars(&content))
}

pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    serde_yaml::from_str(content)
        .inspect_err(|e| error!("parse config error: {}", e))
        .map_err(ConfigError::from)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // literal pattern, compiled once
    PATTERN.get_or_init(|| Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").unwrap())
}

pub fn expand_env_vars(input: &str) -> String {
    env_var_pattern()
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string()
}
