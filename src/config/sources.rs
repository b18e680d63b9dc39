use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::credentials::Credentials;
use crate::config::settings::SettingsConfig;
use crate::error::ConfigError;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub oauth2: OAuth2Config,
}

/// ================================
/// OAuth2 token endpoint
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct OAuth2Config {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
    #[serde(default)]
    pub extra_params: BTreeMap<String, String>,
    /// <= 0 or absent means the default lead time
    pub refresh_before_seconds: Option<i64>,
}

impl TryFrom<&OAuth2Config> for Credentials {
    type Error = ConfigError;

    fn try_from(cfg: &OAuth2Config) -> Result<Self, Self::Error> {
        let mut credentials = Credentials::new(&cfg.token_url, &cfg.client_id, &cfg.client_secret)?
            .with_extra_params(cfg.extra_params.clone())
            .with_refresh_before_secs(cfg.refresh_before_seconds.unwrap_or(0));
        if let Some(scope) = &cfg.scope {
            credentials = credentials.with_scope(scope);
        }
        Ok(credentials)
    }
}
