use std::collections::BTreeMap;

use chrono::Duration;

use crate::error::ConfigError;
use crate::utils::constants::DEFAULT_REFRESH_BEFORE_SECS;

/// Client credentials for one token endpoint.
///
/// Validated on construction and immutable afterwards: the endpoint URL,
/// client id and client secret are all non-empty.
#[derive(Clone)]
pub struct Credentials {
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
    extra_params: BTreeMap<String, String>,
    refresh_lead: Duration,
}

impl Credentials {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let token_url = token_url.into();
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if token_url.is_empty() {
            return Err(ConfigError::MissingTokenUrl);
        }
        if client_id.is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if client_secret.is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }

        Ok(Self {
            token_url,
            client_id,
            client_secret,
            scope: None,
            extra_params: BTreeMap::new(),
            refresh_lead: Duration::seconds(DEFAULT_REFRESH_BEFORE_SECS),
        })
    }

    /// Empty scope is treated as unset.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.scope = (!scope.is_empty()).then_some(scope);
        self
    }

    pub fn with_extra_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.extra_params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Non-positive values select the default lead time; values beyond the
    /// representable range are clamped.
    pub fn with_refresh_before_secs(mut self, seconds: i64) -> Self {
        self.refresh_lead = if seconds > 0 {
            Duration::try_seconds(seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::seconds(DEFAULT_REFRESH_BEFORE_SECS)
        };
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn extra_params(&self) -> &BTreeMap<String, String> {
        &self.extra_params
    }

    /// Effective lead time before expiry at which the token counts as stale.
    pub fn refresh_lead(&self) -> Duration {
        self.refresh_lead
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("scope", &self.scope)
            .field("extra_params", &self.extra_params.keys().collect::<Vec<_>>())
            .field("refresh_lead_secs", &self.refresh_lead.num_seconds())
            .finish()
    }
}
