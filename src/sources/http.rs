use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

use crate::config::credentials::Credentials;
use crate::error::{ConfigError, FetchError};
use crate::sources::{FetchTokens, TokenResponse};
use crate::utils::constants::{
    GRANT_CLIENT_CREDENTIALS, GRANT_REFRESH_TOKEN, TOKEN_REQUEST_TIMEOUT_SECS,
};

/// Form-encoded POST against the token endpoint.
#[derive(Debug, Clone)]
pub struct HttpTokenFetcher {
    client: Client,
}

impl HttpTokenFetcher {
    pub fn new() -> Result<Self, ConfigError> {
        let client = Client::builder()
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self { client })
    }

    /// Reuse an existing client. The exchange timeout is still applied per request.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Build the token request form. Extra parameters are applied last and win on
/// key collisions.
pub fn token_request_form(
    credentials: &Credentials,
    refresh_token: Option<&str>,
) -> BTreeMap<String, String> {
    let mut form = BTreeMap::new();

    match refresh_token {
        Some(refresh_token) => {
            form.insert("grant_type".to_owned(), GRANT_REFRESH_TOKEN.to_owned());
            form.insert("refresh_token".to_owned(), refresh_token.to_owned());
        }
        None => {
            form.insert("grant_type".to_owned(), GRANT_CLIENT_CREDENTIALS.to_owned());
        }
    }

    form.insert("client_id".to_owned(), credentials.client_id().to_owned());
    form.insert("client_secret".to_owned(), credentials.client_secret().to_owned());

    if let Some(scope) = credentials.scope() {
        form.insert("scope".to_owned(), scope.to_owned());
    }

    for (key, value) in credentials.extra_params() {
        form.insert(key.to_owned(), value.to_owned());
    }
    form
}

impl FetchTokens for HttpTokenFetcher {
    async fn fetch_token(
        &self,
        credentials: &Credentials,
        refresh_token: Option<&str>,
    ) -> Result<TokenResponse, FetchError> {
        let form = token_request_form(credentials, refresh_token);
        debug!(
            "requesting token from '{}', grant_type '{}'",
            credentials.token_url(),
            form.get("grant_type").map(String::as_str).unwrap_or_default()
        );

        let response = self
            .client
            .post(credentials.token_url())
            .header(ACCEPT, "application/json")
            .form(&form)
            .timeout(Duration::from_secs(TOKEN_REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|err| {
                debug!("failed to read token error response body: {}", err);
                String::new()
            });
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
