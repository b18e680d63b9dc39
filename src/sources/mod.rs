//! Token sources
//!
//! The token endpoint exchange sits behind [`FetchTokens`] so the refresh
//! coordinator never depends on a concrete transport.

use std::future::Future;

use serde::Deserialize;

use crate::config::credentials::Credentials;
use crate::error::FetchError;

pub mod http;

pub use http::HttpTokenFetcher;

/// Token endpoint response body. Discarded once folded into the token state.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// seconds until expiry
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

pub trait FetchTokens: Send + Sync + 'static {
    /// Perform one token endpoint exchange. Uses the refresh token grant when
    /// `refresh_token` is present, client credentials otherwise.
    fn fetch_token(
        &self,
        credentials: &Credentials,
        refresh_token: Option<&str>,
    ) -> impl Future<Output = Result<TokenResponse, FetchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_may_be_absent_or_null() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","refresh_token":null}"#).unwrap();
        assert_eq!(parsed.access_token, "abc");
        assert!(parsed.expires_in.is_none());
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.token_type.is_none());
    }

    #[test]
    fn access_token_is_required() {
        let parsed = serde_json::from_str::<TokenResponse>(r#"{"token_type":"Bearer","expires_in":3600}"#);
        assert!(parsed.is_err());
    }
}
