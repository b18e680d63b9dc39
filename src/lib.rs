//! # Token Refresher Library
//!
//! Holds an OAuth2 access token, refreshes it before expiry and attaches it
//! as a bearer header to outbound requests. Concurrent callers never trigger
//! more than one token endpoint exchange at a time.
//!
//! Modules:
//! - `auth` — token state, expiry policy and the refresh coordinator
//! - `sources` — token endpoint exchange (client credentials / refresh token)
//! - `config` — credentials and YAML service configuration
//! - `observability` — refresh metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::auth::OAuth2Auth;
pub use crate::config::credentials::Credentials;
pub use crate::error::{AuthError, ConfigError, FetchError};
pub use crate::sources::{FetchTokens, HttpTokenFetcher, TokenResponse};
