//! Shared constants and invariants

/// Lead time applied when none (or a non-positive one) is configured.
pub const DEFAULT_REFRESH_BEFORE_SECS: i64 = 60;
/// Lifetime assumed when the token endpoint omits `expires_in` or sends <= 0.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
/// Upper bound of a single token endpoint exchange.
pub const TOKEN_REQUEST_TIMEOUT_SECS: u64 = 30;

// Supported grant types
pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

pub const DEFAULT_CONFIG_PATH: &str = "token-refresher.yaml";
