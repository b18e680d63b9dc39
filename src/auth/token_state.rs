use chrono::{DateTime, Duration, Utc};

use crate::sources::TokenResponse;
use crate::utils::constants::DEFAULT_TOKEN_TTL_SECS;

/// Cached token of one manager. Empty strings mean "never fetched" / "none issued".
#[derive(Clone, Default)]
pub struct TokenState {
    access_token: String,
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>, // None: never fetched
}

impl TokenState {
    /// Expiry policy: refresh when never fetched or within `lead` of expiry.
    pub fn needs_refresh(&self, now: DateTime<Utc>, lead: Duration) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at - now <= lead,
        }
    }

    /// Fold a token endpoint response fetched at `now` into the state.
    pub fn apply(&mut self, response: &TokenResponse, now: DateTime<Utc>) {
        let expires_at = expiry_after(now, response.expires_in);

        self.access_token = response.access_token.clone();

        // many providers omit the refresh token on renewal
        if let Some(refresh_token) = response.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            self.refresh_token = refresh_token.to_owned();
        }

        self.expires_at = Some(expires_at);
    }

    /// Force the next check to refresh. The refresh token is kept.
    pub fn invalidate(&mut self) {
        self.expires_at = None;
    }

    pub fn access_token(&self) -> Option<&str> {
        Some(self.access_token.as_str()).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        Some(self.refresh_token.as_str()).filter(|t| !t.is_empty())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// `now + expires_in`, saturating at the latest representable instant.
/// Absent or non-positive `expires_in` means the default lifetime.
fn expiry_after(now: DateTime<Utc>, expires_in: Option<i64>) -> DateTime<Utc> {
    let ttl = expires_in
        .filter(|seconds| *seconds > 0)
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

    Duration::try_seconds(ttl)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl std::fmt::Debug for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenState")
            .field("has_access_token", &!self.access_token.is_empty())
            .field("has_refresh_token", &!self.refresh_token.is_empty())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
