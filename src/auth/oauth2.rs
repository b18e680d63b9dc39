use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::auth::token_state::TokenState;
use crate::config::credentials::Credentials;
use crate::config::sources::OAuth2Config;
use crate::error::{AuthError, ConfigError, FetchError};
use crate::helpers::time::{get_instant, now};
use crate::observability::metrics::get_metrics;
use crate::sources::{FetchTokens, HttpTokenFetcher};
use crate::utils::constants::{GRANT_CLIENT_CREDENTIALS, GRANT_REFRESH_TOKEN};

/// OAuth2 bearer authentication with a cached, proactively refreshed token.
///
/// Cloning is cheap and every clone shares the same token. Concurrent callers
/// that find the token stale elect a single refresher; the rest wait for its
/// completion signal and re-check the token instead of fetching themselves.
pub struct OAuth2Auth<F = HttpTokenFetcher> {
    shared: Arc<Shared<F>>,
}

struct Shared<F> {
    credentials: Credentials,
    fetcher: F,
    guarded: Mutex<Guarded>,
    // signalled when the in-flight refresh finishes, success or failure
    refreshed: Notify,
}

#[derive(Default)]
struct Guarded {
    token: TokenState,
    refresh_in_progress: bool,
}

impl<F> Shared<F> {
    // never held across an await
    fn lock(&self) -> MutexGuard<'_, Guarded> {
        self.guarded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum Step<'a> {
    Ready,
    Wait(Notified<'a>),
    Refresh(Option<String>),
}

/// Clears the refresh flag and releases all waiters when the refresh ends,
/// including when the fetch panics or its task is torn down.
struct RefreshReset<'a, F>(&'a Shared<F>);

impl<F> Drop for RefreshReset<'_, F> {
    fn drop(&mut self) {
        self.0.lock().refresh_in_progress = false;
        self.0.refreshed.notify_waiters();
    }
}

impl OAuth2Auth<HttpTokenFetcher> {
    pub fn new(credentials: Credentials) -> Result<Self, ConfigError> {
        Ok(Self::with_fetcher(credentials, HttpTokenFetcher::new()?))
    }

    pub fn from_config(cfg: &OAuth2Config) -> Result<Self, ConfigError> {
        Self::new(Credentials::try_from(cfg)?)
    }
}

impl<F: FetchTokens> OAuth2Auth<F> {
    pub fn with_fetcher(credentials: Credentials, fetcher: F) -> Self {
        Self {
            shared: Arc::new(Shared {
                credentials,
                fetcher,
                guarded: Mutex::new(Guarded::default()),
                refreshed: Notify::new(),
            }),
        }
    }

    /// Set `Authorization: Bearer <token>` on the request, refreshing first if needed.
    pub async fn authenticate(&self, request: &mut reqwest::Request) -> Result<(), AuthError> {
        self.authenticate_headers(request.headers_mut()).await
    }

    pub async fn authenticate_headers(&self, headers: &mut HeaderMap) -> Result<(), AuthError> {
        let token = self.access_token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Current access token, refreshed first if it is within the lead time of expiry.
    ///
    /// A failed fetch is reported only to the caller that performed it. Callers
    /// that were waiting on it re-evaluate and may run their own refresh.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let lead = self.shared.credentials.refresh_lead();

        loop {
            let step = {
                let mut guarded = self.shared.lock();
                if !guarded.token.needs_refresh(now(), lead) {
                    Step::Ready
                } else if guarded.refresh_in_progress {
                    // registered under the lock so the completion signal cannot be missed
                    Step::Wait(self.shared.refreshed.notified())
                } else {
                    guarded.refresh_in_progress = true;
                    Step::Refresh(guarded.token.refresh_token().map(str::to_owned))
                }
            };

            match step {
                Step::Ready => break,
                Step::Wait(notified) => {
                    debug!("token refresh in progress for '{}', waiting", self.shared.credentials.client_id());
                    notified.await;
                }
                Step::Refresh(refresh_token) => {
                    self.refresh(refresh_token).await.map_err(AuthError::Refresh)?;
                    break;
                }
            }
        }

        self.shared
            .lock()
            .token
            .access_token()
            .map(str::to_owned)
            .ok_or(AuthError::NoTokenAvailable)
    }

    /// Expiry of the cached token, if one was ever fetched.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.shared.lock().token.expires_at()
    }

    /// Treat the cached access token as stale, e.g. after a protected
    /// resource rejected it. The next call refreshes.
    pub fn invalidate(&self) {
        self.shared.lock().token.invalidate();
    }

    pub fn credentials(&self) -> &Credentials {
        &self.shared.credentials
    }

    /// Cached access token without running the refresh path.
    #[cfg(test)]
    pub(crate) fn cached_access_token(&self) -> Option<String> {
        self.shared.lock().token.access_token().map(str::to_owned)
    }

    /// Run the fetch as the elected refresher. The fetch lives in its own task,
    /// so it completes and releases waiters even if this caller is dropped.
    async fn refresh(&self, refresh_token: Option<String>) -> Result<(), FetchError> {
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let _reset = RefreshReset(&shared);
            let metrics = get_metrics().await;
            let grant_type = if refresh_token.is_some() {
                GRANT_REFRESH_TOKEN
            } else {
                GRANT_CLIENT_CREDENTIALS
            };

            info!("refreshing token for '{}' using grant '{}'", shared.credentials.client_id(), grant_type);
            metrics.refresh_requests.with_label_values(&[grant_type]).inc();
            let start = get_instant();

            let result = shared
                .fetcher
                .fetch_token(&shared.credentials, refresh_token.as_deref())
                .await;
            metrics.refresh_duration.observe(start.elapsed().as_secs_f64());

            match result {
                Ok(response) => {
                    let mut guarded = shared.lock();
                    guarded.token.apply(&response, now());
                    if let Some(expires_at) = guarded.token.expires_at() {
                        metrics.token_expiry_unix.set(expires_at.timestamp());
                        info!("token for '{}' refreshed, expires at {}", shared.credentials.client_id(), expires_at);
                    }
                    Ok(())
                }
                Err(err) => {
                    metrics.refresh_failures.with_label_values(&[err.reason()]).inc();
                    warn!("token refresh for '{}' failed: {}", shared.credentials.client_id(), err);
                    Err(err)
                }
            }
        });

        task.await
            .unwrap_or_else(|join_err| Err(FetchError::Aborted(join_err.to_string())))
    }
}

impl<F> Clone for OAuth2Auth<F> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<F> std::fmt::Display for OAuth2Auth<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OAuth2Auth(client_id: {}, url: {})",
            self.shared.credentials.client_id(),
            self.shared.credentials.token_url()
        )
    }
}

impl<F> std::fmt::Debug for OAuth2Auth<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Auth")
            .field("credentials", &self.shared.credentials)
            .finish_non_exhaustive()
    }
}
