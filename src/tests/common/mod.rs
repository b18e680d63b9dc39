// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;

use crate::config::credentials::Credentials;
use crate::error::FetchError;
use crate::sources::{FetchTokens, TokenResponse};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn test_credentials(token_url: &str) -> Credentials {
    Credentials::new(token_url, "test-client", "test-secret").expect("valid credentials")
}

pub fn token(access: &str, expires_in: Option<i64>, refresh: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: access.to_owned(),
        token_type: Some("Bearer".to_owned()),
        expires_in,
        refresh_token: refresh.map(str::to_owned),
        scope: None,
    }
}

/// Scripted outcome of one fake token endpoint exchange.
pub enum Outcome {
    Issue(TokenResponse),
    Reject(StatusCode, &'static str),
}

/// What the fake fetcher observed; shared with the test after the fetcher
/// has been moved into the manager.
#[derive(Default)]
pub struct FetchLog {
    pub calls: AtomicUsize,
    pub refresh_tokens: Mutex<Vec<Option<String>>>,
}

impl FetchLog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn refresh_tokens(&self) -> Vec<Option<String>> {
        self.refresh_tokens.lock().unwrap().clone()
    }
}

/// In-process token fetcher returning scripted outcomes after a fixed delay.
/// Once the script runs out the last successful token is issued again.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Mutex<Option<TokenResponse>>,
    delay: Duration,
    pub log: Arc<FetchLog>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Outcome>, delay: Duration) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Mutex::new(None),
            delay,
            log: Arc::new(FetchLog::default()),
        }
    }

    fn next_outcome(&self) -> Result<TokenResponse, FetchError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Outcome::Issue(response)) => {
                *self.fallback.lock().unwrap() = Some(response.clone());
                Ok(response)
            }
            Some(Outcome::Reject(status, body)) => Err(FetchError::Status {
                status,
                body: body.to_owned(),
            }),
            None => self
                .fallback
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| FetchError::Aborted("script exhausted".to_owned())),
        }
    }
}

impl FetchTokens for ScriptedFetcher {
    async fn fetch_token(
        &self,
        _credentials: &Credentials,
        refresh_token: Option<&str>,
    ) -> Result<TokenResponse, FetchError> {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .refresh_tokens
            .lock()
            .unwrap()
            .push(refresh_token.map(str::to_owned));

        tokio::time::sleep(self.delay).await;
        self.next_outcome()
    }
}
