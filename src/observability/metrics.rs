use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process-wide metrics.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Refresh metrics
    pub refresh_requests: IntCounterVec,
    pub refresh_failures: IntCounterVec,
    pub refresh_duration: Histogram,

    // Token state
    pub token_expiry_unix: IntGauge,
}

// Metric names and label sets below are static; construction cannot fail.
#[allow(clippy::unwrap_used)]
impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("token_refresher".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            refresh_requests: IntCounterVec::new(Opts::new("token_refresh_requests_total", "Token endpoint exchanges by grant type"),&["grant_type"],).unwrap(),
            refresh_failures: IntCounterVec::new(Opts::new("token_refresh_failures_total", "Failed token endpoint exchanges by reason"),&["reason"],).unwrap(),
            refresh_duration: Histogram::with_opts(HistogramOpts::new("token_refresh_duration_seconds", "Token endpoint exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 30.0]),).unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the cached access token").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.refresh_requests.clone())).unwrap();
        reg.register(Box::new(metrics.refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.refresh_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();

        metrics
    }

    /// Prometheus text exposition of the registry.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn render_includes_refresh_metrics() {
        let metrics = get_metrics().await;
        metrics.refresh_requests.with_label_values(&["client_credentials"]).inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("token_refresher_token_refresh_requests_total"));
        assert!(text.contains("grant_type=\"client_credentials\""));
    }
}
