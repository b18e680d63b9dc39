use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use token_refresher::config::loader;
use token_refresher::observability::metrics::get_metrics;
use token_refresher::utils::constants::DEFAULT_CONFIG_PATH;
use token_refresher::utils::logging::{self, LogLevel};
use token_refresher::{Credentials, HttpTokenFetcher, OAuth2Auth};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// GET this URL with the bearer token attached
    #[arg(long)]
    url: Option<String>,
    /// Print refresh metrics before exiting
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = loader::file_to_config(Path::new(&args.config)).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Build token manager
    // -------------------------------

    let client = Client::new();
    let credentials = Credentials::try_from(&service_config.oauth2)?;
    let auth = OAuth2Auth::with_fetcher(credentials, HttpTokenFetcher::with_client(client.clone()));
    info!(
        "using {}, refresh lead {}s",
        auth,
        auth.credentials().refresh_lead().num_seconds()
    );

    // -------------------------------
    // 3. Obtain token, optionally call the target
    // -------------------------------

    match &args.url {
        Some(url) => {
            let mut request = client.get(url).build().context("invalid target url")?;
            auth.authenticate(&mut request).await?;

            let response = client.execute(request).await?;
            let status = response.status();
            let body = response.text().await?;
            println!("{}", status);
            println!("{}", body);
        }
        None => {
            auth.access_token().await?;
            match auth.expires_at() {
                Some(expires_at) => println!("access token acquired, expires at {}", expires_at.to_rfc3339()),
                None => println!("access token acquired"),
            }
        }
    }

    if args.metrics {
        print!("{}", get_metrics().await.render()?);
    }

    Ok(())
}
