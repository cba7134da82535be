//! Shared HTTP plumbing for the upstream clients
//!
//! Every upstream client goes through [`build_client`] and [`get_json`] so that
//! timeouts, transient-failure retries and status handling behave the same for
//! weather, country and city lookups.

use std::time::{Duration, Instant};

use reqwest::{StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::{AdvisoryError, Result};

const USER_AGENT: &str = concat!("travel-advisor/", env!("CARGO_PKG_VERSION"));
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Build a client with a request timeout and exponential-backoff retries
pub fn build_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AdvisoryError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Join a base URL and a path, then append query parameters
pub fn endpoint(base_url: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'));
    let parsed = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params)
    };
    parsed.map_err(|e| AdvisoryError::config(format!("Invalid upstream URL '{raw}': {e}")))
}

/// GET a URL and decode the JSON body, mapping failures to upstream errors
#[instrument(skip(client, url), fields(service = service, path = %url.path()))]
pub async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    service: &str,
    url: Url,
) -> Result<T> {
    let start = Instant::now();

    let response = client.get(url).send().await.map_err(|e| {
        warn!("{} request failed: {}", service, e);
        AdvisoryError::upstream(format!("{service} request failed: {e}"))
    })?;

    let status = response.status();
    let elapsed = start.elapsed();
    debug!("{} responded {} in {:.3}s", service, status, elapsed.as_secs_f64());

    if elapsed > SLOW_RESPONSE {
        warn!("Slow {} response: {:.3}s", service, elapsed.as_secs_f64());
    }

    if !status.is_success() {
        return Err(status_error(service, status));
    }

    response.json::<T>().await.map_err(|e| {
        warn!("Failed to parse {} response: {}", service, e);
        AdvisoryError::upstream(format!("{service} returned an invalid response: {e}"))
    })
}

fn status_error(service: &str, status: StatusCode) -> AdvisoryError {
    match status {
        StatusCode::UNAUTHORIZED => {
            AdvisoryError::upstream(format!("{service} rejected the credentials (HTTP 401)"))
        }
        StatusCode::NOT_FOUND => {
            AdvisoryError::upstream(format!("{service}: not found (HTTP 404)"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AdvisoryError::upstream(format!("{service}: rate limit exceeded (HTTP 429)"))
        }
        _ => AdvisoryError::upstream(format!(
            "{service} request failed with status: {} - {}",
            status,
            status.canonical_reason().unwrap_or("Unknown error")
        )),
    }
}
