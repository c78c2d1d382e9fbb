use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client for the LLM and search APIs.
///
/// `Client::clone()` is an `Arc` increment, so agents keep their own clone of
/// this one connection pool.
static SHARED_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .pool_max_idle_per_host(5)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to build tuned HTTP client ({}), using defaults", e);
            Client::new()
        })
});

pub fn shared_client() -> &'static Client {
    &SHARED_CLIENT
}
