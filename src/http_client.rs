use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

pub fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("goalkick-terminal/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")
}
