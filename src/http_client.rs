use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::USER_AGENT;

const REQUEST_TIMEOUT_SECS: u64 = 20;
const AGENT: &str = concat!("standings_sync/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Sends `req` and returns the body, failing on any non-2xx status.
pub fn send_text(req: RequestBuilder) -> Result<String> {
    let resp = req.header(USER_AGENT, AGENT).send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }
    Ok(body)
}

pub fn fetch_page(url: &str) -> Result<String> {
    let client = http_client()?;
    send_text(client.get(url)).with_context(|| format!("fetching {url}"))
}
