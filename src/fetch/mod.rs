//! HTTP fetch plumbing shared by the import and sync paths.

mod basic;
mod client;
pub mod auth;

pub use auth::{ApiKey, UrlParam};
pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, anyhow};

/// Fetches a URL and returns the raw body bytes. Non-2xx statuses are
/// errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let resp = execute_checked(client, url).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// Fetches a URL and decodes the body as JSON. Non-2xx statuses are errors
/// carrying the response body for context.
pub async fn fetch_json<C: HttpClient>(client: &C, url: &str) -> Result<serde_json::Value> {
    let resp = execute_checked(client, url).await?;
    Ok(resp.json().await?)
}

async fn execute_checked<C: HttpClient>(client: &C, url: &str) -> Result<reqwest::Response> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    let resp = client.execute(req).await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("GET {url} returned status {status}: {body}"));
    }

    Ok(resp)
}
