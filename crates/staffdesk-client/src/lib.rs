// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use staffdesk_app::{Record, RecordSource, SyncOutcome, SyncRequest};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:39393";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking REST client for the staffing server.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("client.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("client.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "client.base_url {base_url:?} uses scheme {:?} -- use http:// or https://",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {endpoint}` decoded as a list of records.
    pub fn fetch(&self, endpoint: &str) -> Result<Vec<Record>> {
        let response = self
            .http
            .get(self.url(endpoint))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let records: Vec<Record> = response
            .json()
            .with_context(|| format!("decode records from {endpoint}"))?;
        tracing::debug!(endpoint, count = records.len(), "fetched records");
        Ok(records)
    }

    /// Fails unless the employees collection answers.
    pub fn ping(&self) -> Result<()> {
        self.fetch("/employees").map(|_| ())
    }

    /// Sends a mutation and returns the raw status code.
    pub fn send(&self, request: &SyncRequest) -> Result<u16> {
        let op = request.op();
        let url = self.url(&request.path());
        let method = reqwest::Method::from_bytes(op.method().as_bytes())
            .with_context(|| format!("build {} request", op.method()))?;
        let mut builder = self.http.request(method, &url);
        if let Some(record) = request.record() {
            builder = builder.json(record);
        }

        let response = builder
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        let status = response.status();
        if status.as_u16() != op.success_status() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(
                method = op.method(),
                url,
                error = %clean_error_response(status, &body),
                "sync rejected"
            );
        }
        Ok(status.as_u16())
    }

    /// Like [`Client::send`], folded into what the table should show.
    pub fn sync(&self, request: &SyncRequest) -> SyncOutcome {
        let op = request.op();
        match self.send(request) {
            Ok(status) => SyncOutcome::from_status(op, status),
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), method = op.method(), "sync failed");
                SyncOutcome::unreachable(op)
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl RecordSource for Client {
    fn fetch_records(&mut self, endpoint: &str) -> Result<Vec<Record>> {
        self.fetch(endpoint)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- start it with `staffdesk --serve` ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}
