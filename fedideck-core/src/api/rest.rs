// Fedideck - A multi-column Mastodon desktop client
// Copyright (C) 2025 Fedideck Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! REST pass-through for endpoints megalodon does not model

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::log_api_call;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated JSON calls against `<instance>/api/v1/...`
pub(crate) struct RestClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl RestClient {
    pub fn new(instance_url: &str, access_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("Fedideck/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: instance_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path));
        self.send("GET", path, request).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let request = self.client.post(self.url(path)).json(body);
        self.send("POST", path, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        log_api_call!(method, path);
        let start = Instant::now();

        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{} {} returned {}: {}", method, path, status, error_message(&body));
        }

        let parsed = response
            .json::<T>()
            .await
            .with_context(|| format!("Unexpected response from {} {}", method, path))?;

        log_api_call!(method, path, start.elapsed().as_millis() as u64);
        Ok(parsed)
    }
}

/// The `error` field of a Mastodon error body, or the body itself
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
