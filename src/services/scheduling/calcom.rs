use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

use super::{SchedulingProvider, UpstreamResponse};
use crate::models::BookingRequest;

const API_VERSION_HEADER: &str = "cal-api-version";

pub struct CalComProvider {
    api_key: String,
    endpoint: String,
    api_version: String,
    client: reqwest::Client,
}

impl CalComProvider {
    pub fn new(
        api_key: String,
        endpoint: String,
        api_version: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Cal.com HTTP client")?;

        Ok(Self {
            api_key,
            endpoint,
            api_version,
            client,
        })
    }
}

#[async_trait]
impl SchedulingProvider for CalComProvider {
    async fn create_booking(&self, request: &BookingRequest) -> anyhow::Result<UpstreamResponse> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(API_VERSION_HEADER, &self.api_version)
            .json(request)
            .send()
            .await
            .context("failed to call Cal.com API")?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .context("failed to read Cal.com response")?;

        // Error pages are not always JSON; keep the text so it can still be reported.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(UpstreamResponse { status, body })
    }
}
