pub mod calcom;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::BookingRequest;

/// Raw answer from the scheduling API; a non-2xx status is still a response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait SchedulingProvider: Send + Sync {
    async fn create_booking(&self, request: &BookingRequest) -> anyhow::Result<UpstreamResponse>;
}
