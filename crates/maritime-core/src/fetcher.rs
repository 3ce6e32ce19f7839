use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::TrackingApiConfig;
use crate::error::FetchError;
use crate::snapshot::VesselSnapshot;
use crate::vessel::VesselLookup;

#[async_trait]
pub trait VesselSource: Send + Sync {
    async fn fetch(&self, lookup: &VesselLookup) -> Result<VesselSnapshot, FetchError>;
}

/// Client for the Datalastic `vessel_pro` endpoint.
///
/// Each call is a single GET; there are no retries and the client's default
/// timeout applies.
pub struct TrackingApiClient {
    client: Client,
    config: TrackingApiConfig,
}

impl TrackingApiClient {
    pub fn new(config: TrackingApiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: TrackingApiConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl VesselSource for TrackingApiClient {
    async fn fetch(&self, lookup: &VesselLookup) -> Result<VesselSnapshot, FetchError> {
        debug!(url = %self.config.base_url, lookup = %lookup, "requesting vessel data");

        // Errors are stripped of the URL so the API key never reaches the logs.
        let value = lookup.value();
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("api-key", self.config.api_key.as_str()),
                (lookup.parameter(), value.as_str()),
            ])
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|err| FetchError::Decode(err.without_url()))?;

        match body {
            Value::Object(fields) if fields.is_empty() => Err(FetchError::Empty),
            Value::Object(fields) => Ok(VesselSnapshot::from(fields)),
            _ => Err(FetchError::NotAnObject),
        }
    }
}
