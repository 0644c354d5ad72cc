use std::future::Future;

use super::recorder::SightingStore;
use crate::prelude::{ConsoleError, ConsoleResult};
use crate::stream_interface::Sighting;

/// Posts sightings as JSON to the backend's `/log-sighting` endpoint.
#[derive(Debug, Clone)]
pub struct HttpSightingStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSightingStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SightingStore for HttpSightingStore {
    fn submit(&self, sighting: Sighting) -> impl Future<Output = ConsoleResult<()>> + Send {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        async move {
            let response = client
                .post(&endpoint)
                .json(&sighting)
                .send()
                .await
                .map_err(|e| ConsoleError::PersistenceFailure(e.to_string()))?;
            if response.status().is_success() {
                Ok(())
            } else {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                Err(ConsoleError::PersistenceFailure(format!("{}: {}", status, text)))
            }
        }
    }
}
