//! Remote provider: posts the raw image to a pose-detector sidecar which
//! answers with the same JSON detection the payload provider accepts.

use std::time::Duration;

use super::{Detection, LandmarkProvider, ProviderError};

pub struct RemoteProvider {
    client: reqwest::Client,
    url: String,
}

impl RemoteProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[axum::async_trait]
impl LandmarkProvider for RemoteProvider {
    async fn detect(&self, image: &[u8]) -> Result<Detection, ProviderError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Detector(format!("detector responded with {}", status)));
        }

        let body = response.bytes().await?;
        Detection::from_json(&body)
    }
}
