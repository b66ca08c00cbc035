//! Push notification delivery through a SimplePush-compatible endpoint.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("push endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

pub struct PushClient {
    client: reqwest::Client,
    endpoint: String,
    key: String,
}

impl PushClient {
    pub fn new(endpoint: String, key: String) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            key,
        })
    }

    pub async fn send(&self, title: &str, message: &str) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("key", self.key.as_str()),
                ("title", title),
                ("msg", message),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PushError::Status(response.status()));
        }
        Ok(())
    }
}
