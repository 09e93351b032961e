//! Image uploads to the storage bucket.

use async_trait::async_trait;
use reqwest::Method;
use tracing::{info, instrument};

use notekeep_core::{Error, ImageStorage, Result};

use crate::client::RestClient;

/// Storage API implementation of ImageStorage.
///
/// Objects are never overwritten or deleted from here; a replaced image
/// stays in the bucket.
#[derive(Clone)]
pub struct RestImageStorage {
    client: RestClient,
}

impl RestImageStorage {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageStorage for RestImageStorage {
    #[instrument(skip(self, bytes), fields(subsystem = "remote", component = "storage", op = "upload", size = bytes.len()))]
    async fn upload(&self, object_name: &str, content_type: &str, bytes: &[u8]) -> Result<String> {
        let request = self
            .client
            .request(Method::POST, &self.client.object_url(object_name))
            .header("Content-Type", content_type)
            .body(bytes.to_vec());

        self.client.send(request).await.map_err(|e| match e {
            Error::Remote { status, message } => {
                Error::Storage(format!("Upload rejected ({}): {}", status, message))
            }
            Error::Request(message) => Error::Storage(format!("Upload failed: {}", message)),
            other => other,
        })?;

        let url = self.client.public_object_url(object_name);
        info!(object = object_name, "Uploaded image");
        Ok(url)
    }
}
