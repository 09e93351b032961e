//! Shared HTTP client for the data API and object storage.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use notekeep_core::{Error, Result, Session};

use crate::config::RemoteConfig;

/// Error body returned by PostgREST and the storage API.
///
/// PostgREST uses `message`; storage uses `error` and `message`. Every field
/// is optional so any JSON object parses.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl ApiErrorBody {
    fn describe(&self) -> Option<String> {
        let main = self.message.clone().or_else(|| self.error.clone())?;
        let mut out = main;
        if let Some(details) = &self.details {
            out.push_str(&format!(" ({})", details));
        }
        if let Some(hint) = &self.hint {
            out.push_str(&format!(" hint: {}", hint));
        }
        Some(out)
    }
}

/// Authenticated client, cheap to clone.
///
/// Every request carries the anon key as `apikey` and the session's access
/// token as the bearer credential (the anon key when no user is signed in).
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: RemoteConfig,
    session: Session,
}

impl RestClient {
    /// Create a client for the given configuration and session.
    pub fn new(config: RemoteConfig, session: Session) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base(),
            signed_in = session.is_signed_in(),
            "Initializing remote client"
        );

        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// URL of a data API table.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base(), table)
    }

    /// URL for uploading an object to the image bucket.
    pub fn object_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base(),
            self.config.image_bucket,
            object_name
        )
    }

    /// Publicly resolvable URL of an object in the image bucket.
    pub fn public_object_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base(),
            self.config.image_bucket,
            object_name
        )
    }

    /// Start a request with authentication headers.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self
            .session
            .access_token
            .as_deref()
            .unwrap_or(&self.config.anon_key);

        debug!(%method, url, "Remote request");

        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    /// Send a request and turn non-success statuses into errors.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.describe())
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    text
                }
            });

        warn!(status = status.as_u16(), error = %message, "Remote request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(message),
            _ => Error::Remote {
                status: status.as_u16(),
                message,
            },
        })
    }
}
