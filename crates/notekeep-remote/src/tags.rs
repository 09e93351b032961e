//! Tag repository over the `tags` table.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument};

use notekeep_core::defaults::{TAGS_TABLE, TAG_ORDER};
use notekeep_core::{Error, Result, Tag, TagRepository};

use crate::client::RestClient;

#[derive(Serialize)]
struct TagName<'a> {
    name: &'a str,
}

/// PostgREST implementation of TagRepository.
///
/// Names are sent as given; trimming and emptiness checks belong to the
/// caller, and duplicates are accepted.
#[derive(Clone)]
pub struct RestTagRepository {
    client: RestClient,
}

impl RestTagRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn url(&self) -> String {
        self.client.table_url(TAGS_TABLE)
    }
}

#[async_trait]
impl TagRepository for RestTagRepository {
    #[instrument(skip(self), fields(subsystem = "remote", component = "tags", op = "list"))]
    async fn list(&self) -> Result<Vec<Tag>> {
        let request = self
            .client
            .request(Method::GET, &self.url())
            .query(&[("select", "*"), ("order", TAG_ORDER)]);

        let tags: Vec<Tag> = self.client.send(request).await?.json().await?;
        debug!(row_count = tags.len(), "Fetched tags");
        Ok(tags)
    }

    #[instrument(skip(self), fields(subsystem = "remote", component = "tags", op = "create"))]
    async fn create(&self, name: &str) -> Result<Tag> {
        let request = self
            .client
            .request(Method::POST, &self.url())
            .header("Prefer", "return=representation")
            .json(&[TagName { name }]);

        let mut rows: Vec<Tag> = self.client.send(request).await?.json().await?;
        if rows.is_empty() {
            return Err(Error::Internal("Tag insert returned no row".to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    #[instrument(skip(self), fields(subsystem = "remote", component = "tags", op = "rename"))]
    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::PATCH, &self.url())
            .query(&[("id", format!("eq.{}", id))])
            .json(&TagName { name });

        self.client.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "remote", component = "tags", op = "delete"))]
    async fn delete(&self, id: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &self.url())
            .query(&[("id", format!("eq.{}", id))]);

        self.client.send(request).await?;
        Ok(())
    }
}
