//! Join-table repository over `todo_tags`.

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument};

use notekeep_core::defaults::NOTE_TAGS_TABLE;
use notekeep_core::{NoteTagLink, NoteTagRepository, Result};

use crate::client::RestClient;

/// PostgREST implementation of NoteTagRepository.
#[derive(Clone)]
pub struct RestNoteTagRepository {
    client: RestClient,
}

impl RestNoteTagRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn url(&self) -> String {
        self.client.table_url(NOTE_TAGS_TABLE)
    }
}

#[async_trait]
impl NoteTagRepository for RestNoteTagRepository {
    #[instrument(skip(self), fields(subsystem = "remote", component = "note_tags", op = "delete_for_note"))]
    async fn delete_for_note(&self, note_id: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &self.url())
            .query(&[("todo_id", format!("eq.{}", note_id))]);

        self.client.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, links), fields(subsystem = "remote", component = "note_tags", op = "insert_links", row_count = links.len()))]
    async fn insert_links(&self, links: &[NoteTagLink]) -> Result<()> {
        if links.is_empty() {
            return Ok(());
        }

        let request = self.client.request(Method::POST, &self.url()).json(links);
        self.client.send(request).await?;

        debug!("Inserted join rows");
        Ok(())
    }
}
