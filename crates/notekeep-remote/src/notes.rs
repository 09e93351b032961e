//! Note repository over the `todos` table.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};

use notekeep_core::defaults::{NOTES_TABLE, NOTE_ORDER, NOTE_SELECT_WITH_TAGS};
use notekeep_core::{CreateNoteRequest, Error, Note, NotePatch, NoteRepository, Result, Tag};

use crate::client::RestClient;

/// One element of the `todo_tags(tag:tags(*))` expansion. `tag` is null when
/// the join row points at a tag the caller cannot see.
#[derive(Debug, Deserialize)]
struct TagExpansion {
    #[serde(default)]
    tag: Option<Tag>,
}

/// A `todos` row with its join expansion.
#[derive(Debug, Deserialize)]
struct NoteRow {
    #[serde(flatten)]
    note: Note,
    #[serde(default)]
    todo_tags: Option<Vec<TagExpansion>>,
}

impl NoteRow {
    fn into_note(self) -> Note {
        let mut note = self.note;
        note.tags = self
            .todo_tags
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| t.tag)
            .collect();
        note
    }
}

/// PostgREST implementation of NoteRepository.
#[derive(Clone)]
pub struct RestNoteRepository {
    client: RestClient,
}

impl RestNoteRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn url(&self) -> String {
        self.client.table_url(NOTES_TABLE)
    }
}

#[async_trait]
impl NoteRepository for RestNoteRepository {
    #[instrument(skip(self), fields(subsystem = "remote", component = "notes", op = "list_with_tags"))]
    async fn list_with_tags(&self) -> Result<Vec<Note>> {
        let request = self
            .client
            .request(Method::GET, &self.url())
            .query(&[("select", NOTE_SELECT_WITH_TAGS), ("order", NOTE_ORDER)]);

        let rows: Vec<NoteRow> = self.client.send(request).await?.json().await?;
        debug!(row_count = rows.len(), "Fetched notes");

        Ok(rows.into_iter().map(NoteRow::into_note).collect())
    }

    #[instrument(skip(self, req), fields(subsystem = "remote", component = "notes", op = "insert"))]
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let request = self
            .client
            .request(Method::POST, &self.url())
            .header("Prefer", "return=representation")
            .json(&[req]);

        let mut rows: Vec<Note> = self.client.send(request).await?.json().await?;
        if rows.is_empty() {
            return Err(Error::Internal("Note insert returned no row".to_string()));
        }
        let note = rows.swap_remove(0);
        debug!(note_id = %note.id, "Inserted note");
        Ok(note)
    }

    #[instrument(skip(self, patch), fields(subsystem = "remote", component = "notes", op = "update"))]
    async fn update(&self, id: &str, patch: &NotePatch) -> Result<()> {
        let request = self
            .client
            .request(Method::PATCH, &self.url())
            .query(&[("id", format!("eq.{}", id))])
            .json(patch);

        self.client.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "remote", component = "notes", op = "delete"))]
    async fn delete(&self, id: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &self.url())
            .query(&[("id", format!("eq.{}", id))]);

        self.client.send(request).await?;
        Ok(())
    }
}
