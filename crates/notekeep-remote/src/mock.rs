//! In-memory mock backend for deterministic testing.
//!
//! Implements every remote trait over shared in-memory tables with the same
//! observable behavior as the real store: notes newest first, tags by name,
//! join rows checked against both tables, cascading deletes. Every call is
//! logged, failures can be injected per operation, and an operation can be
//! held at a gate so tests can observe state while a request is in flight.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notekeep_remote::mock::{MockBackend, MockOp};
//!
//! let backend = MockBackend::new("user-1");
//! let work = backend.seed_tag("work");
//! backend.fail_next(MockOp::UpdateNote);
//! let store = backend.store();
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use notekeep_core::defaults::IMAGE_BUCKET;
use notekeep_core::{
    ChecklistItem, CreateNoteRequest, Error, ImageStorage, Note, NotePatch, NoteRepository,
    NoteTagLink, NoteTagRepository, RemoteStore, Result, Tag, TagRepository,
};

/// Remote operation kinds, for call logs, failure injection, and gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    ListNotes,
    InsertNote,
    UpdateNote,
    DeleteNote,
    ListTags,
    CreateTag,
    RenameTag,
    DeleteTag,
    DeleteLinks,
    InsertLinks,
    Upload,
}

/// A recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub op: MockOp,
    /// Row id or object name the call targeted, if any.
    pub target: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredNote {
    id: String,
    title: String,
    description: Option<String>,
    color: Option<String>,
    image_url: Option<String>,
    checklist: Vec<ChecklistItem>,
    created_at: DateTime<Utc>,
    user_id: Option<String>,
}

#[derive(Default)]
struct MockState {
    notes: Vec<StoredNote>,
    tags: Vec<Tag>,
    links: Vec<NoteTagLink>,
    objects: HashMap<String, Vec<u8>>,
    calls: Vec<MockCall>,
    fail_next: HashMap<MockOp, usize>,
    fail_always: HashSet<MockOp>,
    clock: i64,
}

impl MockState {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
            + Duration::seconds(self.clock)
    }

    fn should_fail(&mut self, op: MockOp) -> bool {
        if self.fail_always.contains(&op) {
            return true;
        }
        match self.fail_next.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn resolve(&self, stored: &StoredNote) -> Note {
        let mut tags: Vec<Tag> = self
            .links
            .iter()
            .filter(|l| l.note_id == stored.id)
            .filter_map(|l| self.tags.iter().find(|t| t.id == l.tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Note {
            id: stored.id.clone(),
            title: stored.title.clone(),
            description: stored.description.clone(),
            color: stored.color.clone(),
            image_url: stored.image_url.clone(),
            checklist: stored.checklist.clone(),
            tags,
            created_at: stored.created_at,
            user_id: stored.user_id.clone(),
        }
    }
}

/// Mock backend implementing every remote trait. Clones share state.
#[derive(Clone)]
pub struct MockBackend {
    owner: Option<String>,
    public_base: String,
    state: Arc<Mutex<MockState>>,
    gates: Arc<Mutex<HashMap<MockOp, Arc<Notify>>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-user")
    }
}

impl MockBackend {
    /// Create an empty backend whose rows are owned by `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            public_base: format!("https://mock.storage/{}", IMAGE_BUCKET),
            state: Arc::new(Mutex::new(MockState::default())),
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Type-erased handle for the sync controller.
    pub fn store(&self) -> RemoteStore {
        RemoteStore::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
        )
    }

    // ─── Seeding ──────────────────────────────────────────────────────────

    /// Insert a tag directly, bypassing the call log.
    pub fn seed_tag(&self, name: &str) -> Tag {
        let tag = Tag {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            user_id: self.owner.clone(),
        };
        self.lock().tags.push(tag.clone());
        tag
    }

    /// Insert a note with the given tags directly, bypassing the call log.
    pub fn seed_note(&self, title: &str, tags: &[Tag]) -> Note {
        let mut state = self.lock();
        let created_at = state.tick();
        let stored = StoredNote {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: None,
            color: None,
            image_url: None,
            checklist: Vec::new(),
            created_at,
            user_id: self.owner.clone(),
        };
        for tag in tags {
            state.links.push(NoteTagLink::new(stored.id.clone(), tag.id.clone()));
        }
        state.notes.push(stored.clone());
        state.resolve(&stored)
    }

    // ─── Failure injection ────────────────────────────────────────────────

    /// Make the next call of `op` fail.
    pub fn fail_next(&self, op: MockOp) {
        *self.lock().fail_next.entry(op).or_insert(0) += 1;
    }

    /// Make every call of `op` fail until `recover` is called.
    pub fn fail_always(&self, op: MockOp) {
        self.lock().fail_always.insert(op);
    }

    /// Clear all injected failures.
    pub fn recover(&self) {
        let mut state = self.lock();
        state.fail_next.clear();
        state.fail_always.clear();
    }

    /// Hold calls of `op` after they are logged until the returned handle
    /// is notified. Each `notify_one` releases one call.
    pub fn gate(&self, op: MockOp) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(op, notify.clone());
        notify
    }

    // ─── Inspection ───────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn calls_for(&self, op: MockOp) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Server-side view of all notes, resolved like `list_with_tags`.
    pub fn notes(&self) -> Vec<Note> {
        let state = self.lock();
        let mut notes: Vec<Note> = state.notes.iter().map(|n| state.resolve(n)).collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }

    pub fn note(&self, id: &str) -> Option<Note> {
        let state = self.lock();
        state.notes.iter().find(|n| n.id == id).map(|n| state.resolve(n))
    }

    pub fn tags(&self) -> Vec<Tag> {
        let mut tags = self.lock().tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    /// Join rows, in insertion order.
    pub fn links(&self) -> Vec<NoteTagLink> {
        self.lock().links.clone()
    }

    /// Tag ids linked to a note, sorted.
    pub fn linked_tag_ids(&self, note_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lock()
            .links
            .iter()
            .filter(|l| l.note_id == note_id)
            .map(|l| l.tag_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Bytes stored under an object name.
    pub fn object(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(name).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    // ─── Call plumbing ────────────────────────────────────────────────────

    /// Log the call, wait at its gate if any, then apply failure injection.
    async fn enter(&self, op: MockOp, target: Option<&str>) -> Result<()> {
        self.lock().calls.push(MockCall {
            op,
            target: target.map(str::to_string),
        });

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&op)
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.lock().should_fail(op) {
            return Err(Error::Remote {
                status: 503,
                message: format!("injected failure for {:?}", op),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for MockBackend {
    async fn list_with_tags(&self) -> Result<Vec<Note>> {
        self.enter(MockOp::ListNotes, None).await?;
        Ok(self.notes())
    }

    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        self.enter(MockOp::InsertNote, None).await?;
        let mut state = self.lock();
        let created_at = state.tick();
        let stored = StoredNote {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            description: req.description,
            color: Some(req.color.value().to_string()),
            image_url: req.image_url,
            checklist: req.checklist,
            created_at,
            user_id: self.owner.clone(),
        };
        state.notes.push(stored.clone());
        Ok(state.resolve(&stored))
    }

    async fn update(&self, id: &str, patch: &NotePatch) -> Result<()> {
        self.enter(MockOp::UpdateNote, Some(id)).await?;
        let mut state = self.lock();
        if let Some(stored) = state.notes.iter_mut().find(|n| n.id == id) {
            if let Some(title) = &patch.title {
                stored.title = title.clone();
            }
            if let Some(description) = &patch.description {
                stored.description = description.clone();
            }
            if let Some(color) = patch.color {
                stored.color = Some(color.value().to_string());
            }
            if let Some(image_url) = &patch.image_url {
                stored.image_url = image_url.clone();
            }
            if let Some(checklist) = &patch.checklist {
                stored.checklist = checklist.clone();
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.enter(MockOp::DeleteNote, Some(id)).await?;
        let mut state = self.lock();
        state.notes.retain(|n| n.id != id);
        state.links.retain(|l| l.note_id != id);
        Ok(())
    }
}

#[async_trait]
impl TagRepository for MockBackend {
    async fn list(&self) -> Result<Vec<Tag>> {
        self.enter(MockOp::ListTags, None).await?;
        Ok(self.tags())
    }

    async fn create(&self, name: &str) -> Result<Tag> {
        self.enter(MockOp::CreateTag, None).await?;
        let tag = Tag {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            user_id: self.owner.clone(),
        };
        self.lock().tags.push(tag.clone());
        Ok(tag)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        self.enter(MockOp::RenameTag, Some(id)).await?;
        if let Some(tag) = self.lock().tags.iter_mut().find(|t| t.id == id) {
            tag.name = name.to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.enter(MockOp::DeleteTag, Some(id)).await?;
        let mut state = self.lock();
        state.tags.retain(|t| t.id != id);
        state.links.retain(|l| l.tag_id != id);
        Ok(())
    }
}

#[async_trait]
impl NoteTagRepository for MockBackend {
    async fn delete_for_note(&self, note_id: &str) -> Result<()> {
        self.enter(MockOp::DeleteLinks, Some(note_id)).await?;
        self.lock().links.retain(|l| l.note_id != note_id);
        Ok(())
    }

    async fn insert_links(&self, links: &[NoteTagLink]) -> Result<()> {
        let target = links.first().map(|l| l.note_id.clone());
        self.enter(MockOp::InsertLinks, target.as_deref()).await?;

        let mut state = self.lock();
        // The batch is all-or-nothing, like a single INSERT statement.
        for (i, link) in links.iter().enumerate() {
            let note_exists = state.notes.iter().any(|n| n.id == link.note_id);
            let tag_exists = state.tags.iter().any(|t| t.id == link.tag_id);
            if !note_exists || !tag_exists {
                return Err(Error::Remote {
                    status: 409,
                    message: format!(
                        "insert or update on table \"todo_tags\" violates foreign key constraint ({}, {})",
                        link.note_id, link.tag_id
                    ),
                });
            }
            if state.links.contains(link) || links[..i].contains(link) {
                return Err(Error::Remote {
                    status: 409,
                    message: "duplicate key value violates unique constraint \"todo_tags_pkey\""
                        .to_string(),
                });
            }
        }
        state.links.extend_from_slice(links);
        Ok(())
    }
}

#[async_trait]
impl ImageStorage for MockBackend {
    async fn upload(&self, object_name: &str, _content_type: &str, bytes: &[u8]) -> Result<String> {
        self.enter(MockOp::Upload, Some(object_name))
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        let mut state = self.lock();
        if state.objects.contains_key(object_name) {
            return Err(Error::Storage(format!(
                "Upload rejected (409): The resource already exists: {}",
                object_name
            )));
        }
        state.objects.insert(object_name.to_string(), bytes.to_vec());
        Ok(format!("{}/{}", self.public_base, object_name))
    }
}
