//! The sync controller.
//!
//! Owns the in-memory note and tag collections and mediates every mutation
//! against the remote store. Note updates and deletes are applied locally
//! first and reconciled by refetching; tag mutations go to the remote store
//! first and the tag collection is refreshed afterwards.
//!
//! Operations are not queued. Concurrent callers are fine: the state lock is
//! never held across a remote call, and whichever full load completes last
//! defines the local collections.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notekeep_core::defaults::{EVENT_CHANNEL_CAPACITY, MUTATION_LEDGER_CAPACITY};
use notekeep_core::{
    filter_by_tag, normalize_description, normalize_tag_name, normalize_title, CreateNoteRequest,
    Error, ImageUpload, Note, NoteDraft, NotePatch, RemoteStore, Result, Session, Tag,
};

use crate::events::{EventBus, SyncEvent};
use crate::mutation::{MutationKind, MutationLedger, MutationOutcome, MutationRecord, Settlement};
use crate::relations::RelationSynchronizer;

#[derive(Debug)]
struct SyncState {
    notes: Vec<Note>,
    tags: Vec<Tag>,
    loading: bool,
}

struct Inner {
    store: RemoteStore,
    session: Session,
    relations: RelationSynchronizer,
    state: RwLock<SyncState>,
    ledger: Mutex<MutationLedger>,
    events: EventBus,
}

/// Client-side owner of the note and tag collections. Cheap to clone; clones
/// share state.
#[derive(Clone)]
pub struct SyncController {
    inner: Arc<Inner>,
}

impl SyncController {
    /// Create a controller with empty collections and the loading flag set.
    pub fn new(store: RemoteStore, session: Session) -> Self {
        let relations = RelationSynchronizer::new(store.note_tags.clone());
        Self {
            inner: Arc::new(Inner {
                store,
                session,
                relations,
                state: RwLock::new(SyncState {
                    notes: Vec::new(),
                    tags: Vec::new(),
                    loading: true,
                }),
                ledger: Mutex::new(MutationLedger::new(MUTATION_LEDGER_CAPACITY)),
                events: EventBus::new(EVENT_CHANNEL_CAPACITY),
            }),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Snapshot of the note collection, newest first.
    pub async fn notes(&self) -> Vec<Note> {
        self.inner.state.read().await.notes.clone()
    }

    /// Snapshot of the tag collection, ordered by name.
    pub async fn tags(&self) -> Vec<Tag> {
        self.inner.state.read().await.tags.clone()
    }

    pub async fn note(&self, id: &str) -> Option<Note> {
        self.inner
            .state
            .read()
            .await
            .notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// Notes matching the tag filter; every note when `filter` is `None`.
    pub async fn visible_notes(&self, filter: Option<&str>) -> Vec<Note> {
        let state = self.inner.state.read().await;
        filter_by_tag(&state.notes, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// True until the first full load settles.
    pub async fn is_loading(&self) -> bool {
        self.inner.state.read().await.loading
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Whether the session may create notes. Informational; the remote store
    /// enforces access.
    pub fn can_create(&self) -> bool {
        self.inner.session.is_signed_in()
    }

    /// Whether the session owns the loaded note with this id.
    pub async fn can_edit(&self, note_id: &str) -> bool {
        let state = self.inner.state.read().await;
        state
            .notes
            .iter()
            .find(|n| n.id == note_id)
            .map(|n| self.inner.session.can_edit(n))
            .unwrap_or(false)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Most recent mutations, oldest first.
    pub async fn recent_mutations(&self) -> Vec<MutationRecord> {
        self.inner.ledger.lock().await.snapshot()
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Fetch tags and notes concurrently, replacing each collection that
    /// loads successfully. Clears the loading flag either way.
    #[instrument(skip(self), fields(subsystem = "sync", component = "controller", op = "load_all"))]
    pub async fn load_all(&self) -> Result<()> {
        let (tags, notes) = tokio::join!(self.refresh_tags(), self.refresh_notes());
        self.inner.state.write().await.loading = false;
        tags?;
        notes?;
        Ok(())
    }

    /// Replace the tag collection with the server's.
    pub async fn refresh_tags(&self) -> Result<()> {
        let tags = self.inner.store.tags.list().await.map_err(|e| {
            warn!(error = %e, "Failed to fetch tags");
            e
        })?;

        let count = tags.len();
        self.inner.state.write().await.tags = tags;
        debug!(count, "Tags reloaded");
        self.inner.events.emit(SyncEvent::TagsReloaded { count });
        Ok(())
    }

    /// Replace the note collection with the server's.
    pub async fn refresh_notes(&self) -> Result<()> {
        let notes = self.inner.store.notes.list_with_tags().await.map_err(|e| {
            warn!(error = %e, "Failed to fetch notes");
            e
        })?;

        let count = notes.len();
        self.inner.state.write().await.notes = notes;
        debug!(count, "Notes reloaded");
        self.inner.events.emit(SyncEvent::NotesReloaded { count });
        Ok(())
    }

    /// Full reload after a failed mutation. A failure here leaves local state
    /// as it was and is only logged.
    async fn reconcile(&self) {
        if let Err(e) = self.load_all().await {
            warn!(error = %e, "Reconciling reload failed");
        }
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    /// Upload the draft's image (if any), insert the note, then link `tags`.
    ///
    /// A tag-link failure does not undo the insert; it is reported through
    /// `MutationOutcome::partial_failure`. The note collection is refetched
    /// afterwards.
    #[instrument(skip(self, draft, tags), fields(subsystem = "sync", component = "controller", op = "create_note", tag_count = tags.len()))]
    pub async fn create_note(
        &self,
        draft: NoteDraft,
        tags: &[Tag],
    ) -> Result<MutationOutcome<Note>> {
        let title = normalize_title(&draft.title)?;
        let description = normalize_description(draft.description.as_deref());

        let mutation_id = self.begin(MutationKind::CreateNote, None).await;

        let image_url = match &draft.image {
            Some(image) => {
                let object_name = image.object_name();
                match self.upload_image(&object_name, image).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(error = %e, object = %object_name, "Image upload failed, note not created");
                        self.roll_back(mutation_id, &e).await;
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let request = CreateNoteRequest {
            title,
            description,
            color: draft.color,
            image_url,
            checklist: draft.checklist,
        };

        let mut note = match self.inner.store.notes.insert(request).await {
            Ok(note) => note,
            Err(e) => {
                warn!(error = %e, "Note insert failed");
                self.roll_back(mutation_id, &e).await;
                return Err(e);
            }
        };
        self.inner
            .ledger
            .lock()
            .await
            .set_target(mutation_id, note.id.clone());

        let partial_failure = match self.inner.relations.attach(&note.id, tags).await {
            Ok(()) => None,
            Err(e) => {
                warn!(note_id = %note.id, error = %e, "Note created but tag links failed");
                Some(format!("Failed to attach tags: {}", e))
            }
        };

        if let Err(e) = self.refresh_notes().await {
            warn!(error = %e, "Refetch after create failed");
        }
        if let Some(stored) = self.note(&note.id).await {
            note = stored;
        }

        info!(note_id = %note.id, partial = partial_failure.is_some(), "Note created");
        self.commit(mutation_id, partial_failure.clone()).await;

        Ok(MutationOutcome {
            value: note,
            mutation_id,
            partial_failure,
        })
    }

    /// Apply `patch` locally, then write its scalar fields remotely.
    ///
    /// When the patch carries a tag set, the join rows are replaced and a
    /// full reload follows regardless of the outcome. A failed scalar write
    /// triggers a full reload and is returned as the error.
    #[instrument(skip(self, patch), fields(subsystem = "sync", component = "controller", op = "update_note"))]
    pub async fn update_note(&self, id: &str, patch: NotePatch) -> Result<MutationOutcome<()>> {
        let patch = patch.normalized()?;
        let mutation_id = self
            .begin(MutationKind::UpdateNote, Some(id.to_string()))
            .await;

        {
            let mut state = self.inner.state.write().await;
            match state.notes.iter_mut().find(|n| n.id == id) {
                Some(note) => patch.apply_to(note),
                None => debug!(note_id = id, "Note not loaded, skipping local apply"),
            }
        }

        if patch.has_scalar_changes() {
            if let Err(e) = self.inner.store.notes.update(id, &patch).await {
                warn!(note_id = id, error = %e, "Note update failed, reloading");
                self.reconcile().await;
                self.roll_back(mutation_id, &e).await;
                return Err(e);
            }
        }

        let mut partial_failure = None;
        if let Some(tags) = &patch.tags {
            if let Err(e) = self.inner.relations.replace(id, tags).await {
                warn!(note_id = id, error = %e, "Tag relation update failed");
                partial_failure = Some(format!("Failed to update tags: {}", e));
            }
            self.reconcile().await;
        }

        self.commit(mutation_id, partial_failure.clone()).await;
        Ok(MutationOutcome {
            value: (),
            mutation_id,
            partial_failure,
        })
    }

    /// Remove the note locally, then delete it remotely. The note comes back
    /// through a full reload if the delete fails.
    #[instrument(skip(self), fields(subsystem = "sync", component = "controller", op = "delete_note"))]
    pub async fn delete_note(&self, id: &str) -> Result<MutationOutcome<()>> {
        let mutation_id = self
            .begin(MutationKind::DeleteNote, Some(id.to_string()))
            .await;

        self.inner.state.write().await.notes.retain(|n| n.id != id);

        if let Err(e) = self.inner.store.notes.delete(id).await {
            warn!(note_id = id, error = %e, "Note delete failed, reloading");
            self.reconcile().await;
            self.roll_back(mutation_id, &e).await;
            return Err(e);
        }

        info!(note_id = id, "Note deleted");
        self.commit(mutation_id, None).await;
        Ok(MutationOutcome {
            value: (),
            mutation_id,
            partial_failure: None,
        })
    }

    /// Upload image bytes under `object_name` and return the public reference.
    pub(crate) async fn upload_image(&self, object_name: &str, image: &ImageUpload) -> Result<String> {
        self.inner
            .store
            .images
            .upload(object_name, image.resolved_content_type(), &image.bytes)
            .await
    }

    // =========================================================================
    // TAGS
    // =========================================================================

    /// Create a tag. Names are not deduplicated.
    #[instrument(skip(self), fields(subsystem = "sync", component = "controller", op = "create_tag"))]
    pub async fn create_tag(&self, name: &str) -> Result<MutationOutcome<Tag>> {
        let name = normalize_tag_name(name)?;
        let mutation_id = self.begin(MutationKind::CreateTag, None).await;

        let tag = match self.inner.store.tags.create(&name).await {
            Ok(tag) => tag,
            Err(e) => {
                warn!(error = %e, "Tag create failed");
                self.roll_back(mutation_id, &e).await;
                return Err(e);
            }
        };
        self.inner
            .ledger
            .lock()
            .await
            .set_target(mutation_id, tag.id.clone());

        self.tags_changed().await;
        self.commit(mutation_id, None).await;
        Ok(MutationOutcome {
            value: tag,
            mutation_id,
            partial_failure: None,
        })
    }

    /// Rename a tag. Notes keep the old name until the next full load.
    #[instrument(skip(self), fields(subsystem = "sync", component = "controller", op = "rename_tag"))]
    pub async fn rename_tag(&self, id: &str, name: &str) -> Result<MutationOutcome<()>> {
        let name = normalize_tag_name(name)?;
        let mutation_id = self
            .begin(MutationKind::RenameTag, Some(id.to_string()))
            .await;

        if let Err(e) = self.inner.store.tags.rename(id, &name).await {
            warn!(tag_id = id, error = %e, "Tag rename failed");
            self.roll_back(mutation_id, &e).await;
            return Err(e);
        }

        self.tags_changed().await;
        self.commit(mutation_id, None).await;
        Ok(MutationOutcome {
            value: (),
            mutation_id,
            partial_failure: None,
        })
    }

    /// Delete a tag. Notes keep it in their tag list until the next full load.
    #[instrument(skip(self), fields(subsystem = "sync", component = "controller", op = "delete_tag"))]
    pub async fn delete_tag(&self, id: &str) -> Result<MutationOutcome<()>> {
        let mutation_id = self
            .begin(MutationKind::DeleteTag, Some(id.to_string()))
            .await;

        if let Err(e) = self.inner.store.tags.delete(id).await {
            warn!(tag_id = id, error = %e, "Tag delete failed");
            self.roll_back(mutation_id, &e).await;
            return Err(e);
        }

        self.tags_changed().await;
        self.commit(mutation_id, None).await;
        Ok(MutationOutcome {
            value: (),
            mutation_id,
            partial_failure: None,
        })
    }

    async fn tags_changed(&self) {
        if let Err(e) = self.refresh_tags().await {
            warn!(error = %e, "Refetch after tag change failed");
        }
        self.inner.events.emit(SyncEvent::TagsChanged);
    }

    // =========================================================================
    // LEDGER
    // =========================================================================

    async fn begin(&self, kind: MutationKind, target: Option<String>) -> Uuid {
        self.inner.ledger.lock().await.begin(kind, target)
    }

    async fn commit(&self, id: Uuid, partial_failure: Option<String>) {
        self.settle(id, Settlement::Committed { partial_failure }).await;
    }

    async fn roll_back(&self, id: Uuid, error: &Error) {
        self.settle(
            id,
            Settlement::RolledBack {
                error: error.to_string(),
            },
        )
        .await;
    }

    async fn settle(&self, id: Uuid, settlement: Settlement) {
        let record = self.inner.ledger.lock().await.settle(id, settlement);
        if let Some(record) = record {
            debug!(
                mutation_id = %record.id,
                kind = %record.kind,
                state = ?record.state,
                "Mutation settled"
            );
            self.inner.events.emit(SyncEvent::MutationSettled { record });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notekeep_remote::mock::{MockBackend, MockOp};

    fn controller(backend: &MockBackend) -> SyncController {
        SyncController::new(backend.store(), Session::signed_in("mock-user", "token"))
    }

    #[tokio::test]
    async fn test_new_controller_is_loading_and_empty() {
        let backend = MockBackend::default();
        let controller = controller(&backend);
        assert!(controller.is_loading().await);
        assert!(controller.notes().await.is_empty());
        assert!(controller.tags().await.is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_clears_loading_and_keeps_other_collection() {
        let backend = MockBackend::default();
        backend.seed_tag("work");
        backend.seed_note("n", &[]);
        backend.fail_next(MockOp::ListNotes);

        let controller = controller(&backend);
        assert!(controller.load_all().await.is_err());
        assert!(!controller.is_loading().await);
        assert_eq!(controller.tags().await.len(), 1);
        assert!(controller.notes().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_without_tags_skips_relations_and_reload() {
        let backend = MockBackend::default();
        let note = backend.seed_note("old", &[]);
        let controller = controller(&backend);
        controller.load_all().await.unwrap();
        backend.clear_calls();

        controller
            .update_note(&note.id, NotePatch::new().title("new"))
            .await
            .unwrap();

        assert_eq!(backend.calls_for(MockOp::UpdateNote), 1);
        assert_eq!(backend.calls_for(MockOp::DeleteLinks), 0);
        assert_eq!(backend.calls_for(MockOp::ListNotes), 0);
        assert_eq!(controller.note(&note.id).await.unwrap().title, "new");
    }

    #[tokio::test]
    async fn test_tags_only_patch_skips_scalar_update() {
        let backend = MockBackend::default();
        let tag = backend.seed_tag("a");
        let note = backend.seed_note("n", &[]);
        let controller = controller(&backend);
        controller.load_all().await.unwrap();
        backend.clear_calls();

        controller
            .update_note(&note.id, NotePatch::new().tags(vec![tag.clone()]))
            .await
            .unwrap();

        assert_eq!(backend.calls_for(MockOp::UpdateNote), 0);
        assert_eq!(backend.linked_tag_ids(&note.id), vec![tag.id]);
    }

    #[tokio::test]
    async fn test_ledger_records_settled_state() {
        let backend = MockBackend::default();
        let controller = controller(&backend);

        controller.create_tag("work").await.unwrap();
        backend.fail_next(MockOp::DeleteTag);
        assert!(controller.delete_tag("missing").await.is_err());

        let records = controller.recent_mutations().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, MutationKind::CreateTag);
        assert_eq!(
            records[0].state,
            crate::mutation::MutationState::Committed
        );
        assert!(records[0].target.is_some());
        assert_eq!(
            records[1].state,
            crate::mutation::MutationState::RolledBack
        );
    }

    #[tokio::test]
    async fn test_can_edit_requires_ownership() {
        let backend = MockBackend::new("owner");
        let note = backend.seed_note("n", &[]);

        let owner = SyncController::new(backend.store(), Session::signed_in("owner", "t"));
        owner.load_all().await.unwrap();
        assert!(owner.can_create());
        assert!(owner.can_edit(&note.id).await);
        assert!(!owner.can_edit("unknown").await);

        let guest = SyncController::new(backend.store(), Session::anonymous());
        guest.load_all().await.unwrap();
        assert!(!guest.can_create());
        assert!(!guest.can_edit(&note.id).await);
    }
}
