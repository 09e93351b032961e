//! # notekeep-sync
//!
//! Client-side synchronization for notekeep.
//!
//! This crate provides:
//! - `SyncController`: owns the note and tag collections, applies note
//!   updates and deletes optimistically, and reconciles by refetching
//! - `RelationSynchronizer`: replaces a note's tags through the join table
//! - A bounded mutation ledger and a broadcast event bus
//! - The edit-form save flow
//! - Tracing subscriber setup
//!
//! ## Example
//!
//! ```rust,ignore
//! use notekeep_core::{NoteDraft, NotePatch, Session};
//! use notekeep_remote::{RemoteConfig, SupabaseBackend};
//! use notekeep_sync::{telemetry, SyncController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let _guard = telemetry::init_tracing();
//!
//!     let session = Session::signed_in("user-id", "access-token");
//!     let backend = SupabaseBackend::connect(RemoteConfig::from_env()?, session.clone())?;
//!     let controller = SyncController::new(backend.into_store(), session);
//!
//!     controller.load_all().await?;
//!     let work = controller.create_tag("work").await?.into_value();
//!     let note = controller
//!         .create_note(NoteDraft::new("Quarterly review"), &[work])
//!         .await?
//!         .into_value();
//!     controller
//!         .update_note(&note.id, NotePatch::new().tags(vec![]))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod edit;
pub mod events;
pub mod mutation;
pub mod relations;
pub mod telemetry;

pub use controller::SyncController;
pub use edit::{EditError, ImageChange, NoteEdit};
pub use events::{EventBus, SyncEvent};
pub use mutation::{
    MutationKind, MutationLedger, MutationOutcome, MutationRecord, MutationState, Settlement,
};
pub use relations::RelationSynchronizer;
