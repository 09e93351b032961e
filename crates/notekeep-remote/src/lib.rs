//! # notekeep-remote
//!
//! Remote adapters for notekeep.
//!
//! This crate provides:
//! - A `reqwest` client for the PostgREST data API (`todos`, `tags`,
//!   `todo_tags`) and the object storage API
//! - Repository implementations of the `notekeep-core` traits
//! - Environment-driven configuration
//! - An in-memory mock backend for tests (feature `mock`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use notekeep_core::Session;
//! use notekeep_remote::{RemoteConfig, SupabaseBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteConfig::from_env()?;
//!     let session = Session::signed_in("user-id", "access-token");
//!     let backend = SupabaseBackend::connect(config, session)?;
//!
//!     for tag in backend.tags.list().await? {
//!         println!("{}", tag.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
#[cfg(feature = "mock")]
pub mod mock;
pub mod note_tags;
pub mod notes;
pub mod storage;
pub mod tags;

use std::sync::Arc;

use notekeep_core::{RemoteStore, Result, Session};

pub use client::RestClient;
pub use config::RemoteConfig;
#[cfg(feature = "mock")]
pub use mock::{MockBackend, MockCall, MockOp};
pub use note_tags::RestNoteTagRepository;
pub use notes::RestNoteRepository;
pub use storage::RestImageStorage;
pub use tags::RestTagRepository;

/// Combined remote context with all repositories sharing one HTTP client.
#[derive(Clone)]
pub struct SupabaseBackend {
    /// Shared client, carrying the session's credentials.
    pub client: RestClient,
    /// Notes table.
    pub notes: RestNoteRepository,
    /// Tags table.
    pub tags: RestTagRepository,
    /// Note/tag join table.
    pub note_tags: RestNoteTagRepository,
    /// Image bucket.
    pub images: RestImageStorage,
}

impl SupabaseBackend {
    /// Build the HTTP client and every repository from configuration.
    pub fn connect(config: RemoteConfig, session: Session) -> Result<Self> {
        let client = RestClient::new(config, session)?;
        Ok(Self::new(client))
    }

    /// Create repositories on top of an existing client.
    pub fn new(client: RestClient) -> Self {
        Self {
            notes: RestNoteRepository::new(client.clone()),
            tags: RestTagRepository::new(client.clone()),
            note_tags: RestNoteTagRepository::new(client.clone()),
            images: RestImageStorage::new(client.clone()),
            client,
        }
    }

    /// Erase the concrete types for the sync controller.
    pub fn into_store(self) -> RemoteStore {
        RemoteStore::new(
            Arc::new(self.notes),
            Arc::new(self.tags),
            Arc::new(self.note_tags),
            Arc::new(self.images),
        )
    }
}
