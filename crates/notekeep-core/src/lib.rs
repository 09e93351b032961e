//! # notekeep-core
//!
//! Core types, traits, and abstractions for the notekeep client.
//!
//! This crate provides the data model shared by the remote adapters and the
//! sync controller, together with the repository traits that the remote
//! backends implement.

pub mod checklist;
pub mod defaults;
pub mod error;
pub mod filter;
pub mod models;
pub mod palette;
pub mod selection;
pub mod session;
pub mod traits;

// Re-export commonly used types at crate root
pub use checklist::Checklist;
pub use error::{Error, Result};
pub use filter::{filter_by_tag, note_has_tag};
pub use models::*;
pub use palette::NoteColor;
pub use selection::{search_tags, TagSelection};
pub use session::Session;
pub use traits::*;
