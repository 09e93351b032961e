//! Centralized default constants for notekeep.
//!
//! Table names and bucket names must match the remote schema; the remaining
//! values are client-side tuning knobs.

// =============================================================================
// REMOTE SCHEMA
// =============================================================================

/// Table holding note rows.
pub const NOTES_TABLE: &str = "todos";

/// Table holding tag rows.
pub const TAGS_TABLE: &str = "tags";

/// Join table between notes and tags.
pub const NOTE_TAGS_TABLE: &str = "todo_tags";

/// Select expression that expands each note's tags through the join table.
pub const NOTE_SELECT_WITH_TAGS: &str = "*,todo_tags(tag:tags(*))";

/// Ordering applied when listing tags.
pub const TAG_ORDER: &str = "name.asc";

/// Ordering applied when listing notes (newest first).
pub const NOTE_ORDER: &str = "created_at.desc";

// =============================================================================
// STORAGE
// =============================================================================

/// Bucket for note image attachments.
pub const IMAGE_BUCKET: &str = "task-images";

/// File name given to canvas drawings before upload.
pub const DRAWING_FILE_NAME: &str = "drawing.png";

/// Content type of canvas drawings.
pub const DRAWING_CONTENT_TYPE: &str = "image/png";

/// Content type used when the caller does not provide one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

// =============================================================================
// HTTP
// =============================================================================

/// Request timeout for the data and storage APIs, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// SYNC
// =============================================================================

/// Number of settled mutations kept in the controller's ledger.
pub const MUTATION_LEDGER_CAPACITY: usize = 64;

/// Capacity of the sync event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 128;
