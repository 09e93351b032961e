//! Mutation tracking.
//!
//! Every create/update/delete issued through the controller is recorded as
//! `Pending` when it starts and moves to `Committed` or `RolledBack` when it
//! settles. The ledger keeps only the most recent records.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle state of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    /// Issued, remote confirmation outstanding.
    Pending,
    /// The primary remote write succeeded. Secondary steps may still have
    /// failed; see `MutationRecord::partial_failure`.
    Committed,
    /// The primary remote write failed and local state was reset to server
    /// truth (or was never changed).
    RolledBack,
}

impl MutationState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, MutationState::Pending)
    }
}

/// What a mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    CreateNote,
    UpdateNote,
    DeleteNote,
    CreateTag,
    RenameTag,
    DeleteTag,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::CreateNote => "create_note",
            MutationKind::UpdateNote => "update_note",
            MutationKind::DeleteNote => "delete_note",
            MutationKind::CreateTag => "create_tag",
            MutationKind::RenameTag => "rename_tag",
            MutationKind::DeleteTag => "delete_tag",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationRecord {
    pub id: Uuid,
    pub kind: MutationKind,
    /// Note or tag id. Unknown for a note create until the insert returns.
    pub target: Option<String>,
    pub state: MutationState,
    /// Secondary step that failed after the primary write committed.
    pub partial_failure: Option<String>,
    /// Error that rolled the mutation back.
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl MutationRecord {
    fn begin(kind: MutationKind, target: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target,
            state: MutationState::Pending,
            partial_failure: None,
            error: None,
            started_at: Utc::now(),
            settled_at: None,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.partial_failure.is_some()
    }
}

/// How a mutation ended, passed to `MutationLedger::settle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Committed { partial_failure: Option<String> },
    RolledBack { error: String },
}

/// Bounded history of recent mutations, oldest first.
#[derive(Debug)]
pub struct MutationLedger {
    records: VecDeque<MutationRecord>,
    capacity: usize,
}

impl MutationLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record a new pending mutation and return its id.
    ///
    /// At capacity the oldest settled record is evicted. Pending records are
    /// never evicted, so the ledger grows past capacity while every record
    /// is still pending.
    pub fn begin(&mut self, kind: MutationKind, target: Option<String>) -> Uuid {
        let record = MutationRecord::begin(kind, target);
        let id = record.id;
        while self.records.len() >= self.capacity {
            match self.records.iter().position(|r| r.state.is_terminal()) {
                Some(index) => {
                    self.records.remove(index);
                }
                None => break,
            }
        }
        self.records.push_back(record);
        id
    }

    /// Fill in the target once it is known.
    pub fn set_target(&mut self, id: Uuid, target: impl Into<String>) {
        if let Some(record) = self.get_mut(id) {
            record.target = Some(target.into());
        }
    }

    /// Move a pending mutation to its terminal state. Returns the settled
    /// record, or `None` if it has already been evicted.
    pub fn settle(&mut self, id: Uuid, settlement: Settlement) -> Option<MutationRecord> {
        let record = self.get_mut(id)?;
        match settlement {
            Settlement::Committed { partial_failure } => {
                record.state = MutationState::Committed;
                record.partial_failure = partial_failure;
            }
            Settlement::RolledBack { error } => {
                record.state = MutationState::RolledBack;
                record.error = Some(error);
            }
        }
        record.settled_at = Some(Utc::now());
        Some(record.clone())
    }

    pub fn get(&self, id: Uuid) -> Option<&MutationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut MutationRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn snapshot(&self) -> Vec<MutationRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.state == MutationState::Pending)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of a mutation that committed.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub value: T,
    pub mutation_id: Uuid,
    /// Set when a secondary step (tag links) failed after the primary write.
    pub partial_failure: Option<String>,
}

impl<T> MutationOutcome<T> {
    pub fn is_partial(&self) -> bool {
        self.partial_failure.is_some()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_commit() {
        let mut ledger = MutationLedger::new(4);
        let id = ledger.begin(MutationKind::DeleteNote, Some("n1".to_string()));
        assert_eq!(ledger.pending_count(), 1);

        let record = ledger
            .settle(id, Settlement::Committed { partial_failure: None })
            .unwrap();
        assert_eq!(record.state, MutationState::Committed);
        assert!(record.settled_at.is_some());
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn test_rollback_keeps_error() {
        let mut ledger = MutationLedger::new(4);
        let id = ledger.begin(MutationKind::UpdateNote, Some("n1".to_string()));
        let record = ledger
            .settle(
                id,
                Settlement::RolledBack {
                    error: "boom".to_string(),
                },
            )
            .unwrap();
        assert_eq!(record.state, MutationState::RolledBack);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.state.is_terminal());
    }

    fn committed() -> Settlement {
        Settlement::Committed {
            partial_failure: None,
        }
    }

    #[test]
    fn test_ledger_evicts_oldest_settled() {
        let mut ledger = MutationLedger::new(2);
        let first = ledger.begin(MutationKind::CreateTag, None);
        ledger.settle(first, committed());
        let second = ledger.begin(MutationKind::RenameTag, None);
        ledger.settle(second, committed());
        ledger.begin(MutationKind::DeleteTag, None);

        assert_eq!(ledger.len(), 2);
        assert!(ledger.get(first).is_none());
        assert!(ledger.settle(first, committed()).is_none());
        let kinds: Vec<_> = ledger.snapshot().into_iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![MutationKind::RenameTag, MutationKind::DeleteTag]);
    }

    #[test]
    fn test_ledger_never_evicts_pending() {
        let mut ledger = MutationLedger::new(2);
        let slow = ledger.begin(MutationKind::UpdateNote, Some("n1".to_string()));
        for _ in 0..5 {
            let id = ledger.begin(MutationKind::CreateTag, None);
            ledger.settle(id, committed());
        }

        assert_eq!(ledger.len(), 2);
        let record = ledger.settle(slow, committed()).unwrap();
        assert_eq!(record.kind, MutationKind::UpdateNote);
        assert_eq!(record.state, MutationState::Committed);
    }

    #[test]
    fn test_ledger_grows_while_all_pending() {
        let mut ledger = MutationLedger::new(2);
        let ids: Vec<_> = (0..3)
            .map(|_| ledger.begin(MutationKind::DeleteNote, None))
            .collect();
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.pending_count(), 3);

        for id in &ids {
            assert!(ledger.settle(*id, committed()).is_some());
        }
        ledger.begin(MutationKind::DeleteNote, None);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pending_count(), 1);
    }

    #[test]
    fn test_set_target_after_begin() {
        let mut ledger = MutationLedger::new(4);
        let id = ledger.begin(MutationKind::CreateNote, None);
        ledger.set_target(id, "n7");
        assert_eq!(ledger.get(id).unwrap().target.as_deref(), Some("n7"));
    }

    #[test]
    fn test_partial_failure_recorded_on_commit() {
        let mut ledger = MutationLedger::new(4);
        let id = ledger.begin(MutationKind::CreateNote, None);
        let record = ledger
            .settle(
                id,
                Settlement::Committed {
                    partial_failure: Some("links failed".to_string()),
                },
            )
            .unwrap();
        assert_eq!(record.state, MutationState::Committed);
        assert!(record.is_partial());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_value(MutationKind::RenameTag).unwrap();
        assert_eq!(json, "rename_tag");
        assert_eq!(MutationKind::RenameTag.to_string(), "rename_tag");
    }
}
