//! Core data model.
//!
//! A work item is one image conversion: a source file, a resolved
//! destination path, and a stored status. "Running" is never stored.
//! It is derived from the dispatcher's assignment map, so stored state
//! cannot drift out of sync with what the pool is actually doing.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// One conversion job tracked by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Stable identifier. Allocated by the store, never reused.
    pub id: WorkId,

    /// Source file path. Accepted as-is; never validated against the
    /// filesystem.
    pub source: String,

    /// Destination path, computed from the destination template.
    pub destination: String,

    /// Stored lifecycle status.
    pub status: Status,
}

/// Newtype for work item IDs.
///
/// Plain monotonic integers rather than references into the store: the
/// assignment map holds IDs, so an item removed mid-flight simply fails
/// lookup instead of dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkId(pub u64);

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Stored status of a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    /// Queued, not yet picked up by a slot.
    Waiting,
    /// Converted successfully.
    Ok,
    /// Conversion failed; carries the captured diagnostic output.
    Failed { error: String },
}

impl Status {
    /// Is this a terminal status?
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Ok | Status::Failed { .. })
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Waiting => write!(f, "waiting"),
            Status::Ok => write!(f, "ok"),
            Status::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Status as seen by callers: stored status plus the derived Running state
/// for items currently held by a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EffectiveStatus {
    Waiting,
    Running,
    Ok,
    Failed { error: String },
}

impl EffectiveStatus {
    pub(crate) fn from_stored(status: &Status, in_flight: bool) -> Self {
        match status {
            Status::Waiting if in_flight => EffectiveStatus::Running,
            Status::Waiting => EffectiveStatus::Waiting,
            Status::Ok => EffectiveStatus::Ok,
            Status::Failed { error } => EffectiveStatus::Failed {
                error: error.clone(),
            },
        }
    }
}

impl std::fmt::Display for EffectiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectiveStatus::Waiting => write!(f, "waiting"),
            EffectiveStatus::Running => write!(f, "running"),
            EffectiveStatus::Ok => write!(f, "ok"),
            EffectiveStatus::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// A caller-facing snapshot of one item, status fully resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemView {
    pub id: WorkId,
    pub source: String,
    pub destination: String,
    pub status: EffectiveStatus,
}
