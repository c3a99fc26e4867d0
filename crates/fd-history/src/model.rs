//! History data model: states and the branches that own them.

use serde::{Deserialize, Serialize};

use crate::id::{BatchId, BranchId, StateId};

/// A single point in history.
///
/// `data` is an owned copy of the caller's snapshot; the engine never
/// aliases caller-owned state and never mutates `data` after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State<T> {
    pub id: StateId,
    pub data: T,
    pub name: String,
    /// Milliseconds since the Unix epoch (or the host clock's origin).
    pub timestamp: u64,
    /// `None` for branch roots and merge tips.
    pub batch_id: Option<BatchId>,
    pub branch_id: BranchId,
    pub is_checkpoint: bool,
}

/// An ordered, never-empty timeline of states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch<T> {
    pub id: BranchId,
    pub name: String,
    /// Index 0 is the branch root and survives compression.
    pub states: Vec<State<T>>,
    pub parent_branch_id: Option<BranchId>,
    pub parent_state_id: Option<StateId>,
    pub is_active: bool,
    pub created_at: u64,
}

impl<T> Branch<T> {
    /// The most recent state.
    pub fn tip(&self) -> &State<T> {
        // `states` is never empty
        &self.states[self.states.len() - 1]
    }

    pub fn root(&self) -> &State<T> {
        &self.states[0]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false for a well-formed branch.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn index_of(&self, id: StateId) -> Option<usize> {
        self.states.iter().position(|s| s.id == id)
    }

    pub fn checkpoint_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_checkpoint).count()
    }

    pub fn summary(&self) -> BranchSummary {
        BranchSummary {
            id: self.id,
            name: self.name.clone(),
            state_count: self.states.len(),
            checkpoint_count: self.checkpoint_count(),
            parent_branch_id: self.parent_branch_id,
            parent_state_id: self.parent_state_id,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Snapshot-free description of a branch, for branch pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSummary {
    pub id: BranchId,
    pub name: String,
    pub state_count: usize,
    pub checkpoint_count: usize,
    pub parent_branch_id: Option<BranchId>,
    pub parent_state_id: Option<StateId>,
    pub is_active: bool,
    pub created_at: u64,
}

/// Snapshot-free description of one state, for history panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub id: StateId,
    pub index: usize,
    pub name: String,
    pub timestamp: u64,
    pub batch_id: Option<BatchId>,
    pub is_checkpoint: bool,
    pub is_current: bool,
}

impl<T> State<T> {
    pub fn summary(&self, index: usize, is_current: bool) -> StateSummary {
        StateSummary {
            id: self.id,
            index,
            name: self.name.clone(),
            timestamp: self.timestamp,
            batch_id: self.batch_id,
            is_checkpoint: self.is_checkpoint,
            is_current,
        }
    }
}
