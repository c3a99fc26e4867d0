//! Error types for history operations.
//!
//! Every mutating operation is transactional: when it returns one of these
//! errors, the manager is exactly as it was before the call. Hitting an
//! undo/redo boundary is not an error and is reported through `bool`.

use thiserror::Error;

use crate::id::{BranchId, StateId};

/// Errors that can occur during history operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// `create_branch` was called while branching is disabled in options.
    #[error("branching is disabled")]
    BranchingDisabled,

    /// No branch with this id exists.
    #[error("branch not found: {0}")]
    BranchNotFound(BranchId),

    /// No state with this id exists in the active branch.
    #[error("state not found in active branch: {0}")]
    StateNotFound(StateId),

    /// A branch cannot be merged into itself.
    #[error("cannot merge {0} into itself")]
    MergeIntoSelf(BranchId),

    /// The active branch cannot be deleted.
    #[error("cannot delete the active branch {0}")]
    ActiveBranch(BranchId),

    /// Other branches were forked from this one.
    #[error("{0} has forked branches")]
    BranchHasChildren(BranchId),

    /// An imported history tree failed validation.
    #[error("invalid history tree: {0}")]
    InvalidTree(String),
}

pub type Result<T, E = HistoryError> = std::result::Result<T, E>;
