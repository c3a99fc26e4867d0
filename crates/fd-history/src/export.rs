//! Serializable picture of a whole history.
//!
//! The engine has no file format of its own: `HistoryTree` derives serde so
//! the host can persist it with whatever format it already uses.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{HistoryError, Result};
use crate::id::{BranchId, StateId};
use crate::model::Branch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTree<T> {
    /// Branches in creation order.
    pub branches: Vec<Branch<T>>,
    pub active_branch_id: BranchId,
    pub current_state_index: usize,
    /// Next raw id value; keeps ids unique after import.
    pub next_id: u64,
}

impl<T> HistoryTree<T> {
    /// Check the structural invariants an imported tree must satisfy.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(HistoryError::InvalidTree(reason));

        if self.branches.is_empty() {
            return invalid("no branches".into());
        }

        let mut branch_ids = HashSet::new();
        let mut state_ids = HashSet::new();
        for branch in &self.branches {
            if !branch_ids.insert(branch.id) {
                return invalid(format!("duplicate {}", branch.id));
            }
            if branch.id.0 >= self.next_id {
                return invalid(format!("{} not below next id {}", branch.id, self.next_id));
            }
            if branch.states.is_empty() {
                return invalid(format!("{} has no states", branch.id));
            }
            for state in &branch.states {
                if state.branch_id != branch.id {
                    return invalid(format!(
                        "{} claims {} but lives in {}",
                        state.id, state.branch_id, branch.id
                    ));
                }
                if !state_ids.insert(state.id) {
                    return invalid(format!("duplicate id {}", state.id));
                }
                if state.id.0 >= self.next_id {
                    return invalid(format!("{} not below next id {}", state.id, self.next_id));
                }
            }
        }

        for branch in &self.branches {
            if state_ids.contains(&StateId(branch.id.0)) {
                return invalid(format!("duplicate id {}", branch.id));
            }
            match (branch.parent_branch_id, branch.parent_state_id) {
                (None, None) => {}
                (Some(parent), fork_state) => {
                    if !branch_ids.contains(&parent) {
                        return invalid(format!("{} forked from missing {parent}", branch.id));
                    }
                    // Forks are created after their parent, so parent ids
                    // strictly decrease up any lineage. This also rules out
                    // self-parenting and cycles.
                    if parent >= branch.id {
                        return invalid(format!("{} forked from later {parent}", branch.id));
                    }
                    // The fork state may since have been compressed or
                    // truncated out of the parent, but it predates the fork.
                    if let Some(state) = fork_state
                        && state.0 >= branch.id.0
                    {
                        return invalid(format!("{} forked at later {state}", branch.id));
                    }
                }
                (None, Some(state)) => {
                    return invalid(format!("{} has fork {state} but no parent", branch.id));
                }
            }
        }

        let Some(active) = self
            .branches
            .iter()
            .find(|b| b.id == self.active_branch_id)
        else {
            return invalid(format!("active {} missing", self.active_branch_id));
        };
        if self.current_state_index >= active.states.len() {
            return invalid(format!(
                "cursor {} out of range for {} states",
                self.current_state_index,
                active.states.len()
            ));
        }
        Ok(())
    }
}
