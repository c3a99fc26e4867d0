//! The history engine.
//!
//! `HistoryManager` owns a forest of branches, each an append-only sequence
//! of snapshots, plus a cursor into the active branch. Undo and redo are pure
//! cursor moves. A push from mid-history discards the states after the
//! cursor (active branch only), joins or opens an edit batch, and then runs
//! the compression policy.
//!
//! Single writer by contract: every operation runs to completion and the
//! manager does no internal locking. Hosts that share it across threads
//! serialize access themselves.

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use std::fmt;

use crate::batch::Batcher;
use crate::clock::{Clock, SystemClock};
use crate::compress::compress_states;
use crate::error::{HistoryError, Result};
use crate::export::HistoryTree;
use crate::id::{BranchId, IdGen, StateId};
use crate::model::{Branch, BranchSummary, State, StateSummary};
use crate::naming::{SerializedSizeNamer, StateNamer, ordinal_name};
use crate::options::HistoryOptions;
use crate::tree::BranchTree;

/// Name of the branch a new manager starts on.
pub const ROOT_BRANCH_NAME: &str = "Main";

/// Name of the state built from the constructor's snapshot.
pub const INITIAL_STATE_NAME: &str = "Initial State";

pub struct HistoryManager<T> {
    tree: BranchTree<T>,
    /// Node of the active branch. Stable: the active branch is never removed.
    active: NodeIndex,
    current_state_index: usize,
    batcher: Batcher,
    ids: IdGen,
    options: HistoryOptions,
    namer: Box<dyn StateNamer<T>>,
    clock: Box<dyn Clock>,
}

impl<T: Clone + Serialize + 'static> HistoryManager<T> {
    /// Start a history whose only state is `initial`, on a branch named
    /// `"Main"`. Unnamed pushes are labelled by `SerializedSizeNamer`.
    pub fn new(initial: T, options: HistoryOptions) -> Self {
        Self::with_parts(initial, options, SerializedSizeNamer, SystemClock)
    }

    /// Like `new`, reading time from `clock`.
    pub fn with_clock(initial: T, options: HistoryOptions, clock: impl Clock + 'static) -> Self {
        Self::with_parts(initial, options, SerializedSizeNamer, clock)
    }

    /// Rebuild a manager from an exported tree.
    ///
    /// # Errors
    /// `InvalidTree` if the tree violates a structural invariant.
    pub fn import(tree: HistoryTree<T>, options: HistoryOptions) -> Result<Self> {
        Self::import_with_parts(tree, options, SerializedSizeNamer, SystemClock)
    }
}

impl<T: Clone> HistoryManager<T> {
    /// Start a history that labels unnamed pushes with `namer`.
    pub fn with_namer(
        initial: T,
        options: HistoryOptions,
        namer: impl StateNamer<T> + 'static,
    ) -> Self {
        Self::with_parts(initial, options, namer, SystemClock)
    }

    pub fn with_parts(
        initial: T,
        options: HistoryOptions,
        namer: impl StateNamer<T> + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let mut ids = IdGen::default();
        let branch_id = ids.branch();
        let now = clock.now_ms();
        let root = State {
            id: ids.state(),
            data: initial,
            name: INITIAL_STATE_NAME.to_string(),
            timestamp: now,
            batch_id: None,
            branch_id,
            is_checkpoint: false,
        };
        let mut tree = BranchTree::new();
        let active = tree.insert(Branch {
            id: branch_id,
            name: ROOT_BRANCH_NAME.to_string(),
            states: vec![root],
            parent_branch_id: None,
            parent_state_id: None,
            is_active: true,
            created_at: now,
        });

        Self {
            tree,
            active,
            current_state_index: 0,
            batcher: Batcher::new(options.batch_time_threshold_ms),
            ids,
            options,
            namer: Box::new(namer),
            clock: Box::new(clock),
        }
    }

    /// Rebuild a manager from an exported tree with a custom namer and clock.
    /// No batch is open after import.
    ///
    /// # Errors
    /// `InvalidTree` if the tree violates a structural invariant.
    pub fn import_with_parts(
        exported: HistoryTree<T>,
        options: HistoryOptions,
        namer: impl StateNamer<T> + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        exported.validate()?;

        let HistoryTree {
            mut branches,
            active_branch_id,
            current_state_index,
            next_id,
        } = exported;

        // Parents are always created before their forks.
        branches.sort_by_key(|b| b.id);
        let mut tree = BranchTree::new();
        let mut active = None;
        for mut branch in branches {
            branch.is_active = branch.id == active_branch_id;
            let idx = tree.insert(branch);
            if tree.node(idx).is_active {
                active = Some(idx);
            }
        }
        let active = active.ok_or_else(|| {
            HistoryError::InvalidTree(format!("active {active_branch_id} missing"))
        })?;

        log::debug!(
            "imported history: {} branches, active {active_branch_id}",
            tree.len()
        );

        Ok(Self {
            tree,
            active,
            current_state_index,
            batcher: Batcher::new(options.batch_time_threshold_ms),
            ids: IdGen::starting_at(next_id),
            options,
            namer: Box::new(namer),
            clock: Box::new(clock),
        })
    }

    // ─── Push ────────────────────────────────────────────────────────────

    /// Record `data` as the new current state of the active branch.
    ///
    /// States after the cursor are discarded first. Without a `name`, the
    /// label comes from the namer (when auto-naming is on) or is ordinal.
    pub fn push_state(&mut self, data: T, name: Option<&str>) -> StateId {
        let now = self.clock.now_ms();
        let batch_id = self.batcher.assign(now);
        let id = self.ids.state();
        let cursor = self.current_state_index;
        let branch = self.tree.node_mut(self.active);

        if cursor + 1 < branch.states.len() {
            log::trace!(
                "push from index {cursor} drops {} redo states on {}",
                branch.states.len() - cursor - 1,
                branch.id
            );
            branch.states.truncate(cursor + 1);
        }

        let index = branch.states.len();
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let auto = if self.options.auto_name_states {
                    self.namer.name(&branch.tip().data, &data)
                } else {
                    None
                };
                auto.unwrap_or_else(|| ordinal_name(index))
            }
        };
        let timestamp = now.max(branch.tip().timestamp);

        log::trace!("push {id} '{name}' into {batch_id} on {}", branch.id);
        branch.states.push(State {
            id,
            data,
            name,
            timestamp,
            batch_id: Some(batch_id),
            branch_id: branch.id,
            is_checkpoint: false,
        });

        // The new state sits in the recency window, so the remapped cursor
        // is the tip.
        let mut cursor = index;
        if self.options.enable_compression {
            cursor = compress_states(
                &mut branch.states,
                cursor,
                self.options.max_history_states as usize,
            );
        }
        self.current_state_index = cursor;
        id
    }

    /// Close the open batch so the next push starts a new one, e.g. at the
    /// end of a drag gesture.
    pub fn end_batch(&mut self) {
        self.batcher.close();
    }

    // ─── Undo / Redo ─────────────────────────────────────────────────────

    /// Step the cursor back one state. False at the branch root.
    pub fn undo(&mut self) -> bool {
        if self.current_state_index == 0 {
            return false;
        }
        self.current_state_index -= 1;
        true
    }

    /// Step the cursor forward one state. False at the branch tip.
    pub fn redo(&mut self) -> bool {
        if self.current_state_index + 1 >= self.active_branch().len() {
            return false;
        }
        self.current_state_index += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.current_state_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_state_index + 1 < self.active_branch().len()
    }

    /// Step back over the whole batch containing the current state, landing
    /// on the last state before it. False if that batch starts at the root.
    pub fn undo_batch(&mut self) -> bool {
        let start = batch_run_start(&self.active_branch().states, self.current_state_index);
        if start == 0 {
            return false;
        }
        self.current_state_index = start - 1;
        true
    }

    /// Step forward to the last state of the next batch. False at the tip.
    pub fn redo_batch(&mut self) -> bool {
        let states = &self.active_branch().states;
        if self.current_state_index + 1 >= states.len() {
            return false;
        }
        self.current_state_index = batch_run_end(states, self.current_state_index + 1);
        true
    }

    // ─── Checkpoints & navigation ────────────────────────────────────────

    /// Mark the current state as a checkpoint and rename it. Checkpoints
    /// survive compression for as long as their branch exists.
    pub fn create_checkpoint(&mut self, name: &str) -> StateId {
        let cursor = self.current_state_index;
        let state = &mut self.tree.node_mut(self.active).states[cursor];
        state.is_checkpoint = true;
        state.name = name.to_string();
        log::debug!("checkpoint '{name}' at {}", state.id);
        state.id
    }

    /// Move the cursor to `id` within the active branch.
    ///
    /// # Errors
    /// `StateNotFound` if the active branch has no such state; the cursor
    /// does not move.
    pub fn go_to_state(&mut self, id: StateId) -> Result<()> {
        let index = self
            .active_branch()
            .index_of(id)
            .ok_or(HistoryError::StateNotFound(id))?;
        self.current_state_index = index;
        Ok(())
    }

    // ─── Branches ────────────────────────────────────────────────────────

    /// Fork a new branch from the current state and make it active.
    ///
    /// The new branch starts with a copy of the current state, marked as a
    /// checkpoint, and records where it was forked from.
    ///
    /// # Errors
    /// `BranchingDisabled` if `enable_branching` is off.
    pub fn create_branch(&mut self, name: &str) -> Result<BranchId> {
        if !self.options.enable_branching {
            return Err(HistoryError::BranchingDisabled);
        }

        let now = self.clock.now_ms();
        let source = self.tree.node(self.active);
        let source_id = source.id;
        let fork_point = &source.states[self.current_state_index];
        let (fork_state_id, data, state_name) =
            (fork_point.id, fork_point.data.clone(), fork_point.name.clone());

        let branch_id = self.ids.branch();
        let root = State {
            id: self.ids.state(),
            data,
            name: state_name,
            timestamp: now,
            batch_id: None,
            branch_id,
            is_checkpoint: true,
        };

        for branch in self.tree.iter_mut() {
            branch.is_active = false;
        }
        self.active = self.tree.insert(Branch {
            id: branch_id,
            name: name.to_string(),
            states: vec![root],
            parent_branch_id: Some(source_id),
            parent_state_id: Some(fork_state_id),
            is_active: true,
            created_at: now,
        });
        self.current_state_index = 0;
        self.batcher.close();

        log::debug!("created {branch_id} '{name}' from {source_id} at {fork_state_id}");
        Ok(branch_id)
    }

    /// Make `id` the active branch, resuming at its tip.
    ///
    /// # Errors
    /// `BranchNotFound` for an unknown id.
    pub fn switch_branch(&mut self, id: BranchId) -> Result<()> {
        let idx = self
            .tree
            .index_of(id)
            .ok_or(HistoryError::BranchNotFound(id))?;

        for branch in self.tree.iter_mut() {
            branch.is_active = branch.id == id;
        }
        self.active = idx;
        self.current_state_index = self.tree.node(idx).len() - 1;
        self.batcher.close();

        log::debug!("switched to {id}");
        Ok(())
    }

    /// Copy the tip of `source_id` onto the active branch as a new
    /// checkpointed tip named "Merged from <source>", and move there.
    ///
    /// Last-write-wins: the snapshots are not reconciled.
    ///
    /// # Errors
    /// `BranchNotFound` for an unknown source, `MergeIntoSelf` when the
    /// source is the active branch.
    pub fn merge_branch(&mut self, source_id: BranchId) -> Result<StateId> {
        let src_idx = self
            .tree
            .index_of(source_id)
            .ok_or(HistoryError::BranchNotFound(source_id))?;
        if src_idx == self.active {
            return Err(HistoryError::MergeIntoSelf(source_id));
        }

        let source = self.tree.node(src_idx);
        let data = source.tip().data.clone();
        let name = format!("Merged from {}", source.name);

        let now = self.clock.now_ms();
        let id = self.ids.state();
        let target = self.tree.node_mut(self.active);
        let timestamp = now.max(target.tip().timestamp);
        target.states.push(State {
            id,
            data,
            name,
            timestamp,
            batch_id: None,
            branch_id: target.id,
            is_checkpoint: true,
        });

        let mut cursor = target.states.len() - 1;
        if self.options.enable_compression {
            cursor = compress_states(
                &mut target.states,
                cursor,
                self.options.max_history_states as usize,
            );
        }
        self.current_state_index = cursor;
        self.batcher.close();

        log::debug!("merged {source_id} into {} as {id}", target.id);
        Ok(id)
    }

    /// # Errors
    /// `BranchNotFound` for an unknown id.
    pub fn rename_branch(&mut self, id: BranchId, name: &str) -> Result<()> {
        let branch = self
            .tree
            .get_mut(id)
            .ok_or(HistoryError::BranchNotFound(id))?;
        branch.name = name.to_string();
        Ok(())
    }

    /// Remove a branch and every state it owns, checkpoints included.
    ///
    /// # Errors
    /// `BranchNotFound` for an unknown id, `ActiveBranch` for the active
    /// branch, `BranchHasChildren` when other branches were forked from it.
    pub fn delete_branch(&mut self, id: BranchId) -> Result<Branch<T>> {
        if !self.tree.contains(id) {
            return Err(HistoryError::BranchNotFound(id));
        }
        if id == self.active_branch_id() {
            return Err(HistoryError::ActiveBranch(id));
        }
        if !self.tree.children(id).is_empty() {
            return Err(HistoryError::BranchHasChildren(id));
        }
        let removed = self
            .tree
            .remove(id)
            .ok_or(HistoryError::BranchNotFound(id))?;
        log::debug!("deleted {id} ({} states)", removed.len());
        Ok(removed)
    }

    /// Branches forked directly from `id`.
    pub fn children(&self, id: BranchId) -> Vec<BranchId> {
        self.tree.children(id)
    }

    /// `id` and its ancestors, nearest first. Empty for an unknown id.
    pub fn lineage(&self, id: BranchId) -> Vec<BranchId> {
        self.tree.lineage(id)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn current_data(&self) -> &T {
        &self.current_state().data
    }

    pub fn current_state(&self) -> &State<T> {
        &self.active_branch().states[self.current_state_index]
    }

    pub fn current_state_index(&self) -> usize {
        self.current_state_index
    }

    pub fn active_branch_id(&self) -> BranchId {
        self.active_branch().id
    }

    pub fn active_branch(&self) -> &Branch<T> {
        self.tree.node(self.active)
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch<T>> {
        self.tree.get(id)
    }

    /// Summaries of every branch in creation order.
    pub fn branches(&self) -> Vec<BranchSummary> {
        self.tree.iter().map(Branch::summary).collect()
    }

    /// Summaries of the active branch's states, oldest first.
    pub fn history(&self) -> Vec<StateSummary> {
        self.active_branch()
            .states
            .iter()
            .enumerate()
            .map(|(i, s)| s.summary(i, i == self.current_state_index))
            .collect()
    }

    pub fn options(&self) -> &HistoryOptions {
        &self.options
    }

    /// Replace the options. A lower ceiling takes effect at the next push.
    pub fn set_options(&mut self, options: HistoryOptions) {
        self.batcher.set_threshold(options.batch_time_threshold_ms);
        self.options = options;
    }

    /// Copy the whole branch forest into a serializable tree.
    pub fn export(&self) -> HistoryTree<T> {
        HistoryTree {
            branches: self.tree.iter().cloned().collect(),
            active_branch_id: self.active_branch_id(),
            current_state_index: self.current_state_index,
            next_id: self.ids.peek(),
        }
    }
}

impl<T> fmt::Debug for HistoryManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("active", &self.tree.node(self.active).id)
            .field("current_state_index", &self.current_state_index)
            .field("branches", &self.tree.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// First index of the run of states sharing `states[at]`'s batch.
fn batch_run_start<T>(states: &[State<T>], at: usize) -> usize {
    let Some(batch) = states[at].batch_id else {
        return at;
    };
    let mut start = at;
    while start > 0 && states[start - 1].batch_id == Some(batch) {
        start -= 1;
    }
    start
}

/// Last index of the run of states sharing `states[at]`'s batch.
fn batch_run_end<T>(states: &[State<T>], at: usize) -> usize {
    let Some(batch) = states[at].batch_id else {
        return at;
    };
    let mut end = at;
    while end + 1 < states.len() && states[end + 1].batch_id == Some(batch) {
        end += 1;
    }
    end
}
