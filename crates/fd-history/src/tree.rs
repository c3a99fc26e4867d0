//! The branch forest.
//!
//! Branches live in a `StableDiGraph` so indices survive deletions; edges
//! run from a parent branch to each branch forked from it. An id index
//! keeps lookups O(1).

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::HashMap;

use crate::id::BranchId;
use crate::model::Branch;

#[derive(Debug, Clone)]
pub struct BranchTree<T> {
    graph: StableDiGraph<Branch<T>, ()>,
    id_index: HashMap<BranchId, NodeIndex>,
}

impl<T> BranchTree<T> {
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            id_index: HashMap::new(),
        }
    }

    /// Add a branch, linking it under its parent branch when that parent is
    /// present. Returns the new node's index.
    pub fn insert(&mut self, branch: Branch<T>) -> NodeIndex {
        let id = branch.id;
        let parent = branch.parent_branch_id.and_then(|p| self.index_of(p));
        let idx = self.graph.add_node(branch);
        if let Some(parent) = parent {
            self.graph.add_edge(parent, idx, ());
        }
        self.id_index.insert(id, idx);
        idx
    }

    /// Remove a branch, keeping the id index synchronized. Edges to forked
    /// children are dropped with it.
    pub fn remove(&mut self, id: BranchId) -> Option<Branch<T>> {
        let idx = self.id_index.remove(&id)?;
        self.graph.remove_node(idx)
    }

    pub fn index_of(&self, id: BranchId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: BranchId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Branch at a known-live node. Panics on a removed index.
    pub fn node(&self, idx: NodeIndex) -> &Branch<T> {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut Branch<T> {
        &mut self.graph[idx]
    }

    pub fn get(&self, id: BranchId) -> Option<&Branch<T>> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    pub fn get_mut(&mut self, id: BranchId) -> Option<&mut Branch<T>> {
        self.index_of(id).map(|idx| &mut self.graph[idx])
    }

    pub fn len(&self) -> usize {
        self.id_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_index.is_empty()
    }

    /// All branches, ordered by id (creation order).
    pub fn iter(&self) -> impl Iterator<Item = &Branch<T>> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by_key(|idx| self.graph[*idx].id);
        indices.into_iter().map(move |idx| &self.graph[idx])
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Branch<T>> {
        self.graph.node_weights_mut()
    }

    /// Ids of branches forked directly from `id`, in creation order.
    pub fn children(&self, id: BranchId) -> Vec<BranchId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut children: Vec<BranchId> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|child| self.graph[child].id)
            .collect();
        children.sort();
        children
    }

    /// `id` followed by each ancestor up to its root branch.
    pub fn lineage(&self, id: BranchId) -> Vec<BranchId> {
        let mut chain = Vec::new();
        let mut cursor = self.index_of(id);
        while let Some(idx) = cursor {
            chain.push(self.graph[idx].id);
            cursor = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .next();
        }
        chain
    }
}

impl<T> Default for BranchTree<T> {
    fn default() -> Self {
        Self::new()
    }
}
