//! Registry of blocks currently placed on the canvas.

use indexmap::IndexSet;

use crate::graph::BlockGraph;
use crate::model::BlockId;

/// Blocks placed on the canvas, in placement order.
///
/// The drag session queries this once per drop to find snap candidates.
/// Palette templates and the block under the pointer are not in here.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    placed: IndexSet<BlockId>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block as placed. Re-placing keeps its original order.
    pub fn place(&mut self, id: BlockId) {
        self.placed.insert(id);
    }

    pub fn remove(&mut self, id: BlockId) -> bool {
        self.placed.shift_remove(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.placed.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Placed blocks in placement order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.placed.iter().copied()
    }

    /// Placed blocks without a parent, in placement order.
    pub fn roots<'a>(&'a self, graph: &'a BlockGraph) -> impl Iterator<Item = BlockId> + 'a {
        self.blocks().filter(|&id| graph.parent_of(id).is_none())
    }

    /// Forget blocks that no longer exist in `graph`.
    pub fn retain_existing(&mut self, graph: &BlockGraph) {
        self.placed.retain(|&id| graph.contains(id));
    }
}
