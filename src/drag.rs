//! Pick-up, move and drop of a block subtree.
//!
//! A [`DragSession`] is a small state machine driven by the host's pointer
//! events:
//!
//! ```text
//! Idle --begin--> Dragging --move--> Dragging --end--> Placed | Deleted --> Idle
//! ```
//!
//! Only one subtree can be dragged at a time. `begin` while dragging, and
//! `drag_to`/`end` while idle, are ignored.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut session = DragSession::new(EditorConfig::default());
//! session.begin(&mut graph, &mut workspace, block);
//! session.drag_to(&mut graph, Vec2::new(10.0, 10.0)); // baseline only
//! session.drag_to(&mut graph, Vec2::new(25.0, 12.0)); // moves by (15, 2)
//! let outcome = session.end(&mut graph, &mut workspace, Vec2::new(25.0, 12.0));
//! ```

use tracing::{debug, info};

use crate::attach::{Snap, try_attach_in_some_connection};
use crate::codegen;
use crate::config::EditorConfig;
use crate::geometry::Vec2;
use crate::graph::BlockGraph;
use crate::model::{BlockId, Container};
use crate::workspace::Workspace;

// ────────────────────────────────────────────────────────────────────────────
// States and outcomes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        block: BlockId,
        /// Previous pointer position; `None` until the first move event.
        last_pointer: Option<Vec2>,
    },
}

/// What happened when a drag started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickUp {
    pub block: BlockId,
    /// Copy left behind in place of a palette template.
    pub copy: Option<BlockId>,
    /// Parent the block was detached from.
    pub former_parent: Option<BlockId>,
}

/// How a drag ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Dropped inside the canvas, possibly snapped to another block.
    Placed {
        block: BlockId,
        snap: Option<Snap>,
        /// Top of the tree the block ended up in.
        root: BlockId,
        /// Program text of `root` after the drop.
        code: String,
    },
    /// Dropped outside the canvas; the whole subtree was destroyed.
    Deleted { removed: Vec<BlockId> },
}

// ────────────────────────────────────────────────────────────────────────────
// DragSession
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DragSession {
    phase: DragPhase,
    config: EditorConfig,
}

impl DragSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            phase: DragPhase::Idle,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// The block under the pointer, if a drag is active.
    pub fn dragged(&self) -> Option<BlockId> {
        match self.phase {
            DragPhase::Dragging { block, .. } => Some(block),
            DragPhase::Idle => None,
        }
    }

    /// Pick `block` up: leave a copy behind if it is a template, detach it
    /// from its parent, lift it into the floating layer and put its whole
    /// subtree on top in the "being dragged" state.
    pub fn begin(&mut self, graph: &mut BlockGraph, workspace: &mut Workspace, block: BlockId) -> Option<PickUp> {
        if self.is_dragging() || !graph.contains(block) {
            return None;
        }

        let was_placed = workspace.contains(block);
        let copy = self.leave_copy(graph, block);
        if let (Some(copy), true) = (copy, was_placed) {
            workspace.place(copy);
        }

        let former_parent = graph.detach_block(block);

        // The whole subtree floats so socket offsets inside it share one scale.
        for member in graph.descending_blocks(block) {
            graph.reparent(member, Container::Floating, self.config.floating_scale);
            workspace.remove(member);
            graph.raise(member);
            graph.set_dragging(member, true);
        }

        debug!(%block, ?copy, ?former_parent, "drag started");
        self.phase = DragPhase::Dragging {
            block,
            last_pointer: None,
        };
        Some(PickUp {
            block,
            copy,
            former_parent,
        })
    }

    fn leave_copy(&self, graph: &mut BlockGraph, block: BlockId) -> Option<BlockId> {
        let (leave, z_order) = graph.get(block).map(|b| (b.leave_copy, b.z_order))?;
        if !leave {
            return None;
        }
        let copy = graph.duplicate(block)?;
        graph.set_leave_copy(copy, true);
        graph.set_leave_copy(block, false);
        if let Some(c) = graph.get_mut(copy) {
            c.z_order = z_order;
        }
        Some(copy)
    }

    /// Follow the pointer. The first event only records a baseline; later
    /// events move the dragged subtree by the pointer delta.
    ///
    /// Returns true if anything moved.
    pub fn drag_to(&mut self, graph: &mut BlockGraph, pointer: Vec2) -> bool {
        let DragPhase::Dragging { block, last_pointer } = &mut self.phase else {
            return false;
        };
        let Some(last) = last_pointer.replace(pointer) else {
            return false;
        };
        let delta = pointer - last;
        graph.apply_delta(*block, delta);
        true
    }

    /// Drop the dragged subtree at `pointer`.
    ///
    /// Outside the canvas region the subtree is destroyed. Inside, it is put
    /// on the canvas where it is and offered to every placed block, in
    /// placement order, until one snap succeeds.
    pub fn end(&mut self, graph: &mut BlockGraph, workspace: &mut Workspace, pointer: Vec2) -> Option<DropOutcome> {
        let DragPhase::Dragging { block, .. } = std::mem::take(&mut self.phase) else {
            return None;
        };
        if !graph.contains(block) {
            return None;
        }

        if !self.config.canvas.contains(pointer) {
            let removed = graph.destroy_subtree(block);
            workspace.retain_existing(graph);
            info!(%block, count = removed.len(), "dropped outside canvas, subtree deleted");
            return Some(DropOutcome::Deleted { removed });
        }

        let subtree = graph.descending_blocks(block);
        for &member in &subtree {
            graph.reparent(member, Container::Canvas, self.config.canvas_scale);
            graph.set_dragging(member, false);
            workspace.place(member);
        }

        let candidates: Vec<BlockId> = workspace.blocks().filter(|id| !subtree.contains(id)).collect();
        let mut snap = None;
        for candidate in candidates {
            snap = try_attach_in_some_connection(graph, block, candidate, self.config.snap_radius);
            if snap.is_some() {
                break;
            }
        }

        let root = graph.tree_root(block);
        let code = codegen::code(graph, root);
        info!(%block, %root, snapped = snap.is_some(), "dropped on canvas");
        info!("{}", code);
        Some(DropOutcome::Placed {
            block,
            snap,
            root,
            code,
        })
    }
}
