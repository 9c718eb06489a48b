//! Editor state: the block graph, the workspace and the drag session behind
//! one pointer-event facade.
//!
//! Hosts feed pointer events through [`EditorState::pointer_down`],
//! [`EditorState::pointer_move`] and [`EditorState::pointer_up`], then drain
//! notifications with [`EditorState::drain_events`] to redraw.

use crate::codegen;
use crate::config::EditorConfig;
use crate::drag::{DragSession, DropOutcome, PickUp};
use crate::events::GraphEvent;
use crate::geometry::Vec2;
use crate::graph::BlockGraph;
use crate::model::{BlockId, BlockKind, Container};
use crate::workspace::Workspace;

#[derive(Debug, Clone)]
pub struct EditorState {
    pub graph: BlockGraph,
    pub workspace: Workspace,
    pub session: DragSession,
    /// Whether the program changed since the last [`clear_dirty`](Self::clear_dirty).
    pub dirty: bool,
}

impl EditorState {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            graph: BlockGraph::new(),
            workspace: Workspace::new(),
            session: DragSession::new(config),
            dirty: false,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        self.session.config()
    }

    /// Create a block directly on the canvas.
    pub fn add_block(&mut self, kind: BlockKind, at: Vec2) -> BlockId {
        let scale = self.config().scale_for(Container::Canvas);
        let id = self.graph.insert(kind, at, Container::Canvas, scale);
        self.workspace.place(id);
        self.dirty = true;
        id
    }

    /// Create a palette template that leaves a copy behind when dragged.
    pub fn add_template(&mut self, kind: BlockKind, at: Vec2) -> BlockId {
        let scale = self.config().scale_for(Container::Palette);
        let id = self.graph.insert(kind, at, Container::Palette, scale);
        self.graph.set_leave_copy(id, true);
        id
    }

    pub fn pointer_down(&mut self, block: BlockId) -> Option<PickUp> {
        let pick = self.session.begin(&mut self.graph, &mut self.workspace, block);
        if pick.is_some_and(|p| p.former_parent.is_some()) {
            self.dirty = true;
        }
        pick
    }

    pub fn pointer_move(&mut self, pointer: Vec2) -> bool {
        self.session.drag_to(&mut self.graph, pointer)
    }

    pub fn pointer_up(&mut self, pointer: Vec2) -> Option<DropOutcome> {
        let outcome = self.session.end(&mut self.graph, &mut self.workspace, pointer);
        if outcome.is_some() {
            self.dirty = true;
        }
        outcome
    }

    /// Program text of every tree on the canvas, in placement order.
    pub fn programs(&self) -> Vec<(BlockId, String)> {
        self.workspace
            .roots(&self.graph)
            .map(|root| (root, codegen::code(&self.graph, root)))
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        self.graph.drain_events()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
