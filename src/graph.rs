//! The block registry and every structural mutation of the block graph.
//!
//! [`BlockGraph`] owns all blocks. Attachments are stored as [`SocketRef`]
//! pairs on both sides, so blocks never hold references to one another and
//! every lookup goes through the registry.
//!
//! # Invariants
//!
//! 1. Every block has at least one socket; socket 0 is its root socket.
//! 2. Attachments are symmetric: if `a.peer == Some(b)` then `b.peer == Some(a)`.
//! 3. Following non-root attachments never revisits a block (the graph is a
//!    forest), and a block has at most one parent, reached through its root
//!    socket.
//! 4. Attach and detach are the only operations that create or remove
//!    attachments; both go through one arbitration point so each side
//!    changes exactly once and queues exactly one notification.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::codegen;
use crate::events::{EventQueue, GraphEvent};
use crate::geometry::Vec2;
use crate::model::{Block, BlockId, BlockKind, Container, ROOT, Socket, SocketRef};

#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    blocks: IndexMap<BlockId, Block>,
    next_id: u32,
    next_z: u64,
    events: EventQueue,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Registry
    // ────────────────────────────────────────────────────────────────────────

    /// Create a detached block and put it on top of the drawing order.
    pub fn insert(&mut self, kind: BlockKind, position: Vec2, container: Container, scale: f32) -> BlockId {
        self.next_id += 1;
        let id = BlockId(self.next_id);
        let mut block = Block::new(id, kind, position, container, scale);
        self.next_z += 1;
        block.z_order = self.next_z;
        debug!(block = %id, kind = block.kind.label(), "block created");
        self.blocks.insert(id, block);
        self.events.push(GraphEvent::BlockCreated { block: id });
        id
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.keys().copied()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.values()
    }

    pub fn socket(&self, s: SocketRef) -> Option<&Socket> {
        self.blocks.get(&s.block)?.sockets.get(s.index)
    }

    fn socket_mut(&mut self, s: SocketRef) -> Option<&mut Socket> {
        self.blocks.get_mut(&s.block)?.sockets.get_mut(s.index)
    }

    pub fn peer_of(&self, s: SocketRef) -> Option<SocketRef> {
        self.socket(s)?.peer
    }

    /// Socket references of `id`, in socket order.
    pub fn socket_refs(&self, id: BlockId) -> Vec<SocketRef> {
        match self.blocks.get(&id) {
            Some(block) => (0..block.sockets.len()).map(|i| SocketRef::new(id, i)).collect(),
            None => Vec::new(),
        }
    }

    pub fn set_position(&mut self, id: BlockId, position: Vec2) {
        if let Some(block) = self.blocks.get_mut(&id) {
            block.position = position;
        }
    }

    /// Move a block into another container, keeping its canvas position and
    /// adopting the container's scale factor.
    pub fn reparent(&mut self, id: BlockId, container: Container, scale: f32) {
        if let Some(block) = self.blocks.get_mut(&id) {
            trace!(block = %id, ?container, "reparent");
            block.container = container;
            block.scale = scale;
        }
    }

    /// Put a block on top of the drawing order.
    pub fn raise(&mut self, id: BlockId) {
        if let Some(block) = self.blocks.get_mut(&id) {
            self.next_z += 1;
            block.z_order = self.next_z;
        }
    }

    /// Mark a block as a template that leaves a copy behind when picked up.
    pub fn set_leave_copy(&mut self, id: BlockId, leave_copy: bool) {
        if let Some(block) = self.blocks.get_mut(&id) {
            block.leave_copy = leave_copy;
        }
    }

    /// Toggle the "being dragged" presentation state.
    pub fn set_dragging(&mut self, id: BlockId, dragging: bool) {
        if let Some(block) = self.blocks.get_mut(&id) {
            if block.dragging != dragging {
                block.dragging = dragging;
                self.events.push(GraphEvent::DragStateChanged { block: id, dragging });
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Notifications
    // ────────────────────────────────────────────────────────────────────────

    /// Take every queued notification, oldest first.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> &[GraphEvent] {
        self.events.pending()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Attachment arbitration
    // ────────────────────────────────────────────────────────────────────────

    /// Link two sockets on distinct blocks.
    ///
    /// Does nothing and returns false if either socket is missing, both
    /// belong to the same block, or either side is already attached. This
    /// only records the link; compatibility and proximity are checked by
    /// [`crate::attach`].
    pub fn attach(&mut self, a: SocketRef, b: SocketRef) -> bool {
        if a.block == b.block {
            return false;
        }
        let free = |s: SocketRef| self.socket(s).is_some_and(|s| !s.is_attached());
        if !free(a) || !free(b) {
            return false;
        }
        if let Some(sa) = self.socket_mut(a) {
            sa.peer = Some(b);
        }
        if let Some(sb) = self.socket_mut(b) {
            sb.peer = Some(a);
        }
        debug!(%a, %b, "attached");
        self.events.push(GraphEvent::AttachmentChanged { socket: a, peer: Some(b) });
        self.events.push(GraphEvent::AttachmentChanged { socket: b, peer: Some(a) });
        true
    }

    /// Unlink a socket from its peer, clearing both sides once.
    ///
    /// Returns the former peer, or `None` (and does nothing) if the socket
    /// was not attached.
    pub fn detach_socket(&mut self, s: SocketRef) -> Option<SocketRef> {
        let peer = self.socket_mut(s)?.peer.take()?;
        if let Some(ps) = self.socket_mut(peer) {
            debug_assert_eq!(ps.peer, Some(s), "one-sided attachment {s} -> {peer}");
            ps.peer = None;
        }
        debug!(socket = %s, %peer, "detached");
        self.events.push(GraphEvent::AttachmentChanged { socket: s, peer: None });
        self.events.push(GraphEvent::AttachmentChanged { socket: peer, peer: None });
        Some(peer)
    }

    /// Canvas position of a socket: owner position plus the socket offset
    /// scaled by the owner's container scale.
    pub fn absolute_position(&self, s: SocketRef) -> Option<Vec2> {
        let block = self.blocks.get(&s.block)?;
        let socket = block.sockets.get(s.index)?;
        Some(block.position + socket.offset * block.scale)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Subtree operations
    // ────────────────────────────────────────────────────────────────────────

    /// `id` followed by every block reachable through non-root sockets,
    /// depth-first in socket order. Empty if `id` is unknown.
    pub fn descending_blocks(&self, id: BlockId) -> Vec<BlockId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            debug_assert!(!out.contains(&current), "cycle through {current}");
            out.push(current);
            if let Some(block) = self.blocks.get(&current) {
                let children: Vec<BlockId> = block.children().collect();
                stack.extend(children.into_iter().rev());
            }
        }
        out
    }

    /// Translate `id` and its whole subtree by `delta`.
    pub fn apply_delta(&mut self, id: BlockId, delta: Vec2) {
        for b in self.descending_blocks(id) {
            if let Some(block) = self.blocks.get_mut(&b) {
                block.position += delta;
            }
        }
    }

    pub fn parent_of(&self, id: BlockId) -> Option<BlockId> {
        self.blocks.get(&id)?.parent()
    }

    /// Walk root sockets up to the top of the chain.
    pub fn tree_root(&self, id: BlockId) -> BlockId {
        let mut current = id;
        let mut hops = 0;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
            hops += 1;
            if hops > self.blocks.len() {
                break;
            }
        }
        current
    }

    /// Detach `id` from its parent and notify the former parent once.
    ///
    /// Returns the former parent.
    pub fn detach_block(&mut self, id: BlockId) -> Option<BlockId> {
        let previous = self.parent_of(id);
        self.detach_socket(SocketRef::root(id));
        if let Some(parent) = previous {
            self.hierarchy_changed(parent);
        }
        previous
    }

    /// Notify `id` and every ancestor above it that their subtree changed.
    ///
    /// Kinds that keep a program listing regenerate it as the notification
    /// passes through them.
    pub fn hierarchy_changed(&mut self, id: BlockId) {
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(b) = current {
            let Some(block) = self.blocks.get(&b) else {
                break;
            };
            let refresh = block.kind.keeps_listing();
            trace!(block = %b, "hierarchy changed");
            self.events.push(GraphEvent::HierarchyChanged { block: b });
            if refresh {
                let listing = codegen::code(self, b);
                if let Some(block) = self.blocks.get_mut(&b) {
                    block.listing = Some(listing);
                }
                self.events.push(GraphEvent::ProgramRefreshed { block: b });
            }
            current = self.parent_of(b);
            hops += 1;
            if hops > self.blocks.len() {
                break;
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Host lifecycle
    // ────────────────────────────────────────────────────────────────────────

    /// Instantiate a copy of a single block at the same place, in the same
    /// container, with fresh unattached sockets. Attached descendants stay
    /// with the original.
    pub fn duplicate(&mut self, id: BlockId) -> Option<BlockId> {
        let source = self.blocks.get(&id)?;
        let (kind, position, container, scale) =
            (source.kind.clone(), source.position, source.container, source.scale);
        let copy = self.insert(kind, position, container, scale);
        debug!(source = %id, %copy, "duplicated");
        Some(copy)
    }

    /// Remove `id` and its whole subtree from the graph.
    ///
    /// The root socket is detached first so the former parent is notified;
    /// returns the removed ids.
    pub fn destroy_subtree(&mut self, id: BlockId) -> Vec<BlockId> {
        let members = self.descending_blocks(id);
        if members.is_empty() {
            return members;
        }
        self.detach_block(id);
        for &b in &members {
            // Only links inside the subtree remain; drop the stale peer refs.
            if let Some(block) = self.blocks.shift_remove(&b) {
                debug_assert!(
                    block
                        .sockets
                        .iter()
                        .filter_map(|s| s.peer)
                        .all(|p| members.contains(&p.block)),
                    "{b} still linked outside its subtree"
                );
            }
            self.events.push(GraphEvent::BlockDestroyed { block: b });
        }
        debug!(root = %id, count = members.len(), "subtree destroyed");
        members
    }

    /// Links are symmetric, pair a root socket with a non-root one, and never
    /// form a cycle.
    pub fn is_consistent(&self) -> bool {
        for block in self.blocks.values() {
            if block.sockets.is_empty() {
                return false;
            }
            for (i, socket) in block.sockets.iter().enumerate() {
                if let Some(peer) = socket.peer {
                    let back = SocketRef::new(block.id, i);
                    if self.peer_of(peer) != Some(back) || peer.block == block.id {
                        return false;
                    }
                    if i != ROOT && peer.index != ROOT {
                        return false;
                    }
                }
            }
        }
        self.blocks.keys().all(|&id| self.is_acyclic_from(id))
    }

    fn is_acyclic_from(&self, id: BlockId) -> bool {
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                return false;
            }
            if let Some(block) = self.blocks.get(&current) {
                stack.extend(block.children());
            }
        }
        true
    }
}
