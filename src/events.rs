//! Change notifications emitted by the block graph.
//!
//! Notifications are queued while the graph mutates and drained by the host
//! afterwards, so no callback ever runs in the middle of an attach or detach.

use serde::Serialize;

use crate::model::{BlockId, SocketRef};

/// A structural or presentation change the host may react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GraphEvent {
    BlockCreated { block: BlockId },
    BlockDestroyed { block: BlockId },
    /// A socket gained or lost its peer. `peer` is the new peer, `None` after
    /// a detach.
    AttachmentChanged { socket: SocketRef, peer: Option<SocketRef> },
    /// Something below `block` changed shape.
    HierarchyChanged { block: BlockId },
    /// A block that keeps a program listing regenerated it.
    ProgramRefreshed { block: BlockId },
    DragStateChanged { block: BlockId, dragging: bool },
}

/// FIFO of pending [`GraphEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GraphEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GraphEvent) {
        self.events.push(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending(&self) -> &[GraphEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_clears_queue() {
        let mut q = EventQueue::new();
        q.push(GraphEvent::BlockCreated { block: BlockId(1) });
        q.push(GraphEvent::HierarchyChanged { block: BlockId(1) });
        assert_eq!(q.pending().len(), 2);
        let drained = q.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], GraphEvent::BlockCreated { block: BlockId(1) });
        assert!(q.is_empty());
        assert!(q.drain().is_empty());
    }
}
