//! Snap search: deciding when two sockets may attach and correcting
//! positions so they line up exactly.
//!
//! A pair of sockets is eligible when
//!
//! 1. their socket kinds are complementary (male with female),
//! 2. their connection kinds are equal,
//! 3. both are unattached,
//! 4. exactly one of them is a root socket (root-root never mates, and two
//!    non-root sockets would make each block the other's child),
//! 5. their canvas distance is strictly below the snap radius,
//! 6. the prospective parent is not already inside the prospective child's
//!    subtree.
//!
//! On success the child side moves: the subtree owning the root socket is
//! translated so its root socket lands on the other socket.

use std::fmt;

use tracing::{debug, trace};

use crate::geometry::Vec2;
use crate::graph::BlockGraph;
use crate::model::{BlockId, SocketRef};

/// Default maximum distance, in canvas units, at which two sockets snap.
pub const SNAP_RADIUS: f32 = 20.0;

/// Why a socket pair was not eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingSocket,
    SameBlock,
    SameSocketKind,
    ConnectionMismatch,
    AlreadyAttached,
    RootToRoot,
    NoRootSocket,
    OutOfRange,
    WouldCycle,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::MissingSocket => "socket does not exist",
            Rejection::SameBlock => "both sockets belong to the same block",
            Rejection::SameSocketKind => "socket kinds are not complementary",
            Rejection::ConnectionMismatch => "connection kinds differ",
            Rejection::AlreadyAttached => "a socket is already attached",
            Rejection::RootToRoot => "root sockets cannot attach to each other",
            Rejection::NoRootSocket => "neither socket is a root socket",
            Rejection::OutOfRange => "sockets are outside the snap radius",
            Rejection::WouldCycle => "attachment would create a cycle",
        };
        f.write_str(text)
    }
}

/// A completed snap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    /// The socket the search started from.
    pub socket: SocketRef,
    /// The socket on the candidate block it attached to.
    pub peer: SocketRef,
    /// Root of the subtree that was moved to line the sockets up.
    pub moved: BlockId,
    /// Translation applied to `moved`'s subtree.
    pub delta: Vec2,
}

impl Snap {
    /// The block that gained a child.
    pub fn parent(&self) -> BlockId {
        if self.socket.is_root() {
            self.peer.block
        } else {
            self.socket.block
        }
    }

    /// The block that gained a parent.
    pub fn child(&self) -> BlockId {
        if self.socket.is_root() {
            self.socket.block
        } else {
            self.peer.block
        }
    }
}

/// Check whether `this` and `other` may attach right now.
pub fn check_pair(graph: &BlockGraph, this: SocketRef, other: SocketRef, radius: f32) -> Result<(), Rejection> {
    let (Some(a), Some(b)) = (graph.socket(this), graph.socket(other)) else {
        return Err(Rejection::MissingSocket);
    };
    if this.block == other.block {
        return Err(Rejection::SameBlock);
    }
    if !a.kind.complements(b.kind) {
        return Err(Rejection::SameSocketKind);
    }
    if a.connection != b.connection {
        return Err(Rejection::ConnectionMismatch);
    }
    if a.is_attached() || b.is_attached() {
        return Err(Rejection::AlreadyAttached);
    }
    match (this.is_root(), other.is_root()) {
        (true, true) => return Err(Rejection::RootToRoot),
        (false, false) => return Err(Rejection::NoRootSocket),
        _ => {}
    }
    let (Some(pa), Some(pb)) = (graph.absolute_position(this), graph.absolute_position(other)) else {
        return Err(Rejection::MissingSocket);
    };
    if pa.distance(pb) >= radius {
        return Err(Rejection::OutOfRange);
    }
    let (parent, child) = if this.is_root() {
        (other.block, this.block)
    } else {
        (this.block, other.block)
    };
    if graph.descending_blocks(child).contains(&parent) {
        return Err(Rejection::WouldCycle);
    }
    Ok(())
}

/// Snap `this` onto `other`: check eligibility, move the child subtree so
/// the two sockets coincide, then record the attachment.
///
/// Nothing changes when the pair is rejected. Passing `f32::INFINITY` as the
/// radius checks everything except proximity.
pub fn connect(graph: &mut BlockGraph, this: SocketRef, other: SocketRef, radius: f32) -> Result<Snap, Rejection> {
    check_pair(graph, this, other, radius)?;
    let here = graph.absolute_position(this).ok_or(Rejection::MissingSocket)?;
    let there = graph.absolute_position(other).ok_or(Rejection::MissingSocket)?;
    let (moved, delta) = if this.is_root() {
        (this.block, there - here)
    } else {
        (other.block, here - there)
    };
    graph.apply_delta(moved, delta);
    if !graph.attach(this, other) {
        graph.apply_delta(moved, -delta);
        return Err(Rejection::AlreadyAttached);
    }
    debug!(socket = %this, peer = %other, moved = %moved, dx = delta.x, dy = delta.y, "snapped");
    Ok(Snap {
        socket: this,
        peer: other,
        moved,
        delta,
    })
}

/// Try to attach socket `this` to the first eligible socket of `candidate`.
///
/// On failure nothing changes.
pub fn try_attach_with(graph: &mut BlockGraph, this: SocketRef, candidate: BlockId, radius: f32) -> Option<Snap> {
    for other in graph.socket_refs(candidate) {
        match connect(graph, this, other, radius) {
            Ok(snap) => return Some(snap),
            Err(reason) => trace!(socket = %this, candidate = %other, %reason, "not eligible"),
        }
    }
    None
}

/// Try every socket of `block`'s subtree against `candidate`, stopping at the
/// first snap.
///
/// Rejects `candidate == block` outright. After a snap, the block that gained
/// a child is notified of the hierarchy change, which propagates to the top
/// of its chain.
pub fn try_attach_in_some_connection(
    graph: &mut BlockGraph,
    block: BlockId,
    candidate: BlockId,
    radius: f32,
) -> Option<Snap> {
    if block == candidate {
        return None;
    }
    for member in graph.descending_blocks(block) {
        for socket in graph.socket_refs(member) {
            if let Some(snap) = try_attach_with(graph, socket, candidate, radius) {
                graph.hierarchy_changed(snap.parent());
                return Some(snap);
            }
        }
    }
    None
}
