use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Vec2;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Stable identifier of a block inside a [`BlockGraph`](crate::graph::BlockGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Address of one socket: the owning block plus the socket's index in the
/// block's ordered socket list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SocketRef {
    pub block: BlockId,
    pub index: usize,
}

impl SocketRef {
    pub const fn new(block: BlockId, index: usize) -> Self {
        Self { block, index }
    }

    /// The root socket of `block` (index 0).
    pub const fn root(block: BlockId) -> Self {
        Self { block, index: 0 }
    }

    /// True for the inbound connector at index 0.
    pub const fn is_root(&self) -> bool {
        self.index == 0
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.index)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sockets
// ────────────────────────────────────────────────────────────────────────────

/// Physical gender of a socket. Only complementary kinds mate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketKind {
    Male,
    Female,
}

impl SocketKind {
    pub fn complements(self, other: SocketKind) -> bool {
        self != other
    }
}

/// What flows through a socket. Connection kinds must match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Statement sequencing and bodies.
    Regular,
    /// Boolean expressions.
    Logic,
    /// Numeric expressions.
    Number,
}

/// Static description of a socket in a block kind's layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocketSpec {
    pub kind: SocketKind,
    pub connection: ConnectionKind,
    /// Offset from the owning block's position, in block-local units.
    pub offset: Vec2,
}

impl SocketSpec {
    const fn new(kind: SocketKind, connection: ConnectionKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            connection,
            offset: Vec2::new(x, y),
        }
    }
}

/// A typed attachment point owned by a block.
///
/// `peer` is a non-owning link resolved through the graph; the graph keeps it
/// symmetric with the peer's own `peer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    pub kind: SocketKind,
    pub connection: ConnectionKind,
    pub offset: Vec2,
    pub peer: Option<SocketRef>,
}

impl Socket {
    pub fn is_attached(&self) -> bool {
        self.peer.is_some()
    }
}

impl From<SocketSpec> for Socket {
    fn from(spec: SocketSpec) -> Self {
        Self {
            kind: spec.kind,
            connection: spec.connection,
            offset: spec.offset,
            peer: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Block kinds
// ────────────────────────────────────────────────────────────────────────────

/// Socket indices shared by every statement-like kind.
pub const ROOT: usize = 0;
pub const NEXT: usize = 1;
/// Argument slot of `Move`/`Turn`/`Wait`, condition of `If`, count of `Repeat`.
pub const ARG: usize = 2;
/// Body of `If`/`Repeat`.
pub const BODY: usize = 3;
/// Body of `Start`.
pub const START_BODY: usize = 1;
/// Operand slots of `Compare` (`Not` uses `LHS` only).
pub const LHS: usize = 1;
pub const RHS: usize = 2;

/// Height of a plain statement block in block-local units.
pub const STATEMENT_HEIGHT: f32 = 40.0;
/// Height of a control block (`If`/`Repeat`) including its body mouth.
pub const CONTROL_HEIGHT: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Less,
    Greater,
    Equal,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Less => "<",
            CompareOp::Greater => ">",
            CompareOp::Equal => "==",
        }
    }
}

/// The concrete variant of a block: decides its socket layout and how it
/// renders to program text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    /// Program entry point. Its root socket has nothing that can mate with it.
    Start,
    Move,
    Turn,
    Wait,
    If,
    Repeat,
    Number { value: f64 },
    Sensor { name: String },
    Logic { value: bool },
    Compare { op: CompareOp },
    Not,
}

impl BlockKind {
    /// Ordered socket layout; index 0 is always the root socket.
    pub fn socket_layout(&self) -> Vec<SocketSpec> {
        use ConnectionKind::*;
        use SocketKind::*;
        match self {
            BlockKind::Start => vec![
                SocketSpec::new(Female, Regular, 0.0, -20.0),
                SocketSpec::new(Female, Regular, 0.0, STATEMENT_HEIGHT),
            ],
            BlockKind::Move | BlockKind::Turn | BlockKind::Wait => vec![
                SocketSpec::new(Male, Regular, 0.0, 0.0),
                SocketSpec::new(Female, Regular, 0.0, STATEMENT_HEIGHT),
                SocketSpec::new(Female, Number, 90.0, 20.0),
            ],
            BlockKind::If => vec![
                SocketSpec::new(Male, Regular, 0.0, 0.0),
                SocketSpec::new(Female, Regular, 0.0, CONTROL_HEIGHT),
                SocketSpec::new(Female, Logic, 60.0, 20.0),
                SocketSpec::new(Female, Regular, 20.0, STATEMENT_HEIGHT),
            ],
            BlockKind::Repeat => vec![
                SocketSpec::new(Male, Regular, 0.0, 0.0),
                SocketSpec::new(Female, Regular, 0.0, CONTROL_HEIGHT),
                SocketSpec::new(Female, Number, 90.0, 20.0),
                SocketSpec::new(Female, Regular, 20.0, STATEMENT_HEIGHT),
            ],
            BlockKind::Number { .. } | BlockKind::Sensor { .. } => {
                vec![SocketSpec::new(Male, Number, 0.0, 10.0)]
            }
            BlockKind::Logic { .. } => vec![SocketSpec::new(Male, Logic, 0.0, 10.0)],
            BlockKind::Compare { .. } => vec![
                SocketSpec::new(Male, Logic, 0.0, 10.0),
                SocketSpec::new(Female, Number, 20.0, 10.0),
                SocketSpec::new(Female, Number, 80.0, 10.0),
            ],
            BlockKind::Not => vec![
                SocketSpec::new(Male, Logic, 0.0, 10.0),
                SocketSpec::new(Female, Logic, 30.0, 10.0),
            ],
        }
    }

    /// Short human-readable name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Start => "start",
            BlockKind::Move => "move",
            BlockKind::Turn => "turn",
            BlockKind::Wait => "wait",
            BlockKind::If => "if",
            BlockKind::Repeat => "repeat",
            BlockKind::Number { .. } => "number",
            BlockKind::Sensor { .. } => "sensor",
            BlockKind::Logic { .. } => "logic",
            BlockKind::Compare { .. } => "compare",
            BlockKind::Not => "not",
        }
    }

    /// Kinds that keep a cached program listing refreshed on every
    /// hierarchy change below them.
    pub fn keeps_listing(&self) -> bool {
        matches!(self, BlockKind::Start)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Block
// ────────────────────────────────────────────────────────────────────────────

/// The layer a block currently lives in. Each layer has its own
/// coordinate-scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// Reusable templates the user drags copies from.
    Palette,
    /// Topmost layer holding the block under the pointer.
    Floating,
    /// The program canvas.
    #[default]
    Canvas,
}

/// A node in the program graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Ordered sockets; never empty, index 0 is the root socket.
    pub sockets: Vec<Socket>,
    pub position: Vec2,
    /// Coordinate-scale factor of the container the block lives in.
    pub scale: f32,
    pub container: Container,
    /// Drawing order; larger values draw on top.
    pub z_order: u64,
    /// "Being dragged" presentation state.
    pub dragging: bool,
    /// Leave a reusable copy behind when picked up (palette templates).
    pub leave_copy: bool,
    /// Cached program text for kinds that keep one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<String>,
}

impl Block {
    /// Create a detached block of the given kind.
    ///
    /// # Panics
    ///
    /// Panics if the kind's layout has no sockets; every block needs a root
    /// socket.
    pub fn new(id: BlockId, kind: BlockKind, position: Vec2, container: Container, scale: f32) -> Self {
        let sockets: Vec<Socket> = kind.socket_layout().into_iter().map(Socket::from).collect();
        assert!(
            !sockets.is_empty(),
            "block kind '{}' has no sockets; index 0 must be a root socket",
            kind.label()
        );
        Self {
            id,
            kind,
            sockets,
            position,
            scale,
            container,
            z_order: 0,
            dragging: false,
            leave_copy: false,
            listing: None,
        }
    }

    pub fn root_socket(&self) -> &Socket {
        &self.sockets[ROOT]
    }

    /// The block this one hangs from, through its root socket.
    pub fn parent(&self) -> Option<BlockId> {
        self.root_socket().peer.map(|p| p.block)
    }

    /// Blocks attached through non-root sockets, in socket order.
    pub fn children(&self) -> impl Iterator<Item = BlockId> + '_ {
        let own = self.id;
        self.sockets
            .iter()
            .skip(1)
            .filter_map(|s| s.peer)
            .map(|p| p.block)
            .filter(move |b| *b != own)
    }

    /// The block attached at socket `index`, if any.
    pub fn attached_at(&self, index: usize) -> Option<BlockId> {
        self.sockets.get(index).and_then(|s| s.peer).map(|p| p.block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_root_socket() {
        let kinds = [
            BlockKind::Start,
            BlockKind::Move,
            BlockKind::Turn,
            BlockKind::Wait,
            BlockKind::If,
            BlockKind::Repeat,
            BlockKind::Number { value: 1.0 },
            BlockKind::Sensor { name: "distance".into() },
            BlockKind::Logic { value: true },
            BlockKind::Compare { op: CompareOp::Less },
            BlockKind::Not,
        ];
        for kind in kinds {
            let block = Block::new(BlockId(1), kind, Vec2::ZERO, Container::Canvas, 1.0);
            assert!(!block.sockets.is_empty());
            assert!(block.parent().is_none());
            assert_eq!(block.children().count(), 0);
        }
    }

    #[test]
    fn test_socket_kind_complements() {
        assert!(SocketKind::Male.complements(SocketKind::Female));
        assert!(SocketKind::Female.complements(SocketKind::Male));
        assert!(!SocketKind::Male.complements(SocketKind::Male));
    }

    #[test]
    fn test_block_kind_serde_tagging() {
        let kind = BlockKind::Compare { op: CompareOp::Greater };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"type":"compare","op":"greater"}"#);
        let back: BlockKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn test_socket_ref_root() {
        let s = SocketRef::root(BlockId(7));
        assert!(s.is_root());
        assert!(!SocketRef::new(BlockId(7), 2).is_root());
        assert_eq!(s.to_string(), "#7:0");
    }
}
