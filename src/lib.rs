//! Attachment model and drag interaction for a visual block-programming
//! editor.
//!
//! Blocks carry typed sockets and snap together into a forest of program
//! trees. [`graph::BlockGraph`] owns the blocks and arbitrates every attach
//! and detach, [`attach`] decides when two sockets may snap and lines them
//! up, and [`drag::DragSession`] drives pick-up, move and drop of whole
//! subtrees. The binary `snapblocks` replays scripted scenes and prints the
//! generated program text.

pub mod attach;
pub mod codegen;
pub mod config;
pub mod drag;
pub mod editor;
pub mod events;
pub mod geometry;
pub mod graph;
pub mod model;
pub mod scene;
pub mod workspace;

pub use attach::{Rejection, SNAP_RADIUS, Snap};
pub use config::EditorConfig;
pub use drag::{DragPhase, DragSession, DropOutcome, PickUp};
pub use editor::EditorState;
pub use events::GraphEvent;
pub use geometry::{Region, Vec2};
pub use graph::BlockGraph;
pub use model::{Block, BlockId, BlockKind, ConnectionKind, Container, Socket, SocketKind, SocketRef};
pub use workspace::Workspace;
