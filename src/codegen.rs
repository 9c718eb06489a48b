//! Rendering of block trees to program text.
//!
//! Every block kind renders itself and, transitively, whatever is attached to
//! its non-root sockets. Empty argument slots render a neutral placeholder so
//! half-built programs still produce readable text.

use crate::graph::BlockGraph;
use crate::model::{ARG, BODY, BlockId, BlockKind, LHS, NEXT, RHS, START_BODY};

const INDENT: &str = "    ";

/// Program text for `id` and everything below it. Empty if `id` is unknown.
pub fn code(graph: &BlockGraph, id: BlockId) -> String {
    let Some(block) = graph.get(id) else {
        return String::new();
    };
    match block.kind {
        BlockKind::Start => {
            let mut out = String::from("program {\n");
            out.push_str(&statements(graph, block.attached_at(START_BODY), 1));
            out.push_str("}\n");
            out
        }
        BlockKind::Move | BlockKind::Turn | BlockKind::Wait | BlockKind::If | BlockKind::Repeat => {
            statements(graph, Some(id), 0)
        }
        _ => expression(graph, Some(id), ""),
    }
}

/// Render a chain of statements linked through their `NEXT` sockets.
fn statements(graph: &BlockGraph, first: Option<BlockId>, depth: usize) -> String {
    let indent = INDENT.repeat(depth);
    let mut out = String::new();
    let mut current = first;
    while let Some(id) = current {
        let Some(block) = graph.get(id) else { break };
        match &block.kind {
            BlockKind::Move | BlockKind::Turn | BlockKind::Wait => {
                let arg = expression(graph, block.attached_at(ARG), "0");
                out.push_str(&format!("{indent}{}({arg});\n", block.kind.label()));
            }
            BlockKind::If => {
                let cond = expression(graph, block.attached_at(ARG), "false");
                out.push_str(&format!("{indent}if ({cond}) {{\n"));
                out.push_str(&statements(graph, block.attached_at(BODY), depth + 1));
                out.push_str(&format!("{indent}}}\n"));
            }
            BlockKind::Repeat => {
                let count = expression(graph, block.attached_at(ARG), "0");
                out.push_str(&format!("{indent}repeat ({count}) {{\n"));
                out.push_str(&statements(graph, block.attached_at(BODY), depth + 1));
                out.push_str(&format!("{indent}}}\n"));
            }
            _ => {
                out.push_str(&format!("{indent}{};\n", expression(graph, Some(id), "")));
                break;
            }
        }
        current = block.attached_at(NEXT);
    }
    out
}

/// Render an expression, or `placeholder` for an empty slot.
fn expression(graph: &BlockGraph, id: Option<BlockId>, placeholder: &str) -> String {
    let Some(block) = id.and_then(|id| graph.get(id)) else {
        return placeholder.to_string();
    };
    match &block.kind {
        BlockKind::Number { value } => format!("{value}"),
        BlockKind::Sensor { name } => format!("{name}()"),
        BlockKind::Logic { value } => format!("{value}"),
        BlockKind::Compare { op } => format!(
            "({} {} {})",
            expression(graph, block.attached_at(LHS), "0"),
            op.symbol(),
            expression(graph, block.attached_at(RHS), "0"),
        ),
        BlockKind::Not => format!("!{}", expression(graph, block.attached_at(LHS), "false")),
        other => other.label().to_string(),
    }
}
