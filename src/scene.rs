//! Scripted scenes: a JSON description of palette templates, placed blocks
//! and a sequence of pointer steps, replayed through an [`EditorState`].
//!
//! ```json
//! {
//!   "palette": [{ "name": "move", "kind": { "type": "move" }, "at": { "x": 900, "y": 10 } }],
//!   "blocks":  [{ "name": "start", "kind": { "type": "start" }, "at": { "x": 100, "y": 100 } }],
//!   "links":   [],
//!   "script": [
//!     { "begin": { "block": "move", "name": "m1" } },
//!     { "move": { "x": 905, "y": 15 } },
//!     { "move": { "x": 108, "y": 149 } },
//!     { "end": { "x": 108, "y": 149 } }
//!   ]
//! }
//! ```
//!
//! Blocks are referred to by name. Picking up a template rebinds the
//! template's name to the copy left in the palette; the dragged block takes
//! the step's `name`, or `<template>@<id>` when none is given.

use anyhow::{Context, Result, anyhow, bail};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::attach::connect;
use crate::config::EditorConfig;
use crate::drag::DropOutcome;
use crate::editor::EditorState;
use crate::geometry::Vec2;
use crate::model::{Block, BlockId, BlockKind, SocketRef};

// ────────────────────────────────────────────────────────────────────────────
// File format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDecl {
    pub name: String,
    pub kind: BlockKind,
    pub at: Vec2,
}

/// An initial attachment: `child`'s root socket goes into `parent`'s socket
/// number `socket`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDecl {
    pub parent: String,
    pub socket: usize,
    pub child: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Begin {
        block: String,
        #[serde(default)]
        name: Option<String>,
    },
    Move(Vec2),
    End(Vec2),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub palette: Vec<BlockDecl>,
    #[serde(default)]
    pub blocks: Vec<BlockDecl>,
    #[serde(default)]
    pub links: Vec<LinkDecl>,
    #[serde(default)]
    pub script: Vec<Step>,
}

impl Scene {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse scene {}", path))
    }

    /// Create every declared block and link in a fresh editor.
    pub fn build(&self, config: EditorConfig) -> Result<SceneRun> {
        let mut run = SceneRun {
            state: EditorState::new(config),
            names: IndexMap::new(),
        };
        for decl in &self.palette {
            let id = run.state.add_template(decl.kind.clone(), decl.at);
            run.bind(&decl.name, id)?;
        }
        for decl in &self.blocks {
            let id = run.state.add_block(decl.kind.clone(), decl.at);
            run.bind(&decl.name, id)?;
        }
        for link in &self.links {
            let parent = run.lookup(&link.parent)?;
            let child = run.lookup(&link.child)?;
            let graph = &mut run.state.graph;
            connect(graph, SocketRef::root(child), SocketRef::new(parent, link.socket), f32::INFINITY)
                .map_err(|reason| {
                    anyhow!("Cannot link '{}' into '{}' socket {}: {}", link.child, link.parent, link.socket, reason)
                })?;
            graph.hierarchy_changed(parent);
        }
        run.state.drain_events();
        run.state.clear_dirty();
        Ok(run)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Replay
// ────────────────────────────────────────────────────────────────────────────

/// What one script step did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepReport {
    PickedUp {
        block: String,
        copy: Option<String>,
        detached_from: Option<String>,
    },
    Moved {
        moved: bool,
    },
    Placed {
        block: String,
        snapped_to: Option<String>,
        root: String,
        code: String,
    },
    Deleted {
        blocks: Vec<String>,
    },
    /// The step did not apply in the current session state.
    Ignored,
}

/// A built scene: the editor plus the name table.
#[derive(Debug, Clone)]
pub struct SceneRun {
    pub state: EditorState,
    pub names: IndexMap<String, BlockId>,
}

/// Serializable view of a scene's final state.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub names: &'a IndexMap<String, BlockId>,
    pub blocks: Vec<&'a Block>,
    pub programs: Vec<ProgramText>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramText {
    pub root: String,
    pub code: String,
}

impl SceneRun {
    fn bind(&mut self, name: &str, id: BlockId) -> Result<()> {
        if self.names.contains_key(name) {
            bail!("Duplicate block name '{}'", name);
        }
        self.names.insert(name.to_string(), id);
        Ok(())
    }

    /// A pick-up alias may only rename the picked block itself. A template's
    /// own name moves to its copy, so it cannot be reused as the alias.
    fn check_alias(&self, alias: &str, block: &str, id: BlockId) -> Result<()> {
        let template = self.state.graph.get(id).is_some_and(|b| b.leave_copy);
        match self.names.get(alias) {
            Some(&owner) if owner != id => bail!("Name '{}' is already bound to {}", alias, owner),
            Some(_) if template && alias == block => {
                bail!("Name '{}' stays with the palette copy; pick another alias", alias)
            }
            _ => Ok(()),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<BlockId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Unknown block '{}'", name))
    }

    /// Name bound to `id`, or its numeric form.
    pub fn name_of(&self, id: BlockId) -> String {
        self.names
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Run every step in order.
    pub fn replay(&mut self, steps: &[Step]) -> Result<Vec<StepReport>> {
        steps
            .iter()
            .enumerate()
            .map(|(i, step)| self.apply(step).with_context(|| format!("Step {} ({:?})", i + 1, step)))
            .collect()
    }

    pub fn apply(&mut self, step: &Step) -> Result<StepReport> {
        match step {
            Step::Begin { block, name } => {
                let id = self.lookup(block)?;
                if let Some(alias) = name {
                    self.check_alias(alias, block, id)?;
                }
                let Some(pick) = self.state.pointer_down(id) else {
                    return Ok(StepReport::Ignored);
                };
                if let Some(copy) = pick.copy {
                    self.names.insert(block.clone(), copy);
                    let alias = name.clone().unwrap_or_else(|| format!("{}@{}", block, id.0));
                    self.names.insert(alias, id);
                } else if let Some(alias) = name {
                    self.names.retain(|_, v| *v != id);
                    self.names.insert(alias.clone(), id);
                }
                Ok(StepReport::PickedUp {
                    block: self.name_of(id),
                    copy: pick.copy.map(|c| self.name_of(c)),
                    detached_from: pick.former_parent.map(|p| self.name_of(p)),
                })
            }
            Step::Move(pointer) => Ok(StepReport::Moved {
                moved: self.state.pointer_move(*pointer),
            }),
            Step::End(pointer) => match self.state.pointer_up(*pointer) {
                None => Ok(StepReport::Ignored),
                Some(DropOutcome::Placed { block, snap, root, code }) => Ok(StepReport::Placed {
                    block: self.name_of(block),
                    // The search starts from the dragged subtree, so the peer
                    // is always on the block that was already placed.
                    snapped_to: snap.map(|s| self.name_of(s.peer.block)),
                    root: self.name_of(root),
                    code,
                }),
                Some(DropOutcome::Deleted { removed }) => {
                    let blocks = removed.iter().map(|&id| self.name_of(id)).collect();
                    self.names.retain(|_, v| !removed.contains(v));
                    Ok(StepReport::Deleted { blocks })
                }
            },
        }
    }

    /// Program text of every tree on the canvas.
    pub fn programs(&self) -> Vec<ProgramText> {
        self.state
            .programs()
            .into_iter()
            .map(|(root, code)| ProgramText {
                root: self.name_of(root),
                code,
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            names: &self.names,
            blocks: self.state.graph.blocks().collect(),
            programs: self.programs(),
        }
    }
}
