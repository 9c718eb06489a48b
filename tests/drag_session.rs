use snapblocks::model::{ARG, NEXT, START_BODY};
use snapblocks::{
    BlockGraph, BlockId, BlockKind, Container, DragPhase, DragSession, DropOutcome, EditorConfig, GraphEvent,
    Region, SocketRef, Vec2, Workspace,
};

struct Fixture {
    graph: BlockGraph,
    workspace: Workspace,
    session: DragSession,
}

impl Fixture {
    fn new() -> Self {
        let config = EditorConfig {
            canvas: Region::from_corners(Vec2::new(0.0, 0.0), Vec2::new(800.0, 600.0)),
            ..Default::default()
        };
        Self {
            graph: BlockGraph::new(),
            workspace: Workspace::new(),
            session: DragSession::new(config),
        }
    }

    fn place(&mut self, kind: BlockKind, x: f32, y: f32) -> BlockId {
        let id = self.graph.insert(kind, Vec2::new(x, y), Container::Canvas, 1.0);
        self.workspace.place(id);
        id
    }

    fn link(&mut self, parent: BlockId, index: usize, child: BlockId) {
        assert!(self.graph.attach(SocketRef::new(parent, index), SocketRef::root(child)));
    }

    fn pos(&self, id: BlockId) -> Vec2 {
        self.graph.get(id).expect("block exists").position
    }

    fn begin(&mut self, id: BlockId) {
        self.session
            .begin(&mut self.graph, &mut self.workspace, id)
            .expect("drag started");
    }

    fn drag(&mut self, path: &[(f32, f32)]) {
        for &(x, y) in path {
            self.session.drag_to(&mut self.graph, Vec2::new(x, y));
        }
    }

    fn end(&mut self, x: f32, y: f32) -> DropOutcome {
        self.session
            .end(&mut self.graph, &mut self.workspace, Vec2::new(x, y))
            .expect("drop outcome")
    }
}

#[test]
fn dragging_parent_moves_attached_child_by_same_delta() {
    let mut f = Fixture::new();
    let p = f.place(BlockKind::Move, 100.0, 100.0);
    let c = f.place(BlockKind::Turn, 100.0, 140.0);
    let elsewhere = f.place(BlockKind::Wait, 500.0, 500.0);
    f.link(p, NEXT, c);

    f.begin(p);
    f.drag(&[(200.0, 200.0), (210.0, 195.0)]);
    assert_eq!(f.pos(p), Vec2::new(110.0, 95.0));
    assert_eq!(f.pos(c), Vec2::new(110.0, 135.0));
    assert_eq!(f.pos(elsewhere), Vec2::new(500.0, 500.0));

    f.end(210.0, 195.0);
    assert_eq!(f.graph.parent_of(c), Some(p));
    assert_eq!(f.pos(c) - f.pos(p), Vec2::new(0.0, 40.0));
}

#[test]
fn pick_up_detaches_and_notifies_former_parent_once() {
    let mut f = Fixture::new();
    let start = f.place(BlockKind::Start, 0.0, 0.0);
    let a = f.place(BlockKind::Move, 0.0, 40.0);
    let b = f.place(BlockKind::Turn, 0.0, 80.0);
    f.link(start, START_BODY, a);
    f.link(a, NEXT, b);
    f.graph.drain_events();

    let pick = f.session.begin(&mut f.graph, &mut f.workspace, b).unwrap();
    assert_eq!(pick.former_parent, Some(a));
    assert!(f.graph.peer_of(SocketRef::root(b)).is_none());
    assert!(f.graph.peer_of(SocketRef::new(a, NEXT)).is_none());

    let events = f.graph.drain_events();
    let count = |target: BlockId| {
        events
            .iter()
            .filter(|e| **e == GraphEvent::HierarchyChanged { block: target })
            .count()
    };
    assert_eq!(count(a), 1);
    assert_eq!(count(start), 1);
    assert_eq!(count(b), 0);
    assert_eq!(f.graph.get(start).unwrap().listing.as_deref(), Some("program {\n    move(0);\n}\n"));
}

#[test]
fn drop_outside_canvas_deletes_whole_subtree() {
    let mut f = Fixture::new();
    let start = f.place(BlockKind::Start, 0.0, 0.0);
    let a = f.place(BlockKind::Repeat, 0.0, 40.0);
    let count = f.place(BlockKind::Number { value: 3.0 }, 90.0, 50.0);
    let body = f.place(BlockKind::Move, 20.0, 80.0);
    let after = f.place(BlockKind::Wait, 0.0, 140.0);
    f.link(start, START_BODY, a);
    f.link(a, ARG, count);
    f.link(a, snapblocks::model::BODY, body);
    f.link(a, NEXT, after);

    f.begin(a);
    f.drag(&[(10.0, 50.0), (900.0, 50.0)]);
    let outcome = f.end(900.0, 50.0);
    match outcome {
        DropOutcome::Deleted { removed } => {
            assert_eq!(removed.len(), 4);
            for id in [a, count, body, after] {
                assert!(removed.contains(&id));
            }
        }
        other => panic!("expected deletion, got {other:?}"),
    }
    for id in [a, count, body, after] {
        assert!(!f.graph.contains(id));
        assert!(!f.workspace.contains(id));
    }
    assert_eq!(f.graph.descending_blocks(start), vec![start]);
    assert!(f.graph.is_consistent());
    assert_eq!(f.session.phase(), &DragPhase::Idle);
}

#[test]
fn drop_inside_without_snap_stays_put() {
    let mut f = Fixture::new();
    let start = f.place(BlockKind::Start, 0.0, 0.0);
    let lone = f.place(BlockKind::Move, 300.0, 300.0);
    f.begin(lone);
    f.drag(&[(300.0, 300.0), (350.0, 320.0)]);
    match f.end(350.0, 320.0) {
        DropOutcome::Placed { block, snap, root, code } => {
            assert_eq!(block, lone);
            assert!(snap.is_none());
            assert_eq!(root, lone);
            assert_eq!(code, "move(0);\n");
        }
        other => panic!("expected placement, got {other:?}"),
    }
    assert_eq!(f.pos(lone), Vec2::new(350.0, 320.0));
    assert!(f.graph.peer_of(SocketRef::new(start, START_BODY)).is_none());
    assert!(f.workspace.contains(lone));
}

#[test]
fn drop_snaps_to_first_candidate_in_placement_order() {
    let mut f = Fixture::new();
    // Two hosts whose NEXT sockets sit at the same spot.
    let first = f.place(BlockKind::Move, 100.0, 100.0);
    let second = f.place(BlockKind::Turn, 100.0, 100.0);
    let dragged = f.place(BlockKind::Wait, 400.0, 400.0);

    f.begin(dragged);
    f.drag(&[(400.0, 400.0), (102.0, 142.0)]);
    match f.end(102.0, 142.0) {
        DropOutcome::Placed { snap, root, .. } => {
            let snap = snap.expect("snapped");
            assert_eq!(snap.peer, SocketRef::new(first, NEXT));
            assert_eq!(root, first);
        }
        other => panic!("expected placement, got {other:?}"),
    }
    assert_eq!(f.pos(dragged), Vec2::new(100.0, 140.0));
    assert!(f.graph.peer_of(SocketRef::new(second, NEXT)).is_none());
}

#[test]
fn drop_never_snaps_into_own_subtree() {
    let mut f = Fixture::new();
    let top = f.place(BlockKind::Move, 0.0, 0.0);
    let below = f.place(BlockKind::Turn, 0.0, 40.0);
    f.link(top, NEXT, below);

    f.begin(top);
    f.drag(&[(0.0, 0.0), (5.0, 5.0)]);
    f.end(5.0, 5.0);
    assert_eq!(f.graph.parent_of(below), Some(top));
    assert!(f.graph.parent_of(top).is_none());
    assert!(f.graph.is_consistent());
}

#[test]
fn dragged_subtree_is_raised_and_flagged_then_cleared() {
    let mut f = Fixture::new();
    let a = f.place(BlockKind::Move, 0.0, 0.0);
    let b = f.place(BlockKind::Turn, 0.0, 40.0);
    let other = f.place(BlockKind::Wait, 300.0, 0.0);
    f.link(a, NEXT, b);
    f.graph.drain_events();

    f.begin(a);
    let top = f.graph.get(other).unwrap().z_order;
    assert!(f.graph.get(a).unwrap().z_order > top);
    assert!(f.graph.get(b).unwrap().z_order > top);
    assert!(f.graph.get(a).unwrap().dragging);
    assert!(f.graph.get(b).unwrap().dragging);
    assert_eq!(f.graph.get(a).unwrap().container, Container::Floating);
    assert!(!f.workspace.contains(a));

    f.end(10.0, 10.0);
    assert!(!f.graph.get(a).unwrap().dragging);
    assert!(!f.graph.get(b).unwrap().dragging);
    let toggles: Vec<GraphEvent> = f
        .graph
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GraphEvent::DragStateChanged { .. }))
        .collect();
    assert_eq!(toggles.len(), 4);
}

#[test]
fn move_baseline_resets_between_sessions() {
    let mut f = Fixture::new();
    let a = f.place(BlockKind::Move, 50.0, 50.0);
    f.begin(a);
    f.drag(&[(10.0, 10.0), (20.0, 20.0)]);
    f.end(20.0, 20.0);
    assert_eq!(f.pos(a), Vec2::new(60.0, 60.0));

    // New session: the first move again only sets a baseline.
    f.begin(a);
    f.drag(&[(400.0, 400.0)]);
    assert_eq!(f.pos(a), Vec2::new(60.0, 60.0));
    f.drag(&[(401.0, 402.0)]);
    assert_eq!(f.pos(a), Vec2::new(61.0, 62.0));
}

#[test]
fn template_copy_stays_in_palette() {
    let mut f = Fixture::new();
    let start = f.place(BlockKind::Start, 100.0, 100.0);
    let template = f.graph.insert(BlockKind::Turn, Vec2::new(700.0, 20.0), Container::Palette, 1.0);
    f.graph.set_leave_copy(template, true);

    let pick = f.session.begin(&mut f.graph, &mut f.workspace, template).unwrap();
    let copy = pick.copy.expect("copy left behind");
    f.drag(&[(700.0, 20.0), (100.0, 150.0)]);
    f.end(100.0, 150.0);

    assert_eq!(f.graph.parent_of(template), Some(start));
    let copy_block = f.graph.get(copy).unwrap();
    assert_eq!(copy_block.container, Container::Palette);
    assert_eq!(copy_block.position, Vec2::new(700.0, 20.0));
    assert!(copy_block.leave_copy);
    assert!(!f.graph.get(template).unwrap().leave_copy);
    assert!(!f.workspace.contains(copy));

    // Dragging the copy leaves yet another one.
    let again = f.session.begin(&mut f.graph, &mut f.workspace, copy).unwrap();
    assert!(again.copy.is_some());
}

#[test]
fn descendant_socket_snaps_placed_block_under_it() {
    let mut f = Fixture::new();
    let p = f.place(BlockKind::Move, 0.0, 0.0);
    let c = f.place(BlockKind::Turn, 0.0, 40.0);
    let q = f.place(BlockKind::Wait, 100.0, 300.0);
    f.link(p, NEXT, c);

    // Carry the pair so C's free NEXT socket ends 3 units above Q's root.
    f.begin(p);
    f.drag(&[(0.0, 0.0), (100.0, 217.0)]);
    match f.end(100.0, 217.0) {
        DropOutcome::Placed { snap, root, code, .. } => {
            let snap = snap.expect("snapped through the descendant");
            assert_eq!(snap.socket, SocketRef::new(c, NEXT));
            assert_eq!(snap.peer, SocketRef::root(q));
            assert_eq!(snap.moved, q);
            assert_eq!(snap.delta, Vec2::new(0.0, -3.0));
            assert_eq!(root, p);
            assert_eq!(code, "move(0);\nturn(0);\nwait(0);\n");
        }
        other => panic!("expected placement, got {other:?}"),
    }
    assert_eq!(f.pos(p), Vec2::new(100.0, 217.0));
    assert_eq!(f.pos(q), Vec2::new(100.0, 297.0));
    assert_eq!(f.graph.parent_of(q), Some(c));
}

#[test]
fn whole_subtree_takes_floating_scale_while_dragged() {
    let mut f = Fixture::new();
    f.session = DragSession::new(EditorConfig {
        floating_scale: 0.5,
        ..f.session.config().clone()
    });
    let a = f.place(BlockKind::Move, 0.0, 0.0);
    let b = f.place(BlockKind::Turn, 0.0, 40.0);
    let arg = f.place(BlockKind::Number { value: 1.0 }, 90.0, 10.0);
    f.link(a, NEXT, b);
    f.link(b, ARG, arg);

    f.begin(a);
    for id in [a, b, arg] {
        let block = f.graph.get(id).unwrap();
        assert_eq!(block.container, Container::Floating);
        assert_eq!(block.scale, 0.5);
    }

    f.end(10.0, 10.0);
    for id in [a, b, arg] {
        let block = f.graph.get(id).unwrap();
        assert_eq!(block.container, Container::Canvas);
        assert_eq!(block.scale, 1.0);
    }
}
