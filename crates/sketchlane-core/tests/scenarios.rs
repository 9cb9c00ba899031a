//! End-to-end editing scenarios driven through the public editor API.

use kurbo::{Point, Rect, Vec2};

use sketchlane_core::connector::{ConnectorHandleKind, curve, elbow};
use sketchlane_core::geometry::{ResizeHandle, SelectionFrame, TextMetrics};
use sketchlane_core::{
    CanvasOptions, ConnectorProps, ConnectorStyle, Document, Editor, Element, ElementStyle, Key,
    MemoryHub, Modifiers, MouseButton, PresenceManager, SerializableColor, StoreOp, TextProps,
    Tool, UserInfo,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn options(tool: Tool) -> CanvasOptions {
    CanvasOptions {
        tool,
        ..Default::default()
    }
}

fn drag(ed: &mut Editor, from: Point, to: Point, modifiers: Modifiers, now: u64) {
    ed.pointer_down(from, MouseButton::Left, modifiers, now);
    ed.pointer_move(from.midpoint(to), modifiers);
    ed.pointer_move(to, modifiers);
    ed.pointer_up(to, modifiers);
}

fn click(ed: &mut Editor, at: Point, modifiers: Modifiers, now: u64) {
    ed.pointer_down(at, MouseButton::Left, modifiers, now);
    ed.pointer_up(at, modifiers);
}

fn filled_rect(rect: Rect) -> Element {
    let mut el = Element::rectangle(rect, ElementStyle::default());
    if let Some(b) = el.box_props_mut() {
        b.fill_color = Some(SerializableColor::white());
    }
    el
}

fn document(elements: &[Element]) -> Document {
    let mut doc = Document::new();
    for el in elements {
        doc.insert(el.clone());
    }
    doc
}

fn added(ops: &[StoreOp]) -> Vec<&Element> {
    ops.iter()
        .filter_map(|op| match op {
            StoreOp::Add { element } => Some(element),
            _ => None,
        })
        .collect()
}

#[test]
fn test_draw_rectangle() {
    init_logging();
    let mut ed = Editor::offline(options(Tool::Rectangle));
    drag(&mut ed, Point::ZERO, Point::new(100.0, 50.0), Modifiers::NONE, 0);

    let ops = ed.take_store_ops();
    let elements = added(&ops);
    assert_eq!(elements.len(), 1);
    let b = elements[0].box_props().unwrap();
    assert_eq!((b.x, b.y, b.width, b.height), (0.0, 0.0, 100.0, 50.0));
}

#[test]
fn test_shift_draws_square() {
    let mut ed = Editor::offline(options(Tool::Rectangle));
    drag(&mut ed, Point::ZERO, Point::new(100.0, 40.0), Modifiers::SHIFT, 0);

    let ops = ed.take_store_ops();
    let b = added(&ops)[0].box_props().unwrap().clone();
    assert!((b.width - 100.0).abs() < 1e-9);
    assert!((b.height - 100.0).abs() < 1e-9);
}

#[test]
fn test_curved_midpoint_drag_passes_through_pointer() {
    let props = ConnectorProps {
        connector_style: ConnectorStyle::Curved,
        ..Default::default()
    };
    let line = Element::line(vec![Point::ZERO, Point::new(100.0, 0.0)], props, ElementStyle::default());
    let id = line.id.clone();
    let mut ed = Editor::offline(options(Tool::Select)).with_document(document(&[line]));
    ed.set_selection([id.clone()]);
    assert!(ed
        .connector_handles()
        .iter()
        .any(|h| h.kind == ConnectorHandleKind::Midpoint(0)));

    drag(&mut ed, Point::new(50.0, 0.0), Point::new(50.0, 40.0), Modifiers::NONE, 0);

    let el = ed.document().get(&id).unwrap();
    assert_eq!(el.points.len(), 3);
    let through = curve::sample(&el.points, 16)
        .into_iter()
        .map(|p| (p - Point::new(50.0, 40.0)).hypot())
        .fold(f64::INFINITY, f64::min);
    assert!(through < 1e-6, "curve misses the drag point by {through}");
    assert!(matches!(&ed.take_store_ops()[..], [StoreOp::Update { .. }]));
}

#[test]
fn test_shift_click_toggles_membership() {
    let a = filled_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
    let b = filled_rect(Rect::new(100.0, 0.0, 150.0, 50.0));
    let (aid, bid) = (a.id.clone(), b.id.clone());
    let mut ed = Editor::offline(options(Tool::Select)).with_document(document(&[a, b]));

    click(&mut ed, Point::new(25.0, 25.0), Modifiers::NONE, 0);
    click(&mut ed, Point::new(125.0, 25.0), Modifiers::SHIFT, 1000);
    assert_eq!(ed.selection(), &[aid.clone(), bid]);
    click(&mut ed, Point::new(125.0, 25.0), Modifiers::SHIFT, 2000);
    assert_eq!(ed.selection(), &[aid]);
}

#[test]
fn test_box_select_requires_full_containment() {
    let inside = filled_rect(Rect::new(10.0, 10.0, 20.0, 20.0));
    let straddling = filled_rect(Rect::new(15.0, 15.0, 60.0, 60.0));
    let inside_id = inside.id.clone();
    let mut ed = Editor::offline(options(Tool::Select)).with_document(document(&[inside, straddling]));

    drag(&mut ed, Point::new(0.0, 0.0), Point::new(30.0, 30.0), Modifiers::NONE, 0);
    assert_eq!(ed.selection(), &[inside_id]);
    assert!(ed.box_select_rect().is_none());
}

#[test]
fn test_eraser_deletes_within_radius_only() {
    let near = Element::freehand(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)], ElementStyle::default());
    let far = Element::freehand(vec![Point::new(0.0, 100.0), Point::new(100.0, 100.0)], ElementStyle::default());
    let (near_id, far_id) = (near.id.clone(), far.id.clone());
    let mut ed = Editor::offline(options(Tool::Erase)).with_document(document(&[near, far]));

    // Radius is 2 x 16; the path comes within 31 of `near` and 40 of `far`.
    ed.pointer_down(Point::new(50.0, 60.0), MouseButton::Left, Modifiers::NONE, 0);
    ed.pointer_move(Point::new(50.0, 31.0), Modifiers::NONE);
    ed.pointer_move(Point::new(80.0, 55.0), Modifiers::NONE);
    assert_eq!(ed.erase_marked(), &[near_id.clone()]);
    // Marks are visual only until release.
    assert!(ed.document().contains(&near_id));
    ed.pointer_up(Point::new(80.0, 55.0), Modifiers::NONE);

    assert!(!ed.document().contains(&near_id));
    assert!(ed.document().contains(&far_id));
    assert_eq!(ed.take_store_ops(), vec![StoreOp::Delete { id: near_id }]);
}

#[test]
fn test_elbow_run_drags_stay_orthogonal() {
    let props = ConnectorProps {
        connector_style: ConnectorStyle::Elbow,
        ..Default::default()
    };
    let points = vec![
        Point::new(0.0, 0.0),
        Point::new(50.0, 0.0),
        Point::new(50.0, 100.0),
        Point::new(150.0, 100.0),
    ];
    let line = Element::line(points.clone(), props, ElementStyle::default());
    let id = line.id.clone();

    let probe = {
        let mut ed = Editor::offline(options(Tool::Select)).with_document(document(&[line.clone()]));
        ed.set_selection([id.clone()]);
        ed.connector_handles()
    };
    let runs: Vec<_> = probe
        .iter()
        .filter(|h| matches!(h.kind, ConnectorHandleKind::Run(_)))
        .collect();
    assert_eq!(runs.len(), 3);

    for handle in runs {
        let mut ed = Editor::offline(options(Tool::Select)).with_document(document(&[line.clone()]));
        ed.set_selection([id.clone()]);
        drag(&mut ed, handle.position, handle.position + Vec2::new(30.0, 20.0), Modifiers::NONE, 0);

        let el = ed.document().get(&id).unwrap();
        assert!(elbow::is_orthogonal(&el.points, 1e-6), "{:?} -> {:?}", handle.kind, el.points);
        assert_eq!(el.points.first(), points.first());
        assert_eq!(el.points.last(), points.last());
        assert_ne!(el.points, points);
    }
}

#[test]
fn test_rotated_resize_keeps_opposite_corner() {
    let mut rect = filled_rect(Rect::new(0.0, 0.0, 100.0, 60.0));
    rect.rotation = 30.0;
    let id = rect.id.clone();
    let mut ed = Editor::offline(options(Tool::Select)).with_document(document(&[rect]));
    ed.set_selection([id.clone()]);

    let frame = ed.selection_frame().unwrap();
    let grab = frame.handle_position(ResizeHandle::SouthEast);
    let anchor = frame.handle_position(ResizeHandle::NorthWest);
    drag(&mut ed, grab, grab + Vec2::new(25.0, -10.0), Modifiers::NONE, 0);

    let el = ed.document().get(&id).unwrap();
    let after = SelectionFrame::for_elements(&[el]).unwrap();
    let moved = after.handle_position(ResizeHandle::NorthWest);
    assert!((moved - anchor).hypot() < 1e-6, "anchor moved to {moved:?}");
    assert!((el.rotation - 30.0).abs() < 1e-9);
    assert_ne!(el.box_props().unwrap().width, 100.0);
}

fn connected(hub: &MemoryHub, id: &str, name: &str, tool: Tool, doc: &Document) -> Editor {
    let transport = hub.connect(UserInfo::new(id, name, "#e53935"));
    let presence = PresenceManager::new(Box::new(transport));
    Editor::new(options(tool), presence).with_document(doc.clone())
}

#[test]
fn test_peer_selection_locks_element() {
    init_logging();
    let x = filled_rect(Rect::new(10.0, 10.0, 40.0, 40.0));
    let xid = x.id.clone();
    let doc = document(&[x]);
    let hub = MemoryHub::new();
    let mut local = connected(&hub, "local", "Local", Tool::Select, &doc);
    let mut peer = connected(&hub, "peer", "Peer", Tool::Select, &doc);

    peer.set_selection([xid.clone()]);
    peer.tick(0);
    local.poll_presence(0);
    assert!(local.is_locked(&xid));

    // Click, box-select and erase are all no-ops on the locked element.
    click(&mut local, Point::new(20.0, 20.0), Modifiers::NONE, 100);
    assert!(local.selection().is_empty());
    drag(&mut local, Point::new(0.0, 0.0), Point::new(60.0, 60.0), Modifiers::NONE, 1000);
    assert!(local.selection().is_empty());
    local.set_tool(Tool::Erase);
    drag(&mut local, Point::new(20.0, 0.0), Point::new(20.0, 60.0), Modifiers::NONE, 2000);
    assert!(local.document().contains(&xid));
    assert!(local.take_store_ops().is_empty());

    // Released by the peer: selectable again.
    peer.clear_selection();
    peer.tick(3000);
    local.poll_presence(3000);
    assert!(!local.is_locked(&xid));
    local.set_tool(Tool::Select);
    click(&mut local, Point::new(20.0, 20.0), Modifiers::NONE, 4000);
    assert_eq!(local.selection(), &[xid]);
}

#[test]
fn test_peer_lock_blocks_text_edit_entry() {
    let mut props = TextProps::new(Point::new(10.0, 10.0), "taken");
    TextMetrics::default().relayout(&mut props);
    let label = Element::text(props, ElementStyle::default());
    let id = label.id.clone();
    let inside = label.box_rect().unwrap().center();
    let doc = document(&[label]);
    let hub = MemoryHub::new();
    let mut local = connected(&hub, "local", "Local", Tool::Select, &doc);
    let mut peer = connected(&hub, "peer", "Peer", Tool::Select, &doc);

    peer.set_selection([id.clone()]);
    peer.tick(0);
    local.poll_presence(0);
    assert!(local.is_locked(&id));

    click(&mut local, inside, Modifiers::NONE, 100);
    click(&mut local, inside, Modifiers::NONE, 200);
    assert_eq!(local.editing_text_id(), None);
    assert!(local.selection().is_empty());

    // The text tool starts a fresh element instead of opening the locked one.
    local.set_tool(Tool::Text);
    click(&mut local, inside, Modifiers::NONE, 1000);
    let editing = local.editing_text_id().map(str::to_string);
    assert!(editing.is_some());
    assert_ne!(editing.as_deref(), Some(id.as_str()));
    assert!(local.key_down(Key::Escape, Modifiers::NONE));
    assert_eq!(local.editing_text_id(), None);
    assert!(local.take_store_ops().is_empty());
    assert_eq!(local.document().get(&id).and_then(|e| e.text_props()).map(|t| t.text.as_str()), Some("taken"));
}

#[test]
fn test_peers_see_drafts_and_live_text() {
    let hub = MemoryHub::new();
    let doc = Document::new();
    let mut local = connected(&hub, "local", "Local", Tool::Rectangle, &doc);
    let mut peer = connected(&hub, "peer", "Peer", Tool::Select, &doc);

    local.pointer_down(Point::ZERO, MouseButton::Left, Modifiers::NONE, 0);
    local.pointer_move(Point::new(40.0, 30.0), Modifiers::NONE);
    local.pointer_move(Point::new(80.0, 60.0), Modifiers::NONE);
    local.tick(40);
    peer.poll_presence(40);
    let drafts: Vec<_> = peer.presence().peers().drafts().collect();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].1.box_rect(), Some(Rect::new(0.0, 0.0, 80.0, 60.0)));
    let cursor = peer.presence().peer("local").and_then(|p| p.cursor);
    assert_eq!(cursor, Some(Point::new(80.0, 60.0)));
    assert_eq!(peer.remote_cursors(40).len(), 1);
    peer.set_options(CanvasOptions {
        show_remote_cursors: false,
        ..Default::default()
    });
    assert!(peer.remote_cursors(40).is_empty());

    local.pointer_up(Point::new(80.0, 60.0), Modifiers::NONE);
    local.set_tool(Tool::Text);
    click(&mut local, Point::new(200.0, 200.0), Modifiers::NONE, 1000);
    local.text_input("Hel");
    local.tick(1100);
    peer.poll_presence(1100);
    let typing = peer
        .presence()
        .peers()
        .drafts()
        .next()
        .and_then(|(_, el)| el.text_props())
        .map(|t| t.text.clone());
    assert_eq!(typing.as_deref(), Some("Hel"));
}
