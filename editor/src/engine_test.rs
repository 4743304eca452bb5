use super::*;
use serde_json::json;

use crate::compile::{Environment, TreeCompiler};
use crate::gesture::Point;
use crate::layout::LayoutNode;
use crate::loader::{ComponentManifest, RegistryLoader};
use crate::scheduler::{CompilationScheduler, TriggerOutcome};

fn page() -> LayoutTree {
    LayoutTree::from_json(
        r#"[{"el": "root", "name": "View", "children": [
                {"el": "box", "name": "View", "style": {"position": "absolute", "width": "100px", "height": 50, "left": 10, "top": 10}},
                {"el": "img", "name": "Image", "props": {"src": "a.png"}}
            ]}]"#,
    )
    .unwrap()
}

fn core() -> EditorCore {
    EditorCore::new(page(), 50)
}

fn down(handle: Handle, x: f64, y: f64) -> PointerEvent {
    PointerEvent::Down {
        target: "box".into(),
        handle,
        pointer: Point::new(x, y),
        rendered: BoxModel::new(100.0, 50.0, 10.0, 10.0),
    }
}

fn box_of(core: &EditorCore) -> BoxModel {
    BoxModel::from_style(&core.tree().find("box").unwrap().style)
}

// =============================================================
// Action wire format
// =============================================================

#[test]
fn edit_comp_box_serializes_as_type_and_payload() {
    let action = Action::EditCompBox(EditCompBox {
        el: "box".into(),
        handle: Handle::Rb,
        client_x: 120.0,
        client_y: 60.0,
        current: BoxModel::new(120.0, 60.0, 10.0, 10.0),
    });
    let value = serde_json::to_value(&action).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "EDIT_COMP_BOX",
            "payload": {
                "el": "box",
                "handle": "RB",
                "clientX": 120.0,
                "clientY": 60.0,
                "current": {"width": 120.0, "height": 60.0, "position": {"left": 10.0, "top": 10.0}}
            }
        })
    );
    let back: Action = serde_json::from_value(value).unwrap();
    assert_eq!(back, action);
}

#[test]
fn unit_actions_serialize_type_only() {
    assert_eq!(serde_json::to_value(Action::Undo).unwrap(), json!({"type": "UNDO"}));
    assert_eq!(
        serde_json::to_value(Action::Select(Some("a".into()))).unwrap(),
        json!({"type": "SELECT", "payload": "a"})
    );
}

// =============================================================
// apply
// =============================================================

#[test]
fn new_core_records_initial_tree() {
    let c = core();
    assert_eq!(c.history().len(), 1);
    assert!(c.selection().is_none());
    assert!(!c.gesture().is_active());
}

#[test]
fn select_changes_compile_input() {
    let mut c = core();
    let change = c.apply(Action::Select(Some("box".into()))).unwrap().unwrap();
    assert_eq!(change.selection.as_deref(), Some("box"));
    assert!(c.apply(Action::Select(Some("box".into()))).unwrap().is_none());
    assert_eq!(c.history().len(), 1);
}

#[test]
fn select_unknown_node_fails() {
    let mut c = core();
    let err = c.apply(Action::Select(Some("ghost".into()))).unwrap_err();
    assert_eq!(err, EditError::UnknownNode("ghost".into()));
    assert!(c.selection().is_none());
}

#[test]
fn edit_comp_box_writes_style_and_records() {
    let mut c = core();
    let action = Action::EditCompBox(EditCompBox {
        el: "box".into(),
        handle: Handle::Mm,
        client_x: 0.0,
        client_y: 0.0,
        current: BoxModel::new(100.0, 50.0, 40.0, 30.0),
    });
    assert!(c.apply(action).unwrap().is_some());
    assert_eq!(box_of(&c), BoxModel::new(100.0, 50.0, 40.0, 30.0));
    assert_eq!(c.tree().find("box").unwrap().style["position"], "absolute");
    assert_eq!(c.history().len(), 2);
}

#[test]
fn edit_comp_box_unknown_target_leaves_tree() {
    let mut c = core();
    let before = Arc::clone(c.tree());
    let action = Action::EditCompBox(EditCompBox {
        el: "ghost".into(),
        handle: Handle::Rb,
        client_x: 0.0,
        client_y: 0.0,
        current: BoxModel::default(),
    });
    assert_eq!(c.apply(action).unwrap_err(), EditError::UnknownNode("ghost".into()));
    assert_eq!(**c.tree(), *before);
}

#[test]
fn replace_tree_validates() {
    let mut c = core();
    let dup = LayoutTree::new(vec![LayoutNode::new("a", "View", ""), LayoutNode::new("a", "View", "")]);
    assert!(matches!(c.apply(Action::ReplaceTree(dup)).unwrap_err(), EditError::Layout(_)));
    assert_eq!(c.history().len(), 1);
}

#[test]
fn undo_redo_round_trip_without_rerecording() {
    let mut c = core();
    let original = Arc::clone(c.tree());
    let edited = LayoutTree::new(vec![LayoutNode::new("solo", "View", "")]);
    c.apply(Action::ReplaceTree(edited.clone())).unwrap();

    let undo = c.apply(Action::Undo).unwrap().unwrap();
    assert_eq!(*undo.tree, *original);
    assert_eq!(c.history().len(), 2);

    let redo = c.apply(Action::Redo).unwrap().unwrap();
    assert_eq!(*redo.tree, edited);
    assert_eq!(c.history().len(), 2);
}

#[test]
fn undo_at_boundary_is_noop() {
    let mut c = core();
    assert!(c.apply(Action::Undo).unwrap().is_none());
    assert!(c.apply(Action::Redo).unwrap().is_none());
}

#[test]
fn focused_edits_batch_into_one_history_point() {
    let mut c = core();
    c.set_input_focus(true);
    for text in ["h", "he", "hel"] {
        let mut next = LayoutTree::clone(c.tree());
        next.find_mut("img").unwrap().props.insert("alt".into(), json!(text));
        c.apply(Action::ReplaceTree(next)).unwrap();
    }
    assert_eq!(c.history().len(), 1);

    c.set_input_focus(false);
    assert_eq!(c.history().len(), 2);
    assert_eq!(c.history().current().unwrap().find("img").unwrap().props["alt"], "hel");
}

// =============================================================
// Gestures
// =============================================================

#[test]
fn bottom_right_drag_resizes_node() {
    let mut c = core();
    c.pointer(down(Handle::Rb, 200.0, 100.0)).unwrap();
    assert!(c.gesture().is_active());

    let change = c.pointer(PointerEvent::Move(Point::new(220.0, 110.0))).unwrap();
    assert!(change.is_some());
    assert_eq!(box_of(&c), BoxModel::new(120.0, 60.0, 10.0, 10.0));

    c.pointer(PointerEvent::Up).unwrap();
    assert!(!c.gesture().is_active());
}

#[test]
fn gesture_records_one_history_point() {
    let mut c = core();
    c.pointer(down(Handle::Lt, 0.0, 0.0)).unwrap();
    for step in 1..=5 {
        let d = f64::from(step) * 4.0;
        c.pointer(PointerEvent::Move(Point::new(d, d / 2.0))).unwrap();
    }
    assert_eq!(c.history().len(), 1);

    c.pointer(PointerEvent::Leave).unwrap();
    assert_eq!(c.history().len(), 2);
    assert_eq!(box_of(&c), BoxModel::new(80.0, 40.0, 30.0, 20.0));

    c.apply(Action::Undo).unwrap();
    assert_eq!(box_of(&c), BoxModel::new(100.0, 50.0, 10.0, 10.0));
}

#[test]
fn pointer_move_while_idle_changes_nothing() {
    let mut c = core();
    assert!(c.pointer(PointerEvent::Move(Point::new(5.0, 5.0))).unwrap().is_none());
    assert!(c.pointer(PointerEvent::Up).unwrap().is_none());
    assert_eq!(c.history().len(), 1);
}

#[test]
fn down_on_unknown_node_errors_and_stays_idle() {
    let mut c = core();
    let err = c
        .pointer(PointerEvent::Down {
            target: "ghost".into(),
            handle: Handle::Mm,
            pointer: Point::default(),
            rendered: BoxModel::default(),
        })
        .unwrap_err();
    assert_eq!(err, EditError::UnknownNode("ghost".into()));
    assert!(!c.gesture().is_active());
    assert!(c.gesture().state().is_none());

    assert!(c.pointer(PointerEvent::Move(Point::new(5.0, 5.0))).unwrap().is_none());
    assert_eq!(c.history().len(), 1);
}

#[test]
fn click_on_handle_without_move_changes_nothing() {
    let mut c = core();
    let before = Arc::clone(c.tree());

    assert!(c.pointer(down(Handle::Rb, 200.0, 100.0)).unwrap().is_none());
    assert!(c.gesture().is_active());
    assert!(c.pointer(PointerEvent::Up).unwrap().is_none());

    assert_eq!(**c.tree(), *before);
    assert_eq!(c.tree().find("box").unwrap().style["width"], "100px");
    assert_eq!(c.history().len(), 1);
}

// =============================================================
// Closed loop with the scheduler
// =============================================================

#[tokio::test]
async fn edits_flow_through_scheduler() {
    let loader = RegistryLoader::from_manifests([
        ComponentManifest::new("View", "/comp/View.js"),
        ComponentManifest::new("Image", "/comp/Image.js"),
    ]);
    let scheduler = CompilationScheduler::new(TreeCompiler::new(Arc::new(loader)), Environment::Edit);
    let mut c = core();

    scheduler.trigger(c.compile_input()).await;
    assert!(scheduler.latest().unwrap().tree.find("box").unwrap().overlay.is_none());

    let selected = c.apply(Action::Select(Some("box".into()))).unwrap().unwrap();
    assert_eq!(scheduler.trigger(selected).await, TriggerOutcome::Drained { passes: 1 });
    assert!(scheduler.latest().unwrap().tree.find("box").unwrap().overlay.is_some());

    c.pointer(down(Handle::Mm, 0.0, 0.0)).unwrap();
    let moved = c.pointer(PointerEvent::Move(Point::new(5.0, 7.0))).unwrap().unwrap();
    scheduler.trigger(moved).await;

    let published = scheduler.latest().unwrap();
    let style = &published.tree.find("box").unwrap().style;
    assert_eq!(style["left"], 15.0);
    assert_eq!(style["top"], 17.0);
    assert_eq!(style["cursor"], "default");
}
