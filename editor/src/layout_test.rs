use super::*;
use serde_json::json;

const PAGE: &str = r#"[
    {"el": "root", "name": "View", "hook": "default", "style": {"position": "relative", "width": 100},
     "children": [
        {"el": "hero", "name": "Image", "hook": "static", "props": {"src": "a.png"}},
        {"el": "hidden", "name": "View", "hide": true, "children": [
            {"el": "inner", "name": "Image"}
        ]}
     ]}
]"#;

// =============================================================
// Parsing
// =============================================================

#[test]
fn parses_wire_field_names() {
    let tree = LayoutTree::from_json(PAGE).unwrap();
    let root = &tree.nodes[0];
    assert_eq!(root.id, "root");
    assert_eq!(root.component, "View");
    assert_eq!(root.variant, "default");
    assert!(!root.hidden);
    assert_eq!(root.children().len(), 2);
    assert_eq!(root.position(), Some("relative"));
}

#[test]
fn optional_fields_default() {
    let tree = LayoutTree::from_json(r#"[{"el": "a", "name": "View"}]"#).unwrap();
    let node = &tree.nodes[0];
    assert_eq!(node.variant, "");
    assert!(!node.hidden);
    assert!(node.style.is_empty());
    assert!(node.props.is_empty());
    assert!(node.children.is_none());
    assert!(node.children().is_empty());
}

#[test]
fn hidden_flag_parses() {
    let tree = LayoutTree::from_json(PAGE).unwrap();
    assert!(tree.find("hidden").unwrap().hidden);
}

#[test]
fn missing_el_is_malformed() {
    let err = LayoutTree::from_json(r#"[{"name": "View"}]"#).unwrap_err();
    assert!(matches!(err, LayoutError::Malformed(ref m) if m.contains("el")));
}

#[test]
fn missing_name_is_malformed() {
    let err = LayoutTree::from_json(r#"[{"el": "a"}]"#).unwrap_err();
    assert!(matches!(err, LayoutError::Malformed(ref m) if m.contains("name")));
}

#[test]
fn non_array_root_is_malformed() {
    let err = LayoutTree::from_json(r#"{"el": "a", "name": "View"}"#).unwrap_err();
    assert!(matches!(err, LayoutError::Malformed(_)));
}

#[test]
fn from_value_validates() {
    let err = LayoutTree::from_value(json!([{"el": "", "name": "View"}])).unwrap_err();
    assert_eq!(err, LayoutError::EmptyField { field: "el", path: "$[0]".into() });
}

// =============================================================
// Validation
// =============================================================

#[test]
fn empty_name_reports_path() {
    let err = LayoutTree::from_json(r#"[{"el": "a", "name": "View", "children": [{"el": "b", "name": ""}]}]"#)
        .unwrap_err();
    assert_eq!(err, LayoutError::EmptyField { field: "name", path: "$[0].children[0]".into() });
}

#[test]
fn duplicate_ids_rejected_across_levels() {
    let err = LayoutTree::from_json(r#"[{"el": "a", "name": "View", "children": [{"el": "a", "name": "Image"}]}]"#)
        .unwrap_err();
    assert_eq!(err, LayoutError::DuplicateId { id: "a".into(), path: "$[0].children[0]".into() });
}

#[test]
fn hidden_subtrees_still_validated() {
    let err = LayoutTree::from_json(
        r#"[{"el": "a", "name": "View", "hide": true, "children": [{"el": "a", "name": "Image"}]}]"#,
    )
    .unwrap_err();
    assert!(matches!(err, LayoutError::DuplicateId { .. }));
}

#[test]
fn error_messages_are_descriptive() {
    let err = LayoutError::DuplicateId { id: "x".into(), path: "$[1]".into() };
    assert_eq!(err.to_string(), "duplicate node id `x` at $[1]");
}

// =============================================================
// Lookup
// =============================================================

#[test]
fn find_reaches_nested_nodes() {
    let tree = LayoutTree::from_json(PAGE).unwrap();
    assert_eq!(tree.find("inner").unwrap().component, "Image");
    assert!(tree.find("missing").is_none());
}

#[test]
fn find_mut_edits_in_place() {
    let mut tree = LayoutTree::from_json(PAGE).unwrap();
    tree.find_mut("hero").unwrap().hidden = true;
    assert!(tree.find("hero").unwrap().hidden);
}

#[test]
fn serializes_back_to_wire_shape() {
    let tree = LayoutTree::new(vec![LayoutNode::new("a", "View", "v1")]);
    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(value, json!([{"el": "a", "name": "View", "hook": "v1", "hide": false, "style": {}, "props": {}}]));
}

// =============================================================
// BoxModel
// =============================================================

#[test]
fn css_px_accepts_numbers_and_px_strings() {
    assert_eq!(css_px(&json!(12)), Some(12.0));
    assert_eq!(css_px(&json!(12.5)), Some(12.5));
    assert_eq!(css_px(&json!("40px")), Some(40.0));
    assert_eq!(css_px(&json!(" 7 ")), Some(7.0));
    assert_eq!(css_px(&json!("auto")), None);
    assert_eq!(css_px(&json!(null)), None);
}

#[test]
fn box_from_style_defaults_missing_to_zero() {
    let mut style = Style::new();
    style.insert("width".into(), json!("100px"));
    style.insert("top".into(), json!(5));
    let b = BoxModel::from_style(&style);
    assert_eq!(b, BoxModel::new(100.0, 0.0, 0.0, 5.0));
}

#[test]
fn box_write_then_read() {
    let mut style = Style::new();
    style.insert("color".into(), json!("red"));
    BoxModel::new(120.0, 60.0, 10.0, 20.0).write_to(&mut style);
    assert_eq!(BoxModel::from_style(&style), BoxModel::new(120.0, 60.0, 10.0, 20.0));
    assert_eq!(style.get("color"), Some(&json!("red")));
}

#[test]
fn box_serializes_nested_position() {
    let value = serde_json::to_value(BoxModel::new(1.0, 2.0, 3.0, 4.0)).unwrap();
    assert_eq!(value, json!({"width": 1.0, "height": 2.0, "position": {"left": 3.0, "top": 4.0}}));
}
