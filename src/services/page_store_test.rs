use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use editor::layout::LayoutNode;

static SEQ: AtomicUsize = AtomicUsize::new(0);

fn scratch(name: &str) -> PathBuf {
    let n = SEQ.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("pagebuilder-store-{}-{n}", std::process::id())).join(name)
}

#[tokio::test]
async fn missing_files_load_empty() {
    let dir = scratch("absent.json");
    assert!(load_page(&dir).await.unwrap().nodes.is_empty());
    assert!(load_menu(&dir).await.unwrap().is_empty());
    assert!(load_hook(&dir).await.unwrap().is_empty());
}

#[tokio::test]
async fn save_then_load_returns_same_tree() {
    let path = scratch("nested/page.json");
    let mut root = LayoutNode::new("root", "View", "");
    root.children = Some(vec![LayoutNode::new("a", "Image", "gallery")]);
    let tree = LayoutTree::new(vec![root]);

    save_page(&path, &tree).await.unwrap();
    assert_eq!(load_page(&path).await.unwrap(), tree);

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    assert!(!Path::new(&tmp).exists());
}

#[tokio::test]
async fn corrupt_page_is_an_error_not_empty() {
    let path = scratch("page.json");
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, b"{not json").await.unwrap();

    let err = load_page(&path).await.unwrap_err();
    assert_eq!(err.error_code(), "E_STORE_JSON");
    assert_eq!(err.envelope_code(), 500);
}

#[tokio::test]
async fn invalid_tree_is_layout_error() {
    let path = scratch("page.json");
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, br#"[{"el": "a", "name": "View"}, {"el": "a", "name": "View"}]"#)
        .await
        .unwrap();

    let err = load_page(&path).await.unwrap_err();
    assert!(matches!(err, PageStoreError::Layout(LayoutError::DuplicateId { .. })));
    assert_eq!(err.envelope_code(), 400);
}

#[tokio::test]
async fn menu_and_hook_parse() {
    let menu_path = scratch("menu.json");
    let hook_path = menu_path.with_file_name("hook.json");
    tokio::fs::create_dir_all(menu_path.parent().unwrap()).await.unwrap();
    tokio::fs::write(
        &menu_path,
        br#"[{"name": "Image", "module": "/c/Image.js", "variants": {"gallery": "/c/Image.g.js"}}]"#,
    )
    .await
    .unwrap();
    tokio::fs::write(&hook_path, br#"{"Image": "http://localhost:8081/Image.js"}"#).await.unwrap();

    let menu = load_menu(&menu_path).await.unwrap();
    assert_eq!(menu, vec![ComponentManifest::new("Image", "/c/Image.js").with_variant("gallery", "/c/Image.g.js")]);
    assert_eq!(load_hook(&hook_path).await.unwrap()["Image"], "http://localhost:8081/Image.js");
}
