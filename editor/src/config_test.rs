use super::*;
use std::collections::HashMap;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_unset() {
    let config = EditorConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, EditorConfig::default());
    assert!(config.environment.is_edit());
    assert_eq!(config.history_depth, 100);
    assert_eq!(config.api_base, "http://localhost:3000");
}

#[test]
fn reads_all_values() {
    let config = EditorConfig::from_lookup(lookup(&[
        ("EDITOR_ENV", "preview"),
        ("EDITOR_HISTORY_DEPTH", " 25 "),
        ("EDITOR_API_BASE", "https://pages.example.com/"),
    ]))
    .unwrap();
    assert_eq!(config.environment, Environment::Other("preview".into()));
    assert_eq!(config.history_depth, 25);
    assert_eq!(config.api_base, "https://pages.example.com");
}

#[test]
fn rejects_bad_history_depth() {
    for bad in ["zero", "-1", "0"] {
        let err = EditorConfig::from_lookup(lookup(&[("EDITOR_HISTORY_DEPTH", bad)])).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { var: "EDITOR_HISTORY_DEPTH", value: bad.into() });
    }
}

#[test]
fn rejects_empty_api_base() {
    let err = EditorConfig::from_lookup(lookup(&[("EDITOR_API_BASE", "/")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "EDITOR_API_BASE", .. }));
}
