use json_settings::{path::build_path, Error, SettingsStore};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn wait_for(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

fn parsed(path: &std::path::Path) -> Option<Value> {
    let raw = std::fs::read(path).ok()?;
    serde_json::from_slice(&raw).ok()
}

// ---- construction -------------------------------------------------------

#[test]
fn blank_path_is_invalid_argument() {
    for path in ["", "   "] {
        assert!(matches!(
            SettingsStore::open(path),
            Err(Error::InvalidArgument(_))
        ));
    }
}

#[test]
fn fresh_path_creates_zero_byte_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();

    let meta = std::fs::metadata(&path).unwrap();
    assert_eq!(meta.len(), 0);
    assert!(store.is_empty());
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a").join("b").join("settings.json");
    let _store = SettingsStore::open(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn existing_empty_file_loads_as_empty_map() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "").unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert!(store.is_empty());
}

#[test]
fn existing_file_loads_at_construction() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"lang":"fr","level":3}"#).unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.try_get("lang").unwrap().unwrap().1, json!("fr"));
    assert_eq!(store.try_get("level").unwrap().unwrap().1, json!(3));
}

#[test]
fn malformed_file_aborts_construction() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    assert!(matches!(
        SettingsStore::open(&path),
        Err(Error::Deserialize(_))
    ));
}

// ---- save / reload ------------------------------------------------------

#[test]
fn save_then_reopen_roundtrips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    {
        let store = SettingsStore::open(&path).unwrap();
        store.try_set("k1", "v1", false).unwrap();
        store.try_set("k2", 2, false).unwrap();
        store.save().unwrap();
    }
    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.try_get("k1").unwrap().unwrap().1, json!("v1"));
    assert_eq!(store.try_get("k2").unwrap().unwrap().1, json!(2));
}

#[test]
fn repeated_save_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();
    store.try_set("a", 1, false).unwrap();
    store.try_set("b", "two", false).unwrap();

    store.save().unwrap();
    let first = parsed(&path).unwrap();
    store.save().unwrap();
    let second = parsed(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn reload_discards_unsaved_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();

    store.try_set("kept", 1, false).unwrap();
    store.save().unwrap();
    store.try_set("discarded", 2, false).unwrap();

    store.reload().unwrap();
    assert!(store.exists("kept").unwrap());
    assert!(!store.exists("discarded").unwrap());
}

#[test]
fn explicit_reload_picks_up_external_edit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();

    std::fs::write(&path, r#"{"edited":"outside"}"#).unwrap();
    store.reload().unwrap();
    assert_eq!(store.try_get("edited").unwrap().unwrap().1, json!("outside"));
}

#[test]
fn pretty_output_is_indented_compact_is_not() {
    let dir = TempDir::new().unwrap();
    let pretty_path = dir.path().join("pretty.json");
    let compact_path = dir.path().join("compact.json");

    let pretty = SettingsStore::builder(&pretty_path).pretty(true).build().unwrap();
    pretty.try_set("hello", 1, false).unwrap();
    pretty.save().unwrap();

    let compact = SettingsStore::open(&compact_path).unwrap();
    compact.try_set("hello", 1, false).unwrap();
    compact.save().unwrap();

    let pretty_raw = std::fs::read_to_string(&pretty_path).unwrap();
    assert!(pretty_raw.contains('\n'));
    let compact_raw = std::fs::read_to_string(&compact_path).unwrap();
    assert!(!compact_raw.contains('\n'));
}

// ---- teardown -----------------------------------------------------------

#[test]
fn close_performs_final_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    {
        let mut store = SettingsStore::open(&path).unwrap();
        store.try_set("persisted", "on-close", false).unwrap();
        store.close().unwrap();
    }
    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(
        store.try_get("persisted").unwrap().unwrap().1,
        json!("on-close")
    );
}

#[test]
fn drop_persists_like_close() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    {
        let store = SettingsStore::open(&path).unwrap();
        store.try_set("persisted", "on-drop", false).unwrap();
    }
    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(
        store.try_get("persisted").unwrap().unwrap().1,
        json!("on-drop")
    );
}

// ---- async persist ------------------------------------------------------

#[test]
fn persist_flag_saves_in_background() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();

    store.try_set("a", "b", true).unwrap();
    assert!(wait_for(|| {
        parsed(&path).is_some_and(|v| v.get("a") == Some(&json!("b")))
    }));
    drop(store);
}

#[test]
fn set_persist_close_reopen_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    let mut store = SettingsStore::open(&path).unwrap();
    store.try_set("a", "b", true).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    store.close().unwrap();

    let reopened = SettingsStore::open(&path).unwrap();
    let (kind, value) = reopened.try_get("a").unwrap().unwrap();
    assert_eq!(kind, json_settings::ValueKind::String);
    assert_eq!(value, json!("b"));
}

#[test]
fn remove_with_persist_saves_even_when_nothing_removed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();
    store.try_set("stays", 1, false).unwrap();

    assert!(!store.try_remove("absent", true).unwrap());
    assert!(wait_for(|| {
        parsed(&path).is_some_and(|v| v.get("stays") == Some(&json!(1)))
    }));
}

// ---- path helper --------------------------------------------------------

#[test]
fn build_path_joins_and_creates_directories() {
    let dir = TempDir::new().unwrap();
    let path = build_path(dir.path(), &["myapp", "profiles"], "settings.json").unwrap();

    assert!(path.ends_with("myapp/profiles/settings.json"));
    assert!(path.parent().unwrap().is_dir());
}

#[test]
fn build_path_with_no_subfolders() {
    let dir = TempDir::new().unwrap();
    let path = build_path(dir.path(), &[], "settings.json").unwrap();
    assert_eq!(path, dir.path().join("settings.json"));
}

#[test]
fn build_path_rejects_blank_file_name() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        build_path(dir.path(), &["sub"], "  "),
        Err(Error::InvalidArgument(_))
    ));
}
