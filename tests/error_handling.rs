//! Error handling and edge case tests.

use statesync::{
    FileStorage, LoadOutcome, MemoryStorage, StateError, StatePatch, StateStore, StaticLocation,
    StorageBackend, StoreConfig, UrlOverlay,
};
use std::sync::Arc;
use tempfile::TempDir;

fn test_store(href: &str) -> StateStore {
    StateStore::new(StoreConfig::default(), Arc::new(StaticLocation::new(href)))
}

// --- URL Errors ---

#[test]
fn test_invalid_port_is_typed_error() {
    let store = test_store("https://example.com/");
    let result = store.update_url(Some("https://example.com:70000/"));
    assert!(matches!(result, Err(StateError::InvalidUrl(_))));
    // Failed parse leaves no cached URL behind
    assert!(store.url().is_none());
}

#[test]
fn test_unusable_location() {
    let store = test_store("not a url");

    assert!(matches!(store.update_url(None), Err(StateError::InvalidUrl(_))));
    assert!(matches!(
        store.reflect_state_in_url(None, None),
        Err(StateError::InvalidUrl(_))
    ));
}

#[test]
fn test_join_without_href_or_base_fails_loudly() {
    let store = test_store("about-blank");
    let overlay = UrlOverlay {
        pathname: Some("x".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        store.join_url(Some(&overlay)),
        Err(StateError::InvalidUrl(_))
    ));
}

#[test]
fn test_join_with_href_needs_no_base() {
    let store = test_store("about-blank");
    let overlay = UrlOverlay {
        href: Some("https://example.com/ok".to_string()),
        ..Default::default()
    };
    assert_eq!(store.join_url(Some(&overlay)).unwrap(), "https://example.com/ok");
}

#[test]
fn test_malformed_query_escape() {
    let store = test_store("https://example.com/");
    let result = store.update_url(Some("/?q=%E0%A4%A"));
    assert!(matches!(result, Err(StateError::Decode(_))));
    assert!(store.url().is_none());
    assert!(store.query().is_none());
}

#[test]
fn test_failed_update_keeps_previous_url_and_query() {
    let store = test_store("https://example.com/");
    let before = store.update_url(Some("/a?old=1")).unwrap();
    let url = store.url();
    let query = store.query();

    let result = store.update_url(Some("/b?x=%ZZ"));

    assert!(matches!(result, Err(StateError::Decode(_))));
    assert_eq!(store.url(), url);
    assert_eq!(store.query(), query);
    assert_eq!(store.reflect_state().unwrap(), before);
    assert_eq!(store.url().unwrap().pathname, "a");
}

// --- Storage Errors ---

#[test]
fn test_load_corrupt_slot() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item("slot", "{not json").unwrap();
    let store = test_store("https://example.com/").with_storage(storage);

    let result = store.load_state("slot");
    assert!(matches!(result, Err(StateError::Deserialization(_))));
    assert!(store.state().is_none());
}

#[test]
fn test_load_nested_slot() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item("slot", "{\"a\":{\"b\":1}}").unwrap();
    let store = test_store("https://example.com/").with_storage(storage);

    let result = store.load_state("slot");
    assert!(matches!(result, Err(StateError::InvalidValue { .. })));
}

#[test]
fn test_disabled_storage_is_a_sentinel() {
    let store =
        test_store("https://example.com/").with_storage(Arc::new(MemoryStorage::disabled()));
    store.update_state(&StatePatch::new().set("a", 1), false);

    assert!(!store.save_state("slot", None, None).unwrap());
    assert_eq!(store.load_state("slot").unwrap(), LoadOutcome::Unavailable);
    assert!(!store.delete_state("slot").unwrap());
}

#[test]
fn test_save_before_any_state() {
    let storage = Arc::new(MemoryStorage::new());
    let store = test_store("https://example.com/").with_storage(storage.clone());

    assert!(store.save_state("slot", None, None).unwrap());
    assert_eq!(storage.get_item("slot").unwrap().as_deref(), Some("{}"));
}

#[test]
fn test_file_storage_locked() {
    let dir = TempDir::new().unwrap();
    let _held = FileStorage::open(dir.path()).unwrap();

    assert!(matches!(FileStorage::open(dir.path()), Err(StateError::Locked)));
}
