//! Tests that every dimension guard fires, carries the right origin,
//! and leaves the store untouched.

use embedb::{DimensionOrigin, EmbedError, EmbedStore};
use tempfile::tempdir;

#[test]
fn test_insert_wrong_dimension_leaves_store_unchanged() {
    let dir = tempdir().expect("failed to create temp dir");
    let path = dir.path().join("t.edb");
    let store = EmbedStore::open(&path, 3).expect("open");

    store.insert("good", &[1.0, 2.0, 3.0]).expect("insert");
    let file_before = std::fs::read(&path).expect("read file");

    match store.insert("x", &[0.1, 0.2]) {
        Err(EmbedError::DimensionMismatch {
            origin,
            expected,
            got,
        }) => {
            assert_eq!(origin, DimensionOrigin::Insert);
            assert_eq!(expected, 3);
            assert_eq!(got, 2);
        }
        other => panic!("expected DimensionMismatch, got {:?}", other),
    }

    // The failed insert must not have written a byte.
    let file_after = std::fs::read(&path).expect("read file");
    assert_eq!(file_after, file_before);

    // And the key must not exist.
    assert!(matches!(store.get("x"), Err(EmbedError::NotFound)));
    assert_eq!(store.stats().expect("stats").records, 1);
}

#[test]
fn test_oversized_insert_also_rejected() {
    let dir = tempdir().expect("failed to create temp dir");
    let store = EmbedStore::open(dir.path().join("t.edb"), 2).expect("open");

    assert!(matches!(
        store.insert("x", &[0.1, 0.2, 0.3]),
        Err(EmbedError::DimensionMismatch {
            origin: DimensionOrigin::Insert,
            ..
        })
    ));
}

#[test]
fn test_query_dimension_guard() {
    let dir = tempdir().expect("failed to create temp dir");
    let store = EmbedStore::open(dir.path().join("t.edb"), 3).expect("open");
    store.insert("a", &[1.0, 0.0, 0.0]).expect("insert");

    match store.find_similar(&[1.0, 0.0], 0.5) {
        Err(EmbedError::DimensionMismatch { origin, .. }) => {
            assert_eq!(origin, DimensionOrigin::Query);
        }
        other => panic!("expected DimensionMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_open_dimension_guard_is_distinguishable() {
    let dir = tempdir().expect("failed to create temp dir");
    let path = dir.path().join("t.edb");

    {
        let store = EmbedStore::open(&path, 3).expect("open");
        store.close().expect("close");
    }

    // The open-time origin lets callers tell a wrong file apart from a
    // wrong vector.
    match EmbedStore::open(&path, 8) {
        Err(EmbedError::DimensionMismatch { origin, .. }) => {
            assert_eq!(origin, DimensionOrigin::Open);
        }
        other => panic!("expected DimensionMismatch, got {:?}", other.map(|_| ())),
    }
}
