//! Tests for cosine similarity and the linear find-similar path.

use embedb::similarity::cosine_similarity;
use embedb::{EmbedError, EmbedStore};
use proptest::prelude::*;
use tempfile::tempdir;

/// Generator for a pair of same-dimension vectors with at least one
/// clearly non-zero component each.
fn arb_vector_pair() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (2usize..=64).prop_flat_map(|dim| {
        let vec_strategy = prop::collection::vec(-1.0e3f32..1.0e3f32, dim..=dim)
            .prop_filter("needs a non-degenerate norm", |v| {
                v.iter().any(|x| x.abs() > 1e-3)
            });
        (vec_strategy.clone(), vec_strategy)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Cosine similarity of non-zero vectors stays within [-1, 1] up to
    /// float tolerance.
    #[test]
    fn prop_cosine_bounds((a, b) in arb_vector_pair()) {
        let score = cosine_similarity(&a, &b);
        prop_assert!(score >= -1.0 - 1e-5, "score {} below -1", score);
        prop_assert!(score <= 1.0 + 1e-5, "score {} above 1", score);
    }

    /// A vector is maximally similar to itself.
    #[test]
    fn prop_cosine_self_is_one((a, _) in arb_vector_pair()) {
        let score = cosine_similarity(&a, &a);
        prop_assert!((score - 1.0).abs() < 1e-4, "self-similarity was {}", score);
    }

    /// Symmetry: cosine(a, b) == cosine(b, a).
    #[test]
    fn prop_cosine_symmetric((a, b) in arb_vector_pair()) {
        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-6);
    }
}

#[test]
fn test_find_similar_returns_nearest_match() {
    let dir = tempdir().expect("failed to create temp dir");
    let store = EmbedStore::open(dir.path().join("t.edb"), 3).expect("open");

    store.insert("a", &[1.0, 0.0, 0.0]).expect("insert");
    store.insert("b", &[0.9, 0.1, 0.0]).expect("insert");
    store.insert("c", &[0.0, 1.0, 0.0]).expect("insert");

    let (vector, score) = store
        .find_similar(&[0.95, 0.05, 0.0], 0.85)
        .expect("a near-parallel vector is stored");

    assert!(score >= 0.85);
    // The winner must be one of the two near-parallel vectors, not "c".
    assert!(vector == vec![1.0, 0.0, 0.0] || vector == vec![0.9, 0.1, 0.0]);
}

#[test]
fn test_find_similar_reports_best_score() {
    let dir = tempdir().expect("failed to create temp dir");
    let store = EmbedStore::open(dir.path().join("t.edb"), 2).expect("open");

    store.insert("exact", &[3.0, 4.0]).expect("insert");
    store.insert("orthogonal", &[-4.0, 3.0]).expect("insert");

    // The query is a scaled copy of "exact"; best score must be ~1.
    let (vector, score) = store.find_similar(&[0.6, 0.8], 0.5).expect("find");
    assert_eq!(vector, vec![3.0, 4.0]);
    assert!((score - 1.0).abs() < 1e-5);
}

#[test]
fn test_find_similar_below_threshold_is_not_found() {
    let dir = tempdir().expect("failed to create temp dir");
    let store = EmbedStore::open(dir.path().join("t.edb"), 2).expect("open");

    store.insert("orthogonal", &[0.0, 1.0]).expect("insert");

    assert!(matches!(
        store.find_similar(&[1.0, 0.0], 0.9),
        Err(EmbedError::NotFound)
    ));
}

#[test]
fn test_find_similar_on_empty_store_is_not_found() {
    let dir = tempdir().expect("failed to create temp dir");
    let store = EmbedStore::open(dir.path().join("t.edb"), 2).expect("open");

    assert!(matches!(
        store.find_similar(&[1.0, 0.0], -1.0),
        Err(EmbedError::NotFound)
    ));
}

#[test]
fn test_find_similar_survives_reopen() {
    let dir = tempdir().expect("failed to create temp dir");
    let path = dir.path().join("t.edb");

    {
        let store = EmbedStore::open(&path, 3).expect("open");
        store.insert("a", &[1.0, 0.0, 0.0]).expect("insert");
        store.insert("c", &[0.0, 1.0, 0.0]).expect("insert");
        store.close().expect("close");
    }

    let store = EmbedStore::open(&path, 3).expect("reopen");
    let (vector, score) = store.find_similar(&[1.0, 0.1, 0.0], 0.9).expect("find");
    assert_eq!(vector, vec![1.0, 0.0, 0.0]);
    assert!(score > 0.99);
}
