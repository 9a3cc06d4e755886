//! Tests for flat index search ordering, clamping and validation.

use std::collections::HashMap;

use groundqa_rag::{Chunk, DistanceMetric, FlatIndex, RagError, VectorIndex, cosine_similarity};
use proptest::prelude::*;

fn chunk(id: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        document_id: "doc_1".to_string(),
        index: 0,
        start: 0,
        end: id.chars().count().max(1),
        text: format!("text of {id}"),
        metadata: HashMap::new(),
    }
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-3 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn entries(vectors: Vec<Vec<f32>>) -> Vec<(Chunk, Vec<f32>)> {
    vectors.into_iter().enumerate().map(|(i, v)| (chunk(&format!("c{i}")), v)).collect()
}

#[test]
fn empty_index_returns_empty_result() {
    let index = FlatIndex::build(Vec::new(), DistanceMetric::Cosine).unwrap();
    assert!(index.is_empty());
    assert_eq!(index.dimensions(), None);
    assert!(index.search(&[1.0, 2.0, 3.0], 5).unwrap().is_empty());
}

#[test]
fn zero_k_is_rejected() {
    let index = FlatIndex::build(entries(vec![vec![1.0, 0.0]]), DistanceMetric::Cosine).unwrap();
    let err = index.search(&[1.0, 0.0], 0).unwrap_err();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
}

#[test]
fn zero_k_is_rejected_on_empty_index() {
    let index = FlatIndex::build(Vec::new(), DistanceMetric::Cosine).unwrap();
    assert!(index.search(&[1.0], 0).is_err());
}

#[test]
fn k_larger_than_entry_count_is_clamped() {
    let index =
        FlatIndex::build(entries(vec![vec![1.0, 0.0], vec![0.0, 1.0]]), DistanceMetric::Cosine)
            .unwrap();
    let results = index.search(&[1.0, 0.0], 10).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.top().unwrap().chunk.id, "c0");
}

#[test]
fn build_rejects_mismatched_dimensions() {
    let vectors = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];
    let err = FlatIndex::build(entries(vectors), DistanceMetric::Cosine).unwrap_err();
    assert_eq!(err, RagError::DimensionMismatch { expected: 2, actual: 3 });
}

#[test]
fn build_with_dimensions_checks_first_vector_too() {
    let err =
        FlatIndex::build_with_dimensions(3, entries(vec![vec![1.0, 0.0]]), DistanceMetric::Cosine)
            .unwrap_err();
    assert_eq!(err, RagError::DimensionMismatch { expected: 3, actual: 2 });
}

#[test]
fn build_rejects_empty_and_non_finite_vectors() {
    let empty = FlatIndex::build(entries(vec![vec![]]), DistanceMetric::Cosine).unwrap_err();
    assert!(matches!(empty, RagError::InvalidConfiguration(_)));

    let nan =
        FlatIndex::build(entries(vec![vec![f32::NAN, 1.0]]), DistanceMetric::Cosine).unwrap_err();
    assert!(matches!(nan, RagError::InvalidConfiguration(_)));
}

#[test]
fn query_with_wrong_dimension_is_rejected() {
    let index = FlatIndex::build(entries(vec![vec![1.0, 0.0]]), DistanceMetric::Cosine).unwrap();
    let err = index.search(&[1.0, 0.0, 0.0], 1).unwrap_err();
    assert_eq!(err, RagError::DimensionMismatch { expected: 2, actual: 3 });
}

#[test]
fn ties_are_broken_by_insertion_order() {
    let index = FlatIndex::build(
        entries(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]]),
        DistanceMetric::Cosine,
    )
    .unwrap();

    let ids: Vec<String> =
        index.search(&[1.0, 0.0], 4).unwrap().iter().map(|hit| hit.chunk.id.clone()).collect();

    assert_eq!(ids, vec!["c1", "c2", "c3", "c0"]);
}

#[test]
fn zero_vector_scores_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);

    let index =
        FlatIndex::build(entries(vec![vec![0.0, 0.0], vec![-1.0, 0.0]]), DistanceMetric::Cosine)
            .unwrap();
    let results = index.search(&[1.0, 0.0], 2).unwrap();
    assert_eq!(results.as_slice()[0].chunk.id, "c0");
    assert_eq!(results.as_slice()[0].score, 0.0);
    assert!(results.as_slice()[1].score < 0.0);
}

#[test]
fn euclidean_metric_ranks_nearest_first() {
    let index = FlatIndex::build(
        entries(vec![vec![10.0, 10.0], vec![1.0, 1.0], vec![2.0, 2.0]]),
        DistanceMetric::Euclidean,
    )
    .unwrap();

    let results = index.search(&[1.0, 1.0], 3).unwrap();
    let ids: Vec<&str> = results.iter().map(|hit| hit.chunk.id.as_str()).collect();

    assert_eq!(ids, vec!["c1", "c2", "c0"]);
    assert!((results.as_slice()[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn duplicate_vector_resolves_to_earliest_entry() {
    let index = FlatIndex::build(
        entries(vec![vec![0.0, 1.0], vec![0.6, 0.8], vec![0.6, 0.8]]),
        DistanceMetric::Cosine,
    )
    .unwrap();

    let results = index.search(&[0.6, 0.8], 2).unwrap();

    assert_eq!(results.top().unwrap().chunk.id, "c1");
    assert_eq!(results.as_slice()[1].chunk.id, "c2");
    assert_eq!(results.as_slice()[0].score, results.as_slice()[1].score);
}

#[test]
fn entries_keep_insertion_ids() {
    let index =
        FlatIndex::build(entries(vec![vec![1.0], vec![2.0], vec![3.0]]), DistanceMetric::Cosine)
            .unwrap();
    let ids: Vec<usize> = index.entries().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(index.get(1).unwrap().chunk.id, "c1");
}

/// **Property: search ordering and monotonicity**
/// *For any* set of stored vectors and query, results are ordered by
/// non-increasing score, bounded by `k`, and the first `k1` results of a
/// `k2 > k1` search equal the `k1` search.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 0..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let count = vectors.len();
            let index = FlatIndex::build(entries(vectors), DistanceMetric::Cosine).unwrap();
            let results = index.search(&query, k).unwrap();

            prop_assert_eq!(results.len(), k.min(count));
            for window in results.as_slice().windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        #[test]
        fn smaller_k_is_prefix_of_larger_k(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k1 in 1usize..10,
            extra in 1usize..10,
        ) {
            let index = FlatIndex::build(entries(vectors), DistanceMetric::Cosine).unwrap();
            let small = index.search(&query, k1).unwrap();
            let large = index.search(&query, k1 + extra).unwrap();

            prop_assert_eq!(small.as_slice(), &large.as_slice()[..small.len()]);
        }

        #[test]
        fn stored_vector_finds_itself_first(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            pick in any::<prop::sample::Index>(),
        ) {
            let target = pick.index(vectors.len());
            let query = vectors[target].clone();
            let index = FlatIndex::build(entries(vectors), DistanceMetric::Cosine).unwrap();

            let top = index.search(&query, 1).unwrap().into_vec().remove(0);

            prop_assert!((top.score - 1.0).abs() < 1e-5);
            prop_assert_eq!(top.chunk.id, format!("c{target}"));
        }

        #[test]
        fn repeated_search_is_identical(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 0..20),
            query in arb_normalized_embedding(DIM),
        ) {
            let index = FlatIndex::build(entries(vectors), DistanceMetric::Cosine).unwrap();
            prop_assert_eq!(index.search(&query, 5).unwrap(), index.search(&query, 5).unwrap());
        }
    }
}
