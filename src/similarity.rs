// Copyright (c) 2025 EmbeDB Contributors
// Licensed under the EmbeDB License. See LICENSE file for details.

//! Cosine similarity kernel for the linear search path.
//!
//! Higher values mean more similar: 1 for identical direction, 0 for
//! orthogonal, -1 for opposite. Accumulation runs in single precision
//! to match the stored f32 payloads; only the square roots go through
//! f64. For 1536-dimensional vectors expect ~1μs per comparison.
//!
//! NaN inputs are not normalized; callers own the quality of their
//! embeddings.

/// Cosine similarity: `(a·b) / (|a||b|)`, in [-1, 1].
///
/// Returns 0 when either vector has zero norm (no direction to compare)
/// and -1 when the lengths differ. Length mismatches are guarded at the
/// store boundary, so the -1 path only matters for direct callers.
///
/// # Examples
///
/// ```rust
/// use embedb::similarity::cosine_similarity;
///
/// let a = [1.0f32, 0.0, 0.0];
/// let b = [0.0f32, 1.0, 0.0];
///
/// assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
/// assert!(cosine_similarity(&a, &b).abs() < 1e-6);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return -1.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / ((f64::from(norm_a).sqrt() as f32) * (f64::from(norm_b).sqrt() as f32))
}
