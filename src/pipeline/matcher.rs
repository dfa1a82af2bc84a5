//! Semantic ranking of corpus items against a query.

use super::index::VectorIndex;
use super::types::MatchResult;
use crate::embedding::SharedEmbedder;
use crate::error::Result;

/// Embed `query` and rank every indexed item by cosine similarity.
///
/// Returns at most `top_k` results sorted by descending score; exact ties
/// keep corpus insertion order (the sort is stable). An empty index returns
/// `[]` without invoking the embedding model.
pub async fn search(
    embedder: &SharedEmbedder,
    query: &str,
    index: &VectorIndex,
    top_k: usize,
) -> Result<Vec<MatchResult>> {
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let query_vec = embedder.embed_one(query).await?;

    let mut results: Vec<MatchResult> = index
        .items()
        .iter()
        .zip(index.embeddings())
        .map(|(item, vec)| MatchResult {
            item: item.clone(),
            score: cosine_similarity(&query_vec, vec),
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);
    Ok(results)
}

/// Cosine similarity: `dot(a, b) / (‖a‖ × ‖b‖)`. If either norm is zero the
/// denominator is taken as 1, so similarity to an all-zero vector is the dot
/// product itself, i.e. 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let denom = norm_a * norm_b;
    if denom > 0.0 {
        dot / denom
    } else {
        dot
    }
}
