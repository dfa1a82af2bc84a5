//! Text-to-vector embedding pipeline.
//!
//! [`EmbeddingBackend`] is the synchronous inference seam, implemented locally
//! with all-MiniLM-L6-v2 (384 dimensions, L2-normalized) via ONNX Runtime.
//! [`SharedEmbedder`] wraps a backend in a lazily-initialized handle so the
//! model loads at most once per process, even under concurrent first calls.

pub mod local;
pub mod shared;

use std::sync::Arc;

use anyhow::Result;

pub use shared::SharedEmbedder;

/// Number of dimensions in the embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Synchronous embedding inference.
///
/// Implementations produce L2-normalized vectors of exactly [`EMBEDDING_DIM`]
/// dimensions, batch-preserving input order and length. Methods are blocking —
/// async callers go through [`SharedEmbedder`], which runs inference on the
/// blocking pool.
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a batch of texts. An empty batch returns an empty vec.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Number of dimensions this backend produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create a backend from config. Currently only `"local"` is supported
/// (ONNX Runtime + all-MiniLM-L6-v2). Errors if model files are missing —
/// run `tramvia model download` first.
pub fn create_backend(
    config: &crate::config::EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingBackend>> {
    match config.provider.as_str() {
        "local" => {
            let backend = local::LocalBackend::new(config)?;
            Ok(Arc::new(backend))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local"),
    }
}
