//! Lazily-loaded, shareable embedder handle.
//!
//! The underlying model must load at most once per process. A plain "loaded"
//! flag races when two tasks hit the first call together, so the guard here is
//! a [`tokio::sync::OnceCell`]: the first caller's init future is shared, and
//! concurrent first callers await the same in-flight load instead of starting
//! a second one.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{create_backend, EmbeddingBackend};
use crate::config::EmbeddingConfig;
use crate::error::{PipelineError, Result};

type Loader = Box<dyn Fn() -> anyhow::Result<Arc<dyn EmbeddingBackend>> + Send + Sync>;

/// Handle to the embedding model with lazy, race-free initialization.
pub struct SharedEmbedder {
    cell: OnceCell<Arc<dyn EmbeddingBackend>>,
    loader: Loader,
}

impl SharedEmbedder {
    /// Lazy embedder that loads the configured backend on first use.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let config = config.clone();
        Self::with_loader(move || create_backend(&config))
    }

    /// Lazy embedder with a custom backend loader.
    pub fn with_loader(
        loader: impl Fn() -> anyhow::Result<Arc<dyn EmbeddingBackend>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// Embedder around an already-constructed backend. No lazy load happens.
    pub fn preloaded(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(backend)),
            loader: Box::new(|| unreachable!("cell is pre-populated")),
        }
    }

    /// Embed a batch of texts, loading the model first if needed.
    ///
    /// An empty batch returns an empty vec without touching the model. Load
    /// failures surface as [`PipelineError::ModelLoad`] — callers must not
    /// substitute zero vectors.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let backend = self.backend().await?;
        let owned = texts.to_vec();

        // Inference is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
            backend.embed_batch(&refs)
        })
        .await
        .map_err(|e| PipelineError::Embedding(format!("inference task failed: {e}")))?
        .map_err(|e| PipelineError::Embedding(e.to_string()))
    }

    /// Embed a single query string.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| PipelineError::Embedding("backend returned empty batch".into()))
    }

    async fn backend(&self) -> Result<Arc<dyn EmbeddingBackend>> {
        let backend = self
            .cell
            .get_or_try_init(|| async {
                tracing::debug!("loading embedding backend");
                (self.loader)().map_err(|e| PipelineError::ModelLoad(e.to_string()))
            })
            .await?;
        Ok(backend.clone())
    }
}
