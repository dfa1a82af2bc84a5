//! Local ONNX Runtime backend.
//!
//! Runs all-MiniLM-L6-v2 via `ort`: tokenization, inference, attention-masked
//! mean pooling, and L2 normalization.

use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{EmbeddingBackend, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

/// ONNX-based embedding backend.
pub struct LocalBackend {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex, which guarantees
// exclusive access during run().
unsafe impl Send for LocalBackend {}
unsafe impl Sync for LocalBackend {}

impl LocalBackend {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_dir = crate::config::expand_tilde(&config.cache_dir);
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `tramvia model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer not found at {}. Run `tramvia model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;

        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        tracing::info!(tokenizer = %tokenizer_path.display(), "tokenizer loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }
}

impl EmbeddingBackend for LocalBackend {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch = encodings.len();
        // The tokenizer pads the whole batch to its longest sequence.
        let seq_len = encodings[0].get_ids().len();
        let shape = vec![batch as i64, seq_len as i64];

        let input_ids: Vec<i64> = encodings
            .iter()
            .flat_map(|e| e.get_ids().iter().map(|&id| id as i64))
            .collect();
        let attention_mask: Vec<i64> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().iter().map(|&m| m as i64))
            .collect();
        // Single-segment input: token_type_ids stay zero.
        let token_type_ids = vec![0i64; batch * seq_len];

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape.clone(), attention_mask.into_boxed_slice()))?,
            "token_type_ids" => Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?,
        })?;

        // Per-token hidden states. The output name varies by ONNX export;
        // try the common ones, fall back to index 0.
        let hidden = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (out_shape, data) = hidden
            .try_extract_tensor::<f32>()
            .context("failed to extract hidden-state tensor")?;

        let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();
        anyhow::ensure!(
            dims == [batch, seq_len, EMBEDDING_DIM],
            "unexpected hidden-state shape {dims:?}, expected [{batch}, {seq_len}, {EMBEDDING_DIM}]"
        );

        // One row per input: pool each sequence's unmasked tokens, normalize.
        let vectors = data
            .chunks_exact(seq_len * EMBEDDING_DIM)
            .zip(&encodings)
            .map(|(rows, encoding)| l2_normalize(&masked_mean(rows, encoding.get_attention_mask())))
            .collect();

        Ok(vectors)
    }
}

/// Average the token rows whose attention mask bit is set. The tokenizer
/// never emits an all-zero mask; if it did, the zero vector comes back as-is.
fn masked_mean(token_rows: &[f32], mask: &[u32]) -> Vec<f32> {
    let mut pooled = vec![0.0f32; EMBEDDING_DIM];
    let mut kept = 0usize;

    for (row, &bit) in token_rows.chunks_exact(EMBEDDING_DIM).zip(mask) {
        if bit == 0 {
            continue;
        }
        for (acc, value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
        kept += 1;
    }

    if kept > 0 {
        let inv = 1.0 / kept as f32;
        for acc in &mut pooled {
            *acc *= inv;
        }
    }
    pooled
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
