//! Error taxonomy for the resolution pipeline.
//!
//! The detector and condenser never fail — they degrade to defaults. Everything
//! that touches the embedding model or the remote endpoint surfaces a typed
//! [`PipelineError`] so callers decide what to swallow and what to show.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The ONNX model or tokenizer could not be loaded. Fatal for semantic
    /// matching in this session; language detection and direct remote calls
    /// still work.
    #[error("embedding model load failed: {0}")]
    ModelLoad(String),

    /// Inference failed after a successful load.
    #[error("embedding inference failed: {0}")]
    Embedding(String),

    /// The injected knowledge-base row supplier failed.
    #[error("knowledge base fetch failed: {0}")]
    KbFetch(String),

    /// The remote assistant endpoint answered with a non-2xx status. The raw
    /// body is kept verbatim — no JSON parse is attempted on error responses.
    #[error("remote endpoint returned HTTP {status}: {raw}")]
    Network { status: u16, raw: String },

    /// The endpoint answered 2xx but the body was not valid JSON for the
    /// expected shape.
    #[error("malformed response from remote endpoint: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// Transport-level failure (connect, timeout) before any status was read.
    #[error("request to remote endpoint failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A public entry point was called without required input.
    #[error("invalid input: {0}")]
    Validation(String),
}
