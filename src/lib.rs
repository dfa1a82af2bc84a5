//! Intent resolution pipeline for a multilingual transit assistant.
//!
//! Routes a free-form user utterance to the best response strategy: a
//! pre-authored structured **intent**, a pre-authored **knowledge-base**
//! answer, or delegation to a remote **generative** service when neither
//! matches confidently.
//!
//! The pipeline for one utterance:
//!
//! 1. [`lang::detect`] classifies the text into `es`/`ro`/`ca`.
//! 2. [`condense::condense`] bounds long utterances to a character budget.
//! 3. [`pipeline::Resolver`] embeds the query and ranks it against the intent
//!    corpus, then the knowledge base, each gated by its own score threshold.
//! 4. On no match, the caller delegates to [`remote::RemoteAssistantClient`],
//!    grounding the generative answer in [`context::ContextBridge`]'s last
//!    captured database context.
//!
//! # Architecture
//!
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 (384
//!   dimensions), loaded lazily at most once per process
//! - **Matching**: cosine similarity over in-memory per-corpus indices,
//!   cached for the session
//! - **Remote**: single-endpoint JSON POST contract, `mode`-tagged
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`lang`] — Closed-set language detection with a Spanish default
//! - [`condense`] — Salience-ranked condensation of long utterances
//! - [`embedding`] — Text-to-vector pipeline via ONNX Runtime
//! - [`pipeline`] — Corpus types, vector indices, matching, and fallback sequencing
//! - [`context`] — Single-slot conversational context bridge
//! - [`remote`] — Client for the generative-answer endpoint
//! - [`error`] — The [`error::PipelineError`] taxonomy

pub mod condense;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod lang;
pub mod pipeline;
pub mod remote;
