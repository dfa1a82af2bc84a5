//! The intent resolution pipeline: corpus types, vector indexing, semantic
//! matching, and threshold-gated fallback sequencing.

pub mod index;
pub mod matcher;
pub mod resolve;
pub mod types;

pub use resolve::{KbSource, ResolveRequest, Resolver};
pub use types::{IntentRecord, KbAnswer, KbRecord, MatchResult, ResolutionOutcome};
