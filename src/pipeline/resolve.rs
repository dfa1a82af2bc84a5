//! Threshold-gated fallback sequencing across the two corpora.
//!
//! One [`Resolver::resolve`] call walks a linear state machine: search the
//! intent corpus; if the top score clears the intent threshold, done. Below
//! threshold, search the knowledge base (when a row source was supplied); if
//! that clears the KB threshold, return its answer. Otherwise the caller is
//! told to delegate to the generative fallback.
//!
//! Intent search always completes before KB search begins — a sequencing
//! contract, not an optimization.

use async_trait::async_trait;

use super::index::{
    build_index, corpus_fingerprint, intent_items, kb_items, IndexCache, INDEX_CACHE_VERSION,
};
use super::matcher::search;
use super::types::{IntentRecord, ItemMeta, KbRecord, MatchResult, ResolutionOutcome};
use crate::condense::condense;
use crate::config::{CondenserConfig, MatchingConfig};
use crate::embedding::SharedEmbedder;
use crate::error::{PipelineError, Result};
use crate::lang::Lang;

/// Asynchronous supplier of knowledge-base rows. Invoked at most once per
/// cache key — the built index is memoized for the rest of the session.
#[async_trait]
pub trait KbSource: Send + Sync {
    async fn fetch_rows(&self) -> anyhow::Result<Vec<KbRecord>>;
}

/// One resolution call's inputs.
pub struct ResolveRequest<'a> {
    pub utterance: &'a str,
    pub intents: &'a [IntentRecord],
    pub lang: Lang,
    /// KB row supplier. `None` disables the KB stage entirely.
    pub kb: Option<&'a dyn KbSource>,
}

/// Sequences semantic matching over intents then KB.
pub struct Resolver {
    embedder: SharedEmbedder,
    cache: IndexCache,
    matching: MatchingConfig,
    condenser: CondenserConfig,
}

impl Resolver {
    pub fn new(
        embedder: SharedEmbedder,
        matching: MatchingConfig,
        condenser: CondenserConfig,
    ) -> Self {
        Self {
            embedder,
            cache: IndexCache::new(),
            matching,
            condenser,
        }
    }

    /// Resolve one utterance to an intent, a KB answer, or nothing.
    pub async fn resolve(&self, req: ResolveRequest<'_>) -> Result<ResolutionOutcome> {
        let utterance = req.utterance.trim();
        if utterance.is_empty() {
            return Err(PipelineError::Validation("utterance text is required".into()));
        }

        // Bound long utterances before embedding; a no-op within budget.
        let query = condense(utterance, self.condenser.max_chars);

        if let Some(outcome) = self.search_intents(&query, req.intents).await? {
            return Ok(outcome);
        }

        let Some(kb) = req.kb else {
            return Ok(ResolutionOutcome::NoMatch);
        };
        self.search_kb(&query, req.lang, kb).await
    }

    async fn search_intents(
        &self,
        query: &str,
        intents: &[IntentRecord],
    ) -> Result<Option<ResolutionOutcome>> {
        // Fingerprint covers ids and patterns: an edited corpus gets a fresh
        // index instead of a stale cache hit.
        let key = format!(
            "intents:{INDEX_CACHE_VERSION}:{:016x}",
            corpus_fingerprint(intents.iter().flat_map(|r| {
                std::iter::once(r.id.as_str()).chain(r.patterns.iter().map(String::as_str))
            }))
        );
        let index = self
            .cache
            .get_or_build(&key, || build_index(&self.embedder, intent_items(intents)))
            .await?;

        // Empty corpus: automatic non-match, no embed call.
        if index.is_empty() {
            return Ok(None);
        }

        let matches = search(&self.embedder, query, &index, self.matching.top_k).await?;
        log_runners_up("intents", &matches);

        let Some(top) = matches.first() else {
            return Ok(None);
        };
        if top.score < self.matching.intent_threshold {
            tracing::debug!(score = top.score, id = %top.item.id, "intent below threshold");
            return Ok(None);
        }

        // Resolve the winning item back to its source record. A missing
        // record means corpus/index desync — resolve terminally as no match
        // rather than consulting the KB over a stale view.
        match intents.iter().find(|r| r.id == top.item.id) {
            Some(record) => Ok(Some(ResolutionOutcome::Intent(record.clone()))),
            None => {
                tracing::warn!(id = %top.item.id, "matched intent absent from corpus");
                Ok(Some(ResolutionOutcome::NoMatch))
            }
        }
    }

    async fn search_kb(
        &self,
        query: &str,
        lang: Lang,
        kb: &dyn KbSource,
    ) -> Result<ResolutionOutcome> {
        let key = format!("kb:{INDEX_CACHE_VERSION}");
        let index = self
            .cache
            .get_or_build(&key, || async {
                let rows = kb
                    .fetch_rows()
                    .await
                    .map_err(|e| PipelineError::KbFetch(e.to_string()))?;
                build_index(&self.embedder, kb_items(&rows)).await
            })
            .await?;

        if index.is_empty() {
            return Ok(ResolutionOutcome::NoMatch);
        }

        let matches = search(&self.embedder, query, &index, self.matching.top_k).await?;
        log_runners_up("kb", &matches);

        let Some(top) = matches.first() else {
            return Ok(ResolutionOutcome::NoMatch);
        };
        if top.score < self.matching.kb_threshold {
            tracing::debug!(score = top.score, id = %top.item.id, "KB below threshold");
            return Ok(ResolutionOutcome::NoMatch);
        }

        let ItemMeta::Kb { answer } = &top.item.meta else {
            tracing::warn!(id = %top.item.id, "non-KB item in KB index");
            return Ok(ResolutionOutcome::NoMatch);
        };
        match answer.resolve(lang) {
            Some(text) => Ok(ResolutionOutcome::Kb(text.to_string())),
            None => Ok(ResolutionOutcome::NoMatch),
        }
    }
}

/// Ranks past the first exist for observability only; decision logic never
/// looks at them.
fn log_runners_up(corpus: &str, matches: &[MatchResult]) {
    for (rank, result) in matches.iter().enumerate().skip(1) {
        tracing::debug!(corpus, rank, id = %result.item.id, score = result.score, "runner-up");
    }
}
