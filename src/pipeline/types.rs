//! Canonical record types for the two matchable corpora.
//!
//! Defines [`IntentRecord`] (pre-authored actions keyed by example
//! utterances), [`KbRecord`] (question/answer pairs from the knowledge base),
//! the flattened [`IndexItem`] unit that actually gets embedded, and the
//! [`ResolutionOutcome`] returned by the resolver.
//!
//! External intent data arrives in several field spellings; [`RawIntent`] is
//! the single ingestion adapter that normalizes them. Matching logic only ever
//! sees the canonical types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lang::Lang;

/// A pre-authored intent: example utterances plus a per-language response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRecord {
    pub id: String,
    /// Example utterances used to build embeddings. Order is irrelevant for
    /// matching but kept stable for deterministic indexing.
    pub patterns: Vec<String>,
    /// Response text keyed by language code (`es`, `ro`, `ca`).
    #[serde(default)]
    pub responses: BTreeMap<String, String>,
    #[serde(default)]
    pub priority: i32,
    /// Opaque authoring metadata (e.g. `slots`, `tags`). Carried through to
    /// the remote serialization, never probed by matching.
    #[serde(default)]
    pub meta: serde_json::Map<String, Value>,
}

/// Intent shape as found in authored data files, tolerant of the alternate
/// field names that accumulated in the source data. Convert with
/// [`RawIntent::into_record`] at the ingestion boundary.
#[derive(Debug, Deserialize)]
pub struct RawIntent {
    #[serde(alias = "type", alias = "name")]
    pub id: String,
    #[serde(default, alias = "examples", alias = "utterances", alias = "phrases")]
    pub patterns: Vec<String>,
    #[serde(default, alias = "response", alias = "answer")]
    pub responses: Option<RawResponses>,
    #[serde(default)]
    pub priority: i32,
    #[serde(flatten)]
    pub meta: serde_json::Map<String, Value>,
}

/// A response is either one string (assumed default language) or a
/// per-language mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawResponses {
    Text(String),
    PerLang(BTreeMap<String, String>),
}

impl RawIntent {
    /// Normalize into the canonical [`IntentRecord`]. Duplicate patterns are
    /// dropped, keeping first occurrence; a bare string response is filed
    /// under the default language.
    pub fn into_record(self) -> IntentRecord {
        let mut seen = std::collections::HashSet::new();
        let patterns = self
            .patterns
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect();

        let responses = match self.responses {
            Some(RawResponses::Text(text)) => {
                let mut map = BTreeMap::new();
                map.insert(Lang::default().as_str().to_string(), text);
                map
            }
            Some(RawResponses::PerLang(map)) => map,
            None => BTreeMap::new(),
        };

        IntentRecord {
            id: self.id,
            patterns,
            responses,
            priority: self.priority,
            meta: self.meta,
        }
    }
}

/// Parse a JSON array of authored intents into canonical records.
pub fn parse_intents(json: &str) -> serde_json::Result<Vec<IntentRecord>> {
    let raw: Vec<RawIntent> = serde_json::from_str(json)?;
    Ok(raw.into_iter().map(RawIntent::into_record).collect())
}

/// A knowledge-base row: one question, one answer. Owned by an external data
/// source; the pipeline treats it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbRecord {
    pub id: String,
    #[serde(alias = "q")]
    pub question: String,
    #[serde(alias = "a")]
    pub answer: KbAnswer,
}

/// KB answers are either plain text or a per-language mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KbAnswer {
    Text(String),
    PerLang(BTreeMap<String, String>),
}

impl KbAnswer {
    /// Resolve the answer for `lang`, falling back to the default language,
    /// then to the first entry. `None` only for an empty mapping.
    pub fn resolve(&self, lang: Lang) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::PerLang(map) => map
                .get(lang.as_str())
                .or_else(|| map.get(Lang::default().as_str()))
                .or_else(|| map.values().next())
                .map(String::as_str),
        }
    }
}

/// Which corpus an index item came from, plus what it resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ItemMeta {
    Intent,
    Kb { answer: KbAnswer },
}

impl ItemMeta {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Intent => "intent",
            Self::Kb { .. } => "kb",
        }
    }
}

/// One embeddable unit: an intent pattern or a KB question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexItem {
    /// Identity of the originating record (intent id or KB row id).
    pub id: String,
    /// The text that was embedded.
    pub text: String,
    pub meta: ItemMeta,
}

/// A scored index item. Ranked lists are sorted by descending score; exact
/// ties keep corpus insertion order.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub item: IndexItem,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// The single result of one resolution call.
#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    /// An intent cleared its threshold; carries the full source record.
    Intent(IntentRecord),
    /// A KB row cleared its threshold; carries the resolved answer text.
    Kb(String),
    /// Nothing matched confidently — delegate to the generative fallback.
    NoMatch,
}
