//! Client for the remote generative-answer endpoint.
//!
//! Both operations are a single JSON POST tagged by `mode`. `normalize` ships
//! a bounded, privacy-trimmed view of the intent corpus so the service can
//! suggest an intent; `answer` produces a grounded generative reply, feeding
//! it the last captured database context (or a stub when there is none).
//!
//! Error responses are never JSON-parsed: a non-2xx status surfaces as
//! [`PipelineError::Network`] with the raw body intact.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::RemoteConfig;
use crate::context::ContextBridge;
use crate::error::{PipelineError, Result};
use crate::lang::Lang;
use crate::pipeline::types::IntentRecord;

/// Cap on the number of intents serialized into a `normalize` request.
pub const MAX_SERIALIZED_INTENTS: usize = 80;

/// Cap on example utterances serialized per intent.
pub const MAX_EXAMPLES_PER_INTENT: usize = 6;

/// Client for the assistant endpoint.
pub struct RemoteAssistantClient {
    http: reqwest::Client,
    endpoint: String,
}

/// Response to a `normalize` call.
#[derive(Debug, Deserialize)]
pub struct NormalizeResponse {
    pub normalized_text: Option<String>,
    pub suggested_intent: Option<String>,
    #[serde(default)]
    pub slots: Option<Value>,
    pub detected_lang: Option<String>,
}

/// Response to an `answer` call. The service emits the reply under either
/// `answer` or `text` depending on model route — use [`Self::answer_text`].
#[derive(Debug, Deserialize)]
pub struct AnswerResponse {
    pub answer: Option<String>,
    pub text: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<Value>,
}

impl AnswerResponse {
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_deref().or(self.text.as_deref())
    }
}

/// Inputs to [`RemoteAssistantClient::answer`].
pub struct AnswerRequest<'a> {
    pub text: &'a str,
    pub lang: Lang,
    /// Explicit context; takes precedence over the bridge.
    pub context: Option<Value>,
    /// Forwarded as-is — range clamping is the server's contract.
    pub max_tokens: Option<u32>,
}

impl RemoteAssistantClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Ask the service to normalize an utterance and suggest an intent.
    ///
    /// Attaches at most [`MAX_SERIALIZED_INTENTS`] intents with at most
    /// [`MAX_EXAMPLES_PER_INTENT`] examples each, stripped down to
    /// `{type, examples, slots, tags}`.
    pub async fn normalize(
        &self,
        text: &str,
        lang: Lang,
        intents: &[IntentRecord],
    ) -> Result<NormalizeResponse> {
        require_text(text)?;
        let body = json!({
            "mode": "normalize",
            "text": text,
            "lang": lang.as_str(),
            "intents": serialize_intents(intents),
        });
        self.post(&body).await
    }

    /// Request a grounded generative answer.
    ///
    /// Context precedence: explicit request context, then the bridge's last
    /// captured context, then a stub marking that no database context exists —
    /// the outgoing request is always well-formed.
    pub async fn answer(
        &self,
        req: AnswerRequest<'_>,
        bridge: &ContextBridge,
    ) -> Result<AnswerResponse> {
        require_text(req.text)?;
        let context = req
            .context
            .or_else(|| bridge.last())
            .unwrap_or_else(context_stub);

        let mut body = json!({
            "mode": "answer",
            "text": req.text,
            "lang": req.lang.as_str(),
            "context": context,
        });
        if let Some(max_tokens) = req.max_tokens {
            body["maxTokens"] = json!(max_tokens);
        }
        self.post(&body).await
    }

    async fn post<T: serde::de::DeserializeOwned>(&self, body: &Value) -> Result<T> {
        let response = self.http.post(&self.endpoint).json(body).send().await?;
        let status = response.status();
        // Read as text first: error bodies are surfaced verbatim, not parsed.
        let raw = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "remote endpoint error");
            return Err(PipelineError::Network {
                status: status.as_u16(),
                raw,
            });
        }

        serde_json::from_str(&raw).map_err(|source| PipelineError::Parse { raw, source })
    }
}

fn require_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(PipelineError::Validation("text is required".into()));
    }
    Ok(())
}

/// Bounded, privacy-trimmed intent serialization: id and examples only, plus
/// whatever `slots`/`tags` the author put in meta. Internal metadata never
/// leaves the process.
fn serialize_intents(intents: &[IntentRecord]) -> Vec<Value> {
    intents
        .iter()
        .take(MAX_SERIALIZED_INTENTS)
        .map(|record| {
            let examples: Vec<&str> = record
                .patterns
                .iter()
                .take(MAX_EXAMPLES_PER_INTENT)
                .map(String::as_str)
                .collect();
            let mut entry = serde_json::Map::new();
            entry.insert("type".into(), json!(record.id));
            entry.insert("examples".into(), json!(examples));
            if let Some(slots) = record.meta.get("slots") {
                entry.insert("slots".into(), slots.clone());
            }
            if let Some(tags) = record.meta.get("tags") {
                entry.insert("tags".into(), tags.clone());
            }
            Value::Object(entry)
        })
        .collect()
}

/// Default context when nothing was captured this session.
fn context_stub() -> Value {
    json!({
        "found": false,
        "intent": null,
        "data": null,
        "meta": {"note": "no_db_context_available"},
    })
}
