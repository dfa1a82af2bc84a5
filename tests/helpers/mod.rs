#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tramvia::embedding::{EmbeddingBackend, SharedEmbedder, EMBEDDING_DIM};
use tramvia::pipeline::{IntentRecord, KbAnswer, KbRecord};

/// Deterministic bag-of-words embedding: each token hashes to one dimension.
/// Identical texts embed identically (cosine 1.0); texts with disjoint
/// vocabulary land on (almost surely) disjoint dimensions (cosine ~0).
pub fn bag_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    for token in text.to_lowercase().split_whitespace() {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        v[(hasher.finish() % EMBEDDING_DIM as u64) as usize] += 1.0;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Test backend built on [`bag_vector`]. No model files needed.
pub struct BagOfWordsBackend;

impl EmbeddingBackend for BagOfWordsBackend {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| bag_vector(t)).collect())
    }
}

/// A pre-loaded embedder over the bag-of-words backend.
pub fn test_embedder() -> SharedEmbedder {
    SharedEmbedder::preloaded(Arc::new(BagOfWordsBackend))
}

/// An embedder whose loader increments `loads` on every invocation.
pub fn counting_embedder(loads: Arc<AtomicUsize>) -> SharedEmbedder {
    SharedEmbedder::with_loader(move || {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(BagOfWordsBackend) as Arc<dyn EmbeddingBackend>)
    })
}

/// Build an intent with the given example patterns and no responses.
pub fn intent(id: &str, patterns: &[&str]) -> IntentRecord {
    IntentRecord {
        id: id.into(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        responses: BTreeMap::new(),
        priority: 0,
        meta: serde_json::Map::new(),
    }
}

/// Build a KB row with a plain-text answer.
pub fn kb_row(id: &str, question: &str, answer: &str) -> KbRecord {
    KbRecord {
        id: id.into(),
        question: question.into(),
        answer: KbAnswer::Text(answer.into()),
    }
}

/// Build a KB row with per-language answers.
pub fn kb_row_per_lang(id: &str, question: &str, answers: &[(&str, &str)]) -> KbRecord {
    KbRecord {
        id: id.into(),
        question: question.into(),
        answer: KbAnswer::PerLang(
            answers
                .iter()
                .map(|(lang, text)| (lang.to_string(), text.to_string()))
                .collect(),
        ),
    }
}
