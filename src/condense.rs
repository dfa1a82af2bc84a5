//! Utterance condensation for long inputs.
//!
//! Embedding models and the remote endpoint both work best on bounded input,
//! so utterances over the character budget are condensed to their most
//! salient sentences rather than blindly truncated. Selection order follows
//! sentence score, not reading order — an accepted lossy trade-off.
//!
//! [`condense`] never fails; pathological input degrades to a hard
//! truncation.

/// Default character budget for condensed output.
pub const DEFAULT_MAX_CHARS: usize = 320;

/// Margin reserved at the end of the budget for downstream concatenation.
const TAIL_RESERVE: usize = 40;

/// Sentences longer than this get a length bonus.
const LONG_SENTENCE_LEN: usize = 60;

/// Condense `text` to at most `max_chars` characters.
///
/// Input within budget is returned trimmed and whitespace-collapsed but
/// otherwise unchanged, which makes the operation idempotent. Longer input is
/// split into sentences, scored, and greedily reassembled in descending score
/// order until the budget (minus the tail reserve) is filled.
pub fn condense(text: &str, max_chars: usize) -> String {
    let cleaned = collapse_whitespace(text);
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }

    let sentences = split_sentences(&cleaned);
    let scores: Vec<f32> = sentences.iter().map(|s| sentence_score(s)).collect();

    // Stable sort: equal scores keep original reading order.
    let mut order: Vec<usize> = (0..sentences.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let stop_at = max_chars.saturating_sub(TAIL_RESERVE);
    let mut picked: Vec<&str> = Vec::new();
    let mut used = 0usize;

    for i in order {
        let sentence = sentences[i].as_str();
        let len = sentence.chars().count();
        let sep = usize::from(!picked.is_empty());
        if used + sep + len > max_chars {
            continue;
        }
        used += sep + len;
        picked.push(sentence);
        if used >= stop_at {
            break;
        }
    }

    if picked.is_empty() {
        // Single sentence longer than the whole budget.
        return truncate_chars(&cleaned, max_chars);
    }

    picked.join(" ")
}

/// Trim and collapse runs of internal whitespace to single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split on sentence terminators, keeping the terminator with its sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Salience score: proper nouns weigh double, numbers one and a half, verbs
/// one, plus a small bonus for substantial sentences.
fn sentence_score(sentence: &str) -> f32 {
    let mut proper = 0u32;
    let mut verbs = 0u32;
    let mut numeric = 0u32;

    for (pos, token) in sentence.split_whitespace().enumerate() {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric());
        if token.is_empty() {
            continue;
        }
        if token.chars().any(|c| c.is_ascii_digit()) {
            numeric += 1;
        } else if pos > 0 && token.chars().next().is_some_and(char::is_uppercase) {
            // Capitalized mid-sentence — treat as a proper noun.
            proper += 1;
        } else if looks_like_verb(token) {
            verbs += 1;
        }
    }

    let length_bonus = if sentence.chars().count() > LONG_SENTENCE_LEN {
        1.0
    } else {
        0.0
    };

    2.0 * proper as f32 + verbs as f32 + 1.5 * numeric as f32 + length_bonus
}

/// Crude morphological check for es/ca/ro verb forms. Good enough for
/// relative sentence ranking; precision is not the point.
fn looks_like_verb(token: &str) -> bool {
    const SUFFIXES: &[&str] = &[
        "ar", "er", "ir", "re", "ando", "iendo", "ado", "ido", "ant", "int", "ează", "ește",
    ];
    let lower = token.to_lowercase();
    lower.chars().count() >= 4 && SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Truncate to `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
