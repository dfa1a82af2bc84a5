//! Language detection over the closed set of supported languages.
//!
//! The assistant serves Spanish, Romanian, and Catalan. [`detect`] classifies
//! raw text with whatlang's trigram model and maps its ISO 639-3 codes
//! through a fixed table; anything unmapped or undetermined degrades to the
//! Spanish default. Detection never fails.

use serde::{Deserialize, Serialize};

/// Supported interface languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Spanish — the default for empty or undetermined input.
    #[default]
    Es,
    Ro,
    Ca,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::Ro => "ro",
            Self::Ca => "ca",
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "es" => Ok(Self::Es),
            "ro" => Ok(Self::Ro),
            "ca" => Ok(Self::Ca),
            _ => Err(format!("unsupported language: {s}")),
        }
    }
}

/// Inputs shorter than this carry too little trigram signal to classify.
const MIN_DETECT_LEN: usize = 8;

/// Detect the language of `text`.
///
/// Empty, whitespace-only, or very short input returns [`Lang::Es`] without
/// running the classifier.
pub fn detect(text: &str) -> Lang {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_DETECT_LEN {
        return Lang::default();
    }

    match whatlang::detect(trimmed) {
        Some(info) => map_code(info.lang().code()),
        None => Lang::default(),
    }
}

/// Map a raw ISO 639-3 code onto the supported set. Unmapped codes fall back
/// to Spanish.
fn map_code(code: &str) -> Lang {
    match code {
        "spa" => Lang::Es,
        "cat" => Lang::Ca,
        "ron" | "rum" => Lang::Ro,
        _ => Lang::default(),
    }
}
