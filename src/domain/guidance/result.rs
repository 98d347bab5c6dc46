//! Guidance result - the response contract shared by the requester and its callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment of a guidance result for the user's intention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeClass {
    /// The verse favors going ahead.
    Favorable,
    /// The verse advises against it.
    Unfavorable,
    /// Neither clearly good nor bad; proceed with care.
    Mixed,
    /// Sentinel for the fallback result. Never produced by the model.
    Error,
}

impl OutcomeClass {
    /// Outcomes the model is allowed to choose from.
    pub const MODEL_OUTCOMES: [OutcomeClass; 3] = [
        OutcomeClass::Favorable,
        OutcomeClass::Unfavorable,
        OutcomeClass::Mixed,
    ];

    /// Wire name, as used in JSON and in the response schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeClass::Favorable => "FAVORABLE",
            OutcomeClass::Unfavorable => "UNFAVORABLE",
            OutcomeClass::Mixed => "MIXED",
            OutcomeClass::Error => "ERROR",
        }
    }

    /// Returns true for outcomes a model may legitimately return.
    pub fn is_model_outcome(&self) -> bool {
        !matches!(self, OutcomeClass::Error)
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete guidance answer: one verse, its translation and what it means
/// for the stated intention.
///
/// Either every field comes from the model or every field comes from the
/// fallback. There is no partially populated result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceResult {
    /// Chapter name in Persian/Arabic.
    pub surah_name: String,
    /// Verse within the chapter. `0` means "not applicable" (fallback only).
    pub verse_number: u32,
    /// Original Arabic text of the verse.
    pub arabic_text: String,
    /// Fluent Persian translation of the verse.
    pub translated_text: String,
    /// Sentiment classification for the intention.
    pub outcome_class: OutcomeClass,
    /// Short phrase such as "بسیار خوب است".
    pub brief_summary: String,
    /// Longer advice tailored to the intention.
    pub interpretation: String,
}

impl GuidanceResult {
    /// Returns true if this result is the error fallback rather than a model answer.
    pub fn is_fallback(&self) -> bool {
        self.outcome_class == OutcomeClass::Error
    }
}
