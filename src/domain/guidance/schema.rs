//! Response schema constraining the model's output to a `GuidanceResult`.
//!
//! Uses the OpenAPI-subset dialect accepted by Gemini structured output
//! (`OBJECT`, `STRING`, `INTEGER`, `enum`, `required`).

use serde_json::{json, Value};

use super::result::OutcomeClass;

/// JSON field names of a guidance result, in display order.
pub const GUIDANCE_FIELDS: [&str; 7] = [
    "surahName",
    "verseNumber",
    "arabicText",
    "translatedText",
    "outcomeClass",
    "briefSummary",
    "interpretation",
];

/// Builds the response schema. All seven fields are required and the outcome
/// enum is limited to the values a model may produce.
pub fn guidance_response_schema() -> Value {
    let outcomes: Vec<&str> = OutcomeClass::MODEL_OUTCOMES
        .iter()
        .map(OutcomeClass::as_str)
        .collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "surahName": {
                "type": "STRING",
                "description": "Name of the Surah in Persian/Arabic"
            },
            "verseNumber": {
                "type": "INTEGER",
                "description": "The specific verse number selected"
            },
            "arabicText": {
                "type": "STRING",
                "description": "The full Arabic text of the verse"
            },
            "translatedText": {
                "type": "STRING",
                "description": "Fluent Persian translation of the verse"
            },
            "outcomeClass": {
                "type": "STRING",
                "enum": outcomes,
                "description": "The categorization of the Istikhara result"
            },
            "briefSummary": {
                "type": "STRING",
                "description": "Short result phrase like 'بسیار خوب است' or 'انجام ندهید'"
            },
            "interpretation": {
                "type": "STRING",
                "description": "Detailed interpretation and advice based on the verse and the user's specific intention"
            }
        },
        "required": GUIDANCE_FIELDS,
        "propertyOrdering": GUIDANCE_FIELDS,
    })
}
