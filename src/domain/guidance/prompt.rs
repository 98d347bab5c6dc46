//! Instruction sent to the model for a guidance request.

use super::intention::UserIntention;

/// Sampling temperature for guidance requests.
///
/// Kept high so that repeated requests with the same intention land on
/// different verses. Lower values make the "random" verse repetitive.
pub const GUIDANCE_TEMPERATURE: f32 = 1.2;

/// Builds the natural-language instruction for one guidance request.
///
/// The intention is quoted verbatim after normalization; a blank intention is
/// replaced by the general guidance placeholder.
pub fn build_guidance_prompt(intention: &UserIntention) -> String {
    format!(
        r#"You are a wise and spiritual Islamic scholar providing an 'Istikhara' (guidance seeking) service.

The user has a specific intention: "{intention}".

Please perform the following steps:
1. Select a random verse from the Holy Quran. (Simulate opening the book at random).
2. Analyze whether this verse implies a FAVORABLE, UNFAVORABLE or MIXED outcome for doing what the user intends.
3. Provide the Arabic text of the verse and a fluent Persian translation.
4. Provide a short summary phrase of the outcome and a spiritual interpretation tailored to the user's intention.

Strictly follow the JSON schema provided.
The tone should be respectful, spiritual, and comforting.
Write the translation, the summary and the interpretation in Persian (Farsi)."#,
        intention = intention.normalized()
    )
}
