//! The fixed result returned whenever the model cannot be reached or its
//! answer cannot be used.

use super::result::{GuidanceResult, OutcomeClass};

/// Environment variable holding the model API key, named in the fallback text.
pub const API_KEY_ENV_VAR: &str = "ISTIKHARA__AI__GEMINI_API_KEY";

const FALLBACK_SURAH: &str = "الفاتحة";
const FALLBACK_ARABIC: &str = "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ";
const FALLBACK_TRANSLATION: &str = "به نام خداوند بخشنده مهربان";
const FALLBACK_SUMMARY: &str = "خطا در ارتباط";

/// Builds the fallback result.
///
/// Deterministic: every call returns an equal value.
pub fn fallback_result() -> GuidanceResult {
    GuidanceResult {
        surah_name: FALLBACK_SURAH.to_string(),
        verse_number: 0,
        arabic_text: FALLBACK_ARABIC.to_string(),
        translated_text: FALLBACK_TRANSLATION.to_string(),
        outcome_class: OutcomeClass::Error,
        brief_summary: FALLBACK_SUMMARY.to_string(),
        interpretation: format!(
            "متاسفانه ارتباط با هوش مصنوعی برقرار نشد. لطفا بررسی کنید که کلید API ({}) به درستی در تنظیمات سرور وارد شده باشد و سپس دوباره تلاش کنید.",
            API_KEY_ENV_VAR
        ),
    }
}
