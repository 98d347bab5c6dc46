//! The user's stated intention.

/// Phrase used when the user leaves the intention blank.
pub const GENERAL_GUIDANCE_PLACEHOLDER: &str = "General Guidance (Niyyat)";

/// Free text describing what the user intends to do.
///
/// May be empty. No length limit is enforced here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIntention(String);

impl UserIntention {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The raw text as supplied by the caller.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the intention has no visible content.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Text to embed in the prompt. Blank intentions become the general
    /// guidance placeholder, so the result is never empty.
    pub fn normalized(&self) -> &str {
        let trimmed = self.0.trim();
        if trimmed.is_empty() {
            GENERAL_GUIDANCE_PLACEHOLDER
        } else {
            trimmed
        }
    }
}

impl From<String> for UserIntention {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for UserIntention {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}
