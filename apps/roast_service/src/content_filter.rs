use serde::Serialize;

const PROTECTED_TERMS: &[&str] = &[
    "race",
    "religion",
    "ethnicity",
    "gay",
    "lesbian",
    "trans",
    "black",
    "white",
    "jew",
    "muslim",
    "christian",
    "disabled",
    "disability",
    "immigrant",
    "refugee",
];

const VIOLENT_TERMS: &[&str] = &["kill", "murder", "rape", "harm", "bomb", "explode", "die"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockReason {
    Protected,
    Violent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockReason>,
}

impl FilterResult {
    fn allowed() -> Self {
        Self {
            blocked: false,
            reason: None,
        }
    }

    fn blocked(reason: BlockReason) -> Self {
        Self {
            blocked: true,
            reason: Some(reason),
        }
    }
}

/// Case-insensitive substring match against the denylists, protected terms
/// first. No word boundaries: "skill" is blocked because it contains "kill".
pub fn check(text: &str) -> FilterResult {
    let text = text.to_lowercase();

    if PROTECTED_TERMS.iter().any(|term| text.contains(term)) {
        return FilterResult::blocked(BlockReason::Protected);
    }
    if VIOLENT_TERMS.iter().any(|term| text.contains(term)) {
        return FilterResult::blocked(BlockReason::Violent);
    }

    FilterResult::allowed()
}
