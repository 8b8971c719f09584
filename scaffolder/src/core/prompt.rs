//! Heuristics deciding whether a child is waiting for a line of input.

use regex::Regex;

/// Decides from an output chunk alone whether the child is prompting.
///
/// `TrailingQuestionMark` misfires on any chunk that happens to end in `?`
/// without the child actually reading stdin; the user then has to type a line
/// that the child may never consume.
#[derive(Debug, Clone, Default)]
pub enum PromptDetector {
    /// The trimmed chunk ends with `?`.
    #[default]
    TrailingQuestionMark,
    /// Any pattern matches the trimmed chunk.
    Patterns(Vec<Regex>),
}

impl PromptDetector {
    pub fn is_prompt(&self, chunk: &str) -> bool {
        let trimmed = chunk.trim();
        if trimmed.is_empty() {
            return false;
        }
        match self {
            Self::TrailingQuestionMark => trimmed.ends_with('?'),
            Self::Patterns(patterns) => patterns.iter().any(|re| re.is_match(trimmed)),
        }
    }
}
