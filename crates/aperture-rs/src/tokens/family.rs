//! Model family detection.
//!
//! A family is a class of models sharing a token-counting strategy. Detection
//! is a case-insensitive prefix match on the model id, tried both against the
//! full id and against the segment after the last `/`, so provider-qualified
//! ids (`anthropic/claude-sonnet-4`) classify the same as bare ones
//! (`claude-sonnet-4`).

/// Fixed characters-per-token ratio for Anthropic-style models.
///
/// Slightly denser than the generic ratio; Claude tokenizers average a bit
/// under 4 characters per token on English prose and code.
pub const ANTHROPIC_CHARS_PER_TOKEN: f64 = 3.5;

/// Generic characters-per-token ratio for unrecognized families, and the
/// fallback when the exact tokenizer backend is unavailable.
pub const GENERIC_CHARS_PER_TOKEN: f64 = 4.0;

/// Model-name prefixes that select the exact-tokenizer strategy.
const OPENAI_PREFIXES: &[&str] = &["gpt", "chatgpt", "o1", "o3", "o4"];

/// Model-name prefixes that select the fixed 3.5 ratio.
const ANTHROPIC_PREFIXES: &[&str] = &["claude"];

/// A class of language models sharing a token-counting strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// OpenAI-style models: exact subword counting when the backend loads,
    /// otherwise the generic ratio.
    OpenAi,
    /// Anthropic-style models: fixed [`ANTHROPIC_CHARS_PER_TOKEN`] ratio.
    Anthropic,
    /// Everything else: [`GENERIC_CHARS_PER_TOKEN`], adjustable on the
    /// estimator.
    Generic,
}

impl ModelFamily {
    /// Classify a model id.
    ///
    /// # Example
    ///
    /// ```ignore
    /// assert_eq!(ModelFamily::detect("anthropic/claude-sonnet-4"), ModelFamily::Anthropic);
    /// assert_eq!(ModelFamily::detect("gpt-4o-mini"), ModelFamily::OpenAi);
    /// assert_eq!(ModelFamily::detect("mistral-large"), ModelFamily::Generic);
    /// ```
    pub fn detect(model_id: &str) -> Self {
        let id = model_id.to_ascii_lowercase();
        let name = id.rsplit('/').next().unwrap_or(id.as_str());

        if id.starts_with("openai/") || OPENAI_PREFIXES.iter().any(|p| name.starts_with(p)) {
            ModelFamily::OpenAi
        } else if id.starts_with("anthropic/")
            || ANTHROPIC_PREFIXES.iter().any(|p| name.starts_with(p))
        {
            ModelFamily::Anthropic
        } else {
            ModelFamily::Generic
        }
    }

    /// The approximation ratio for this family.
    ///
    /// For [`ModelFamily::OpenAi`] this is the fallback used when the exact
    /// backend is unavailable.
    pub fn chars_per_token(self) -> f64 {
        match self {
            ModelFamily::OpenAi => GENERIC_CHARS_PER_TOKEN,
            ModelFamily::Anthropic => ANTHROPIC_CHARS_PER_TOKEN,
            ModelFamily::Generic => GENERIC_CHARS_PER_TOKEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_anthropic_prefixes() {
        assert_eq!(ModelFamily::detect("claude-sonnet-4"), ModelFamily::Anthropic);
        assert_eq!(
            ModelFamily::detect("anthropic/claude-opus-4.1"),
            ModelFamily::Anthropic
        );
        assert_eq!(ModelFamily::detect("Claude-3-Haiku"), ModelFamily::Anthropic);
    }

    #[test]
    fn detects_openai_prefixes() {
        assert_eq!(ModelFamily::detect("gpt-4o-mini"), ModelFamily::OpenAi);
        assert_eq!(ModelFamily::detect("openai/gpt-4.1"), ModelFamily::OpenAi);
        assert_eq!(ModelFamily::detect("o3-mini"), ModelFamily::OpenAi);
        assert_eq!(ModelFamily::detect("ChatGPT-4o-latest"), ModelFamily::OpenAi);
    }

    #[test]
    fn unknown_ids_are_generic() {
        assert_eq!(ModelFamily::detect("mistral-large"), ModelFamily::Generic);
        assert_eq!(ModelFamily::detect("meta-llama/llama-3-70b"), ModelFamily::Generic);
        assert_eq!(ModelFamily::detect(""), ModelFamily::Generic);
    }

    #[test]
    fn provider_segment_does_not_shadow_model_name() {
        // The segment after the slash is what carries the model prefix.
        assert_eq!(
            ModelFamily::detect("openrouter/claude-sonnet-4"),
            ModelFamily::Anthropic
        );
    }

    #[test]
    fn family_ratios() {
        assert_eq!(ModelFamily::Anthropic.chars_per_token(), 3.5);
        assert_eq!(ModelFamily::Generic.chars_per_token(), 4.0);
        assert_eq!(ModelFamily::OpenAi.chars_per_token(), 4.0);
    }
}
