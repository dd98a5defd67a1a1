mod openai;

pub use openai::OpenAiProvider;

use crate::Result;

/// Trait for AI summarization providers
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a summary for the given content
    async fn summarize(&self, content: &str) -> Result<String>;

    /// Longest input, in characters, sent to the provider
    fn max_input_chars(&self) -> usize {
        12_000
    }
}

/// Cut `input` to at most `max_chars` characters on a char boundary
pub(crate) fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("привет", 3), "при");
    }
}
