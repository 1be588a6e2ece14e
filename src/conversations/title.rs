//! One-shot title generation for freshly started conversations.

use crate::llm::{CompletionBackend, CompletionInput, LlmError};

/// Title stored when generation fails or produces nothing usable.
pub const FALLBACK_TITLE: &str = "New Conversation";

/// Sampling temperature for title generation.
const TITLE_TEMPERATURE: f64 = 0.2;

/// Output cap for title generation.
const TITLE_MAX_TOKENS: u64 = 24;

/// Hard cap on stored title length.
const TITLE_MAX_CHARS: usize = 50;

/// How much of each message feeds the title prompt.
const PROMPT_SNIPPET_CHARS: usize = 200;

/// Ask the completion service for a short title summarizing the first
/// exchange of a conversation.
///
/// # Errors
/// Returns an error if the completion call fails. Callers substitute
/// [`FALLBACK_TITLE`] instead of propagating it; a failed title must never
/// block message persistence.
pub async fn generate_title(
    backend: &dyn CompletionBackend,
    user_message: &str,
    bot_response: &str,
    model: &str,
) -> Result<String, LlmError> {
    let prompt = build_title_prompt(user_message, bot_response);

    let raw = backend
        .complete(CompletionInput {
            model: model.to_string(),
            preamble: None,
            history: Vec::new(),
            prompt,
            temperature: Some(TITLE_TEMPERATURE),
            max_tokens: Some(TITLE_MAX_TOKENS),
        })
        .await?;

    Ok(clean_title(&raw))
}

fn build_title_prompt(user_message: &str, bot_response: &str) -> String {
    format!(
        r"Generate a very short title (3-6 words maximum) for this conversation.
Output ONLY the title, nothing else. No quotes, no punctuation at the end.
Do not use asterisks or any special formatting.

User: {}
Assistant: {}

Title:",
        user_message
            .chars()
            .take(PROMPT_SNIPPET_CHARS)
            .collect::<String>(),
        bot_response
            .chars()
            .take(PROMPT_SNIPPET_CHARS)
            .collect::<String>()
    )
}

/// Strip wrapping noise from a model-produced title and cap its length.
fn clean_title(raw: &str) -> String {
    let title = raw.trim().trim_matches('"').trim_matches('*').trim();
    title.chars().take(TITLE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_strips_quotes_and_asterisks() {
        assert_eq!(clean_title("\n \"*Rust Error Help*\" "), "Rust Error Help");
    }

    #[test]
    fn test_clean_title_caps_length() {
        let long = "word ".repeat(40);
        assert_eq!(clean_title(&long).chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn test_clean_title_of_noise_only_is_empty() {
        assert_eq!(clean_title(" \"\" "), "");
    }

    #[test]
    fn test_prompt_truncates_both_sides() {
        let user = "u".repeat(300);
        let bot = "b".repeat(300);
        let prompt = build_title_prompt(&user, &bot);

        assert!(prompt.contains(&"u".repeat(PROMPT_SNIPPET_CHARS)));
        assert!(!prompt.contains(&"u".repeat(PROMPT_SNIPPET_CHARS + 1)));
        assert!(prompt.contains(&"b".repeat(PROMPT_SNIPPET_CHARS)));
        assert!(!prompt.contains(&"b".repeat(PROMPT_SNIPPET_CHARS + 1)));
    }

    #[test]
    fn test_prompt_pins_the_output_contract() {
        let prompt = build_title_prompt("hi", "hello");
        assert!(prompt.contains("3-6 words"));
        assert!(prompt.contains("ONLY the title"));
        assert!(prompt.ends_with("Title:"));
    }
}
