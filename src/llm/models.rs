//! Static catalog of chat models offered to clients.

/// Model used when a chat request does not name one.
pub const DEFAULT_MODEL: &str = "ministral-3:8b-instruct-2512-q8_0";

/// Fixed set of model identifiers and their display names.
pub const AVAILABLE_MODELS: &[(&str, &str)] = &[
    ("ministral-3:8b-instruct-2512-q8_0", "Ministral 3 8B Instruct"),
    ("mistral:7b-instruct", "Mistral 7B Instruct"),
];
