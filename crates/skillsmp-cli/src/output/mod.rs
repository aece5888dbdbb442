pub mod json;
pub mod table;

pub use crate::cli::OutputFormat;

/// Longest description shown in listings.
pub const DESCRIPTION_PREVIEW: usize = 100;

/// Cut `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}
