// nexus-core/src/utils.rs
//! General utility functions.

/// Keeps the first `max_chars` characters and appends `...` when anything was cut.
/// Counts characters, not bytes.
pub fn preview(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}
