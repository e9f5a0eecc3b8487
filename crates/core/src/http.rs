//! Shared blocking HTTP plumbing.

use std::time::Duration;

/// Build an agent with a hard overall timeout. Status codes are returned to
/// the caller instead of being turned into transport errors, so each client
/// can classify non-success answers itself.
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Read a response body for an error message, capped at `max` characters.
pub(crate) fn error_body(response: ureq::http::Response<ureq::Body>, max: usize) -> String {
    let text = response
        .into_body()
        .read_to_string()
        .unwrap_or_default();
    truncate(text.trim(), max)
}

/// Truncate a string for error messages without splitting a character.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hello...");
        assert_eq!(truncate("héllo", 2), "hé...");
    }
}
