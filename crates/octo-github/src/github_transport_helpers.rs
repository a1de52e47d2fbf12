pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Returns the API base without trailing slashes; GraphQL lives at `{base}/graphql`.
pub fn normalize_api_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::{normalize_api_base, truncate_for_error};

    #[test]
    fn unit_truncate_for_error_keeps_short_text_untouched() {
        assert_eq!(truncate_for_error("not found", 800), "not found");
    }

    #[test]
    fn regression_truncate_for_error_preserves_unicode_boundaries() {
        assert_eq!(truncate_for_error("ta🌊u", 3), "ta🌊...");
    }

    #[test]
    fn unit_normalize_api_base_strips_trailing_slashes() {
        assert_eq!(
            normalize_api_base(" https://api.github.com/ "),
            "https://api.github.com"
        );
    }
}
