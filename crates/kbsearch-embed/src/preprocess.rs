/// Normalize text before embedding: collapse whitespace runs into a single
/// space, trim, and cap the length at `max_chars` characters.
pub fn prepare_text(text: &str, max_chars: usize) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::prepare_text;

    #[test]
    fn collapses_whitespace_and_truncates_by_chars() {
        assert_eq!(prepare_text("  肩部\n\n疼痛\t評估  ", 100), "肩部 疼痛 評估");
        assert_eq!(prepare_text("肩部疼痛評估", 4), "肩部疼痛");
        assert_eq!(prepare_text("", 10), "");
    }
}
