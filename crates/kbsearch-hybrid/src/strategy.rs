use kbsearch_core::config::StrategySettings;
use kbsearch_core::types::Strategy;

/// Picks a retrieval strategy from the shape of the query.
///
/// Short queries (few words, few characters) get the balanced
/// `vector_enhanced` split; long or wordy ones lean on the vector side.
/// Mid-length queries follow the caller's context.
#[derive(Debug, Clone, Default)]
pub struct StrategySelector {
    settings: StrategySettings,
}

impl StrategySelector {
    pub fn new(settings: StrategySettings) -> Self { Self { settings } }

    pub fn select(&self, query: &str, context: Option<&str>, vector_available: bool) -> Strategy {
        if !vector_available { return Strategy::Traditional; }
        let s = &self.settings;
        let words = query.split_whitespace().count();
        let chars = query.chars().count();
        if words <= s.short_max_words && chars <= s.short_max_chars {
            Strategy::VectorEnhanced
        } else if words > s.long_min_words || chars > s.long_min_chars {
            Strategy::VectorPrimary
        } else if context.is_some_and(|c| s.quick_contexts.iter().any(|q| q == c)) {
            Strategy::VectorEnhanced
        } else {
            Strategy::VectorPrimary
        }
    }
}

/// [`StrategySelector::select`] with default thresholds.
pub fn select_strategy(query: &str, context: Option<&str>, vector_available: bool) -> Strategy {
    StrategySelector::default().select(query, context, vector_available)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_vector_forces_traditional() {
        assert_eq!(select_strategy("疼痛", None, false), Strategy::Traditional);
        assert_eq!(select_strategy("a much longer query with many words in it", Some("quick_search"), false), Strategy::Traditional);
    }

    #[test]
    fn short_queries_are_enhanced() {
        assert_eq!(select_strategy("疼痛", None, true), Strategy::VectorEnhanced);
        assert_eq!(select_strategy("neck pain", None, true), Strategy::VectorEnhanced);
    }

    #[test]
    fn long_queries_are_primary() {
        assert_eq!(select_strategy("病人主訴肩部疼痛已經三個月", None, true), Strategy::VectorPrimary);
        assert_eq!(select_strategy("a b c d e f", Some("quick_search"), true), Strategy::VectorPrimary);
        assert_eq!(select_strategy(&"痛".repeat(21), Some("tag_search"), true), Strategy::VectorPrimary);
    }

    #[test]
    fn mid_length_queries_follow_context() {
        let q = "chronic neck pain";
        assert_eq!(select_strategy(q, Some("quick_search"), true), Strategy::VectorEnhanced);
        assert_eq!(select_strategy(q, Some("tag_search"), true), Strategy::VectorEnhanced);
        assert_eq!(select_strategy(q, Some("browse"), true), Strategy::VectorPrimary);
        assert_eq!(select_strategy(q, None, true), Strategy::VectorPrimary);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // ten CJK characters are 30 bytes but still a short query
        assert_eq!(select_strategy(&"痛".repeat(10), None, true), Strategy::VectorEnhanced);
    }

    #[test]
    fn thresholds_come_from_settings() {
        let selector = StrategySelector::new(StrategySettings { short_max_chars: 3, ..StrategySettings::default() });
        assert_eq!(selector.select("疼痛評估", None, true), Strategy::VectorPrimary);
    }
}
