use phia_core::ToolKind;

/// Decides which kind of tool an exemplar code cell targets.
pub trait ToolClassifier: Send + Sync {
    fn classify(&self, code: &str) -> ToolKind;
}

/// Routes a cell to search when the trigger word appears anywhere in it,
/// case-insensitively, and to code otherwise.
///
/// This is a literal substring match, not a parser: a cell that only
/// mentions the word in a comment or string literal is still routed to search.
#[derive(Clone, Debug)]
pub struct KeywordClassifier {
    trigger: String,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new("search")
    }
}

impl KeywordClassifier {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into().to_lowercase(),
        }
    }
}

impl ToolClassifier for KeywordClassifier {
    fn classify(&self, code: &str) -> ToolKind {
        if code.to_lowercase().contains(&self.trigger) {
            ToolKind::Search
        } else {
            ToolKind::Code
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_word_is_case_insensitive() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.classify("Search('sleep hygiene')"), ToolKind::Search);
        assert_eq!(classifier.classify("print(summary_df.steps.mean())"), ToolKind::Code);
    }

    #[test]
    fn mention_in_comment_still_routes_to_search() {
        let classifier = KeywordClassifier::default();
        assert_eq!(
            classifier.classify("# no need to search here\nprint(1)"),
            ToolKind::Search
        );
    }
}
