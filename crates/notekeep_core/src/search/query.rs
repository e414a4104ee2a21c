//! Search query normalization and title matching.
//!
//! # Invariants
//! - Only titles are searched; content and ids never are.
//! - Terms combine with OR: one matching term is enough.
//! - Terms are literal substrings; punctuation carries no pattern meaning.
//! - Matching is case-insensitive using Unicode lowercase folding.

/// Normalized search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    /// Query that matches every note.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a query from an optional raw string.
    ///
    /// `None`, empty and whitespace-only input all mean "no filter". Other
    /// input is trimmed and split on runs of whitespace; repeated terms are
    /// kept once.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::all();
        };

        let mut terms: Vec<String> = Vec::new();
        for term in raw.split_whitespace() {
            let folded = term.to_lowercase();
            if !terms.contains(&folded) {
                terms.push(folded);
            }
        }
        Self { terms }
    }

    /// Lowercased terms in first-seen order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Returns `true` when no filtering applies.
    pub fn is_unfiltered(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns whether `title` satisfies this query.
    pub fn matches_title(&self, title: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }

        let folded = title.to_lowercase();
        self.terms.iter().any(|term| folded.contains(term.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::SearchQuery;

    const TITLES: [&str; 4] = [
        "Diary Entry",
        "shopping list!!",
        "New Year 2023",
        "my BUCKET LIST",
    ];

    fn matching(raw: &str) -> Vec<&'static str> {
        let query = SearchQuery::parse(Some(raw));
        TITLES
            .iter()
            .copied()
            .filter(|title| query.matches_title(title))
            .collect()
    }

    #[test]
    fn missing_or_blank_query_is_unfiltered() {
        assert!(SearchQuery::parse(None).is_unfiltered());
        assert!(SearchQuery::parse(Some("")).is_unfiltered());
        assert!(SearchQuery::parse(Some(" \t\n ")).is_unfiltered());
        assert_eq!(matching(""), TITLES.to_vec());
    }

    #[test]
    fn exact_word_and_substring_match() {
        assert_eq!(matching("Diary"), vec!["Diary Entry"]);
        assert_eq!(matching("shop"), vec!["shopping list!!"]);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(matching("DIARY"), vec!["Diary Entry"]);
        assert_eq!(matching("list"), vec!["shopping list!!", "my BUCKET LIST"]);
    }

    #[test]
    fn numbers_and_punctuation_match_literally() {
        assert_eq!(matching("2023"), vec!["New Year 2023"]);
        assert_eq!(matching("!!"), vec!["shopping list!!"]);
        assert!(matching("%").is_empty());
        assert!(matching("d_ary").is_empty());
    }

    #[test]
    fn terms_combine_with_or() {
        assert_eq!(matching("diary shop"), vec!["Diary Entry", "shopping list!!"]);
        assert_eq!(
            matching("diary         shop   "),
            vec!["Diary Entry", "shopping list!!"]
        );
    }

    #[test]
    fn unmatched_terms_return_nothing() {
        assert!(matching("random").is_empty());
    }

    #[test]
    fn parse_trims_splits_and_dedupes() {
        let query = SearchQuery::parse(Some("  One two\tONE  "));
        assert_eq!(query.terms(), ["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn unicode_titles_fold_case() {
        let query = SearchQuery::parse(Some("ÉTÉ"));
        assert!(query.matches_title("Notes d'été"));
    }
}
