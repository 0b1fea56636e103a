/// Outcome of reading one chat message
///
/// `count == 0` means the message is not a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractionResult {
    pub count: u32,
    pub is_total: bool,
}

impl ExtractionResult {
    pub fn new(count: u32, is_total: bool) -> Self {
        Self { count, is_total }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_report(&self) -> bool {
        self.count > 0
    }
}

/// Locale word lists used for marker and keyword scanning.
///
/// Entries are matched as lowercase substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportVocabulary {
    total_markers: Vec<String>,
    keywords: Vec<String>,
}

impl ReportVocabulary {
    pub fn new<M, K>(
        total_markers: impl IntoIterator<Item = M>,
        keywords: impl IntoIterator<Item = K>,
    ) -> Self
    where
        M: Into<String>,
        K: Into<String>,
    {
        Self {
            total_markers: total_markers
                .into_iter()
                .map(|m| m.into().to_lowercase())
                .collect(),
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }

    /// Words that turn a report into a whole-day total
    pub fn has_total_marker(&self, lower: &str) -> bool {
        self.total_markers.iter().any(|m| lower.contains(m.as_str()))
    }

    pub fn has_keyword(&self, lower: &str) -> bool {
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl Default for ReportVocabulary {
    fn default() -> Self {
        Self::new(
            ["за день", "за сегодня", "всего", "сегодня"],
            [
                "отжим", "отжал", "сделал", "подход", "выполнил", "осилил", "пуш", "push",
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary() {
        let vocabulary = ReportVocabulary::default();
        assert!(vocabulary.has_total_marker("всего 100"));
        assert!(vocabulary.has_total_marker("за день 50"));
        assert!(!vocabulary.has_total_marker("вчера 50"));
        assert!(vocabulary.has_keyword("отжимания 20"));
        assert!(vocabulary.has_keyword("pushups 20"));
        assert!(!vocabulary.has_keyword("привет"));
    }

    #[test]
    fn test_vocabulary_lowercases_entries() {
        let vocabulary = ReportVocabulary::new(["TOTAL"], ["Reps"]);
        assert!(vocabulary.has_total_marker("total 5"));
        assert!(vocabulary.has_keyword("reps 5"));
    }

    #[test]
    fn test_zero_count_is_not_a_report() {
        assert!(!ExtractionResult::none().is_report());
        assert!(!ExtractionResult::new(0, true).is_report());
        assert!(ExtractionResult::new(1, false).is_report());
    }
}
