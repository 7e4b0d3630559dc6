//! Subject filter applied after fetch

/// Case-insensitive substring match on the subject line
#[derive(Debug, Clone, Default)]
pub struct SubjectFilter {
    needle: Option<String>,
}

impl SubjectFilter {
    /// Build a filter; `None` or an empty string lets every subject through
    pub fn new(needle: Option<&str>) -> Self {
        Self {
            needle: needle.filter(|n| !n.is_empty()).map(str::to_lowercase),
        }
    }

    pub fn is_active(&self) -> bool {
        self.needle.is_some()
    }

    pub fn matches(&self, subject: &str) -> bool {
        match &self.needle {
            Some(needle) => subject.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_filter_matches_everything() {
        let filter = SubjectFilter::new(None);
        assert!(!filter.is_active());
        assert!(filter.matches("anything"));
        assert!(filter.matches(""));

        assert!(!SubjectFilter::new(Some("")).is_active());
    }

    #[test]
    fn test_case_insensitive_containment() {
        let filter = SubjectFilter::new(Some("Invoice"));
        assert!(filter.matches("Your INVOICE for March"));
        assert!(filter.matches("invoice"));
        assert!(!filter.matches("Lunch"));
        assert!(!filter.matches(""));
    }

    #[test]
    fn test_non_ascii_subjects() {
        let filter = SubjectFilter::new(Some("ÜBERWEISUNG"));
        assert!(filter.matches("Ihre Überweisung ist eingegangen"));
    }
}
