//! Filter criteria for sentence lookup

use super::{Category, Sentence, SentenceId};

/// What the caller is looking for
///
/// An empty category list matches every category. Length bounds are
/// inclusive and counted in characters. When `id` is set it takes priority
/// and the other fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub categories: Vec<Category>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub id: Option<SentenceId>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_id(mut self, id: SentenceId) -> Self {
        self.id = Some(id);
        self
    }

    /// Check category membership and length bounds (ignores `id`)
    pub fn matches(&self, sentence: &Sentence) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&sentence.category) {
            return false;
        }
        let length = sentence.length();
        if self.min_length.is_some_and(|min| length < min) {
            return false;
        }
        if self.max_length.is_some_and(|max| length > max) {
            return false;
        }
        true
    }
}

impl std::fmt::Display for Criteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(id) = &self.id {
            return write!(f, "id {}", id);
        }

        let mut parts = Vec::new();
        if !self.categories.is_empty() {
            let codes: Vec<String> = self.categories.iter().map(|c| c.to_string()).collect();
            parts.push(format!("category in [{}]", codes.join(", ")));
        }
        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) => parts.push(format!("length {}..={}", min, max)),
            (Some(min), None) => parts.push(format!("length >= {}", min)),
            (None, Some(max)) => parts.push(format!("length <= {}", max)),
            (None, None) => {}
        }

        if parts.is_empty() {
            write!(f, "any sentence")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_criteria_matches_everything() {
        let criteria = Criteria::new();
        assert!(criteria.matches(&Sentence::new(1, "短句", Category::Anime)));
        assert!(criteria.matches(&Sentence::new(2, "x", Category::Witticism)));
    }

    #[test]
    fn test_category_filter() {
        let criteria = Criteria::new().with_categories([Category::Anime, Category::Game]);
        assert!(criteria.matches(&Sentence::new(1, "x", Category::Game)));
        assert!(!criteria.matches(&Sentence::new(1, "x", Category::Poetry)));
    }

    #[test]
    fn test_length_bounds_are_inclusive_chars() {
        let criteria = Criteria::new().with_length(Some(2), Some(3));
        assert!(criteria.matches(&Sentence::new(1, "短句", Category::Anime)));
        assert!(criteria.matches(&Sentence::new(1, "三个字", Category::Anime)));
        assert!(!criteria.matches(&Sentence::new(1, "字", Category::Anime)));
        assert!(!criteria.matches(&Sentence::new(1, "四个字了", Category::Anime)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Criteria::new().to_string(), "any sentence");
        assert_eq!(
            Criteria::new()
                .with_categories([Category::Anime, Category::Literature])
                .with_length(Some(10), Some(20))
                .to_string(),
            "category in [a, d], length 10..=20"
        );
        assert_eq!(
            Criteria::new()
                .with_length(Some(5), None)
                .with_id(SentenceId::Numeric(99))
                .to_string(),
            "id 99"
        );
    }
}
