use serde::Serialize;

use crate::recommendation::dedup::{dedup_items, dedup_key};

/// One normalized recommendation: a job title and representative skill, or a study type and
/// degree. After construction both `primary` and `secondary` are non-empty; a flat label fills
/// both with the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationItem {
    pub primary: String,
    pub secondary: String,
    /// Optional skill list, only carried by structured job recommendations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
}

impl RecommendationItem {
    /// Builds an item from two candidate fields, substituting one for the other when missing.
    /// Returns `None` when both are empty after trimming.
    pub fn paired(primary: &str, secondary: &str) -> Option<Self> {
        let primary = primary.trim();
        let secondary = secondary.trim();
        let (primary, secondary) = match (primary.is_empty(), secondary.is_empty()) {
            (true, true) => return None,
            (false, true) => (primary, primary),
            (true, false) => (secondary, secondary),
            (false, false) => (primary, secondary),
        };
        Some(Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            skills: Vec::new(),
        })
    }

    /// A self-paired item from a single label.
    pub fn flat(label: &str) -> Option<Self> {
        Self::paired(label, label)
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    /// `normalize(primary) + "__" + normalize(secondary)`.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.primary, &self.secondary)
    }
}

/// Ordered, deduplicated recommendation items. No two items share a dedup key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecommendationProfile {
    items: Vec<RecommendationItem>,
}

impl RecommendationProfile {
    /// Builds a profile, dropping later items whose dedup key was already seen.
    pub fn from_items(items: Vec<RecommendationItem>) -> Self {
        Self {
            items: dedup_items(items),
        }
    }

    pub fn items(&self) -> &[RecommendationItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_substitutes_missing_field() {
        let item = RecommendationItem::paired("", " Master ").unwrap();
        assert_eq!(item.primary, "Master");
        assert_eq!(item.secondary, "Master");

        let item = RecommendationItem::paired("BTS", "   ").unwrap();
        assert_eq!(item.secondary, "BTS");
    }

    #[test]
    fn test_paired_both_empty_is_none() {
        assert!(RecommendationItem::paired(" ", "\t").is_none());
        assert!(RecommendationItem::flat("").is_none());
    }

    #[test]
    fn test_with_skills_drops_blank_entries() {
        let item = RecommendationItem::flat("Développeur")
            .unwrap()
            .with_skills(vec![" Rust ".into(), "".into(), "SQL".into()]);
        assert_eq!(item.skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_profile_from_items_dedups() {
        let profile = RecommendationProfile::from_items(vec![
            RecommendationItem::flat("Ingénieur").unwrap(),
            RecommendationItem::flat("ingénieur ").unwrap(),
            RecommendationItem::flat("Technicien").unwrap(),
        ]);
        assert_eq!(profile.len(), 2);
        assert_eq!(profile.items()[0].primary, "Ingénieur");
        assert_eq!(profile.items()[1].primary, "Technicien");
    }
}
