//! Prepared profile: token sets for every recommendation, computed once per published
//! profile and shared read-only by every scoring pass.

use crate::recommendation::{RecommendationItem, RecommendationProfile};
use crate::text::{tokenize, TokenSet};

#[derive(Debug, Clone)]
pub struct PreparedItem {
    /// Job title / study type.
    pub primary: TokenSet,
    /// Representative skill / degree.
    pub secondary: TokenSet,
    /// `primary ∪ secondary`.
    pub combined: TokenSet,
    /// One set per non-blank skill.
    pub skills: Vec<TokenSet>,
}

impl PreparedItem {
    pub fn new(item: &RecommendationItem) -> Self {
        let primary = tokenize(&item.primary);
        let secondary = tokenize(&item.secondary);
        let combined = primary.union(&secondary);
        let skills = item
            .skills
            .iter()
            .map(|s| tokenize(s))
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            primary,
            secondary,
            combined,
            skills,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreparedProfile {
    items: Vec<PreparedItem>,
}

impl PreparedProfile {
    pub fn new(profile: &RecommendationProfile) -> Self {
        Self {
            items: profile.items().iter().map(PreparedItem::new).collect(),
        }
    }

    pub fn items(&self) -> &[PreparedItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepared_item_token_sets() {
        let item = RecommendationItem::paired("Licence", "Droit des affaires")
            .unwrap()
            .with_skills(vec!["Contrats".into(), "...".into()]);
        let prepared = PreparedItem::new(&item);
        assert_eq!(prepared.primary.len(), 1);
        assert_eq!(prepared.secondary.len(), 3);
        assert_eq!(prepared.combined.len(), 4);
        // punctuation-only skill has no tokens and is dropped
        assert_eq!(prepared.skills.len(), 1);
    }

    #[test]
    fn test_prepared_profile_preserves_order() {
        let profile = RecommendationProfile::from_items(vec![
            RecommendationItem::flat("Boulanger").unwrap(),
            RecommendationItem::flat("Pâtissier").unwrap(),
        ]);
        let prepared = PreparedProfile::new(&profile);
        assert_eq!(prepared.items().len(), 2);
        assert!(prepared.items()[1].primary.contains("patissier"));
    }
}
