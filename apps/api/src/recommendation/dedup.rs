use std::collections::HashSet;

use tracing::debug;

use crate::recommendation::models::RecommendationItem;
use crate::text::normalize;

/// Normalized identity of a recommendation pair.
pub fn dedup_key(primary: &str, secondary: &str) -> String {
    format!("{}__{}", normalize(primary), normalize(secondary))
}

/// Drops items whose dedup key was already seen. First occurrence wins, order preserved.
pub fn dedup_items(items: Vec<RecommendationItem>) -> Vec<RecommendationItem> {
    let before = items.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<RecommendationItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .collect();

    if kept.len() < before {
        debug!(
            "Dropped {} duplicate recommendation(s), {} kept",
            before - kept.len(),
            kept.len()
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(primary: &str, secondary: &str) -> RecommendationItem {
        RecommendationItem::paired(primary, secondary).unwrap()
    }

    #[test]
    fn test_dedup_key_is_normalized() {
        assert_eq!(dedup_key("Ingénieur ", "MASTER"), "ingenieur__master");
        assert_eq!(dedup_key("Bac+2", "B.T.S."), "bac 2__b t s");
    }

    #[test]
    fn test_first_seen_wins() {
        let kept = dedup_items(vec![
            item("Licence", "Droit"),
            item("Master", "Droit"),
            item("licence", "droit"),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].primary, "Licence");
        assert_eq!(kept[1].primary, "Master");
    }

    #[test]
    fn test_pair_order_matters() {
        // (a, b) and (b, a) are different recommendations.
        let kept = dedup_items(vec![
            item("Master", "Informatique"),
            item("Informatique", "Master"),
        ]);
        assert_eq!(kept.len(), 2);
    }
}
