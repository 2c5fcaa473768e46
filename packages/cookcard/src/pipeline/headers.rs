//! Section-header filter.
//!
//! Language models routinely return grouping lines like "For the sauce:"
//! as ingredients. This filter removes them. Idempotent: filtering
//! already-filtered output removes nothing further.

use crate::traits::model::CandidateIngredient;
use crate::types::card::normalize_ingredient_name;

/// Category words that, standing alone, are headers rather than food.
const CATEGORY_WORDS: &[&str] = &[
    "sauce", "dough", "filling", "topping", "toppings", "garnish", "marinade", "glaze",
    "dressing", "batter", "base", "crust", "frosting", "icing", "assembly", "serving",
    "to serve", "note", "notes", "equipment", "ingredients", "instructions", "directions",
    "method", "optional", "wet ingredients", "dry ingredients",
];

/// Is this name a section header rather than an ingredient?
pub fn is_section_header(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.ends_with(':') {
        return true;
    }

    let normalized = normalize_ingredient_name(trimmed);
    let stripped = normalized
        .strip_prefix("for the ")
        .or_else(|| normalized.strip_prefix("for "))
        .unwrap_or(&normalized);

    CATEGORY_WORDS.contains(&stripped)
}

/// Drop header-like candidates, preserving order of the rest.
pub fn filter_section_headers(candidates: Vec<CandidateIngredient>) -> Vec<CandidateIngredient> {
    candidates
        .into_iter()
        .filter(|c| !is_section_header(&c.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidates(names: &[&str]) -> Vec<CandidateIngredient> {
        names.iter().map(|n| CandidateIngredient::new(*n)).collect()
    }

    #[test]
    fn test_detects_headers() {
        assert!(is_section_header("For the sauce:"));
        assert!(is_section_header("For the Sauce"));
        assert!(is_section_header("Toppings"));
        assert!(is_section_header("Dry ingredients"));
        assert!(is_section_header("Anything at all:"));
        assert!(is_section_header("  "));
    }

    #[test]
    fn test_keeps_real_ingredients() {
        assert!(!is_section_header("2 cups flour"));
        assert!(!is_section_header("soy sauce"));
        assert!(!is_section_header("pizza dough balls"));
        assert!(!is_section_header("optional chili flakes"));
    }

    #[test]
    fn test_filter_preserves_order() {
        let filtered =
            filter_section_headers(candidates(&["For the sauce:", "tomatoes", "Garnish", "basil"]));
        let names: Vec<_> = filtered.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["tomatoes", "basil"]);
    }

    proptest! {
        /// Filtering twice removes nothing the first pass kept.
        #[test]
        fn prop_filter_is_idempotent(names in proptest::collection::vec("[ -~]{0,40}", 0..20)) {
            let first = filter_section_headers(
                names.iter().map(|n| CandidateIngredient::new(n.clone())).collect(),
            );
            let second = filter_section_headers(first.clone());
            prop_assert_eq!(first, second);
        }
    }
}
