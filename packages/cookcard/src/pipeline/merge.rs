//! Cross-source validation and merging.
//!
//! Vision, transcript, and ASR extractions are produced independently;
//! this module reconciles them. Disagreements about amount or unit are
//! flagged as conflicts and retained, never silently resolved in favor of
//! one source.

use std::collections::HashMap;

use crate::types::card::{
    ConflictClaim, EvidenceSource, Ingredient, IngredientConflict,
};

/// One independently extracted ingredient list, tagged with its source.
#[derive(Debug, Clone)]
pub struct SourcedIngredients {
    pub source: EvidenceSource,
    pub ingredients: Vec<Ingredient>,
}

/// Result of merging sourced lists.
#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    /// Deduplicated union keyed by normalized name, in first-seen order
    pub ingredients: Vec<Ingredient>,

    /// Amount/unit disagreements between sources for the same name
    pub conflicts: Vec<IngredientConflict>,

    /// Sources that contributed at least one ingredient
    pub sources_used: Vec<EvidenceSource>,
}

fn amounts_agree(a: &Ingredient, b: &Ingredient) -> bool {
    let amount_eq = match (a.amount, b.amount) {
        (Some(x), Some(y)) => (x - y).abs() < 1e-6,
        (None, None) => true,
        _ => false,
    };
    amount_eq && a.unit == b.unit
}

fn claim_of(ingredient: &Ingredient, source: EvidenceSource) -> ConflictClaim {
    ConflictClaim {
        source,
        amount: ingredient.amount,
        unit: ingredient.unit.clone(),
    }
}

/// Merge sourced ingredient lists in the order given.
///
/// Lists should be passed in source-priority order (vision, transcript,
/// ASR): on a conflict, the earlier source's entry stays in the merged
/// list and both claims are recorded.
pub fn merge_sources(lists: Vec<SourcedIngredients>) -> MergeResult {
    let mut result = MergeResult::default();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut conflict_index: HashMap<String, usize> = HashMap::new();

    for list in lists {
        let mut contributed = false;

        for ingredient in list.ingredients {
            let key = ingredient.normalized_name.clone();
            match seen.get(&key) {
                None => {
                    seen.insert(key, result.ingredients.len());
                    result.ingredients.push(ingredient);
                    contributed = true;
                }
                Some(&existing_index) => {
                    let existing = &result.ingredients[existing_index];
                    if amounts_agree(existing, &ingredient) {
                        continue;
                    }

                    // Record both sides; extend an existing conflict when a
                    // third source disagrees too
                    match conflict_index.get(&key) {
                        Some(&ci) => {
                            let claim =
                                claim_of(&ingredient, ingredient.evidence_source
                                    .unwrap_or(list.source));
                            if !result.conflicts[ci].claims.contains(&claim) {
                                result.conflicts[ci].claims.push(claim);
                            }
                        }
                        None => {
                            let existing_source =
                                existing.evidence_source.unwrap_or(list.source);
                            let conflict = IngredientConflict {
                                normalized_name: key.clone(),
                                claims: vec![
                                    claim_of(existing, existing_source),
                                    claim_of(
                                        &ingredient,
                                        ingredient.evidence_source.unwrap_or(list.source),
                                    ),
                                ],
                            };
                            conflict_index.insert(key, result.conflicts.len());
                            result.conflicts.push(conflict);
                        }
                    }
                }
            }
        }

        if contributed && !result.sources_used.contains(&list.source) {
            result.sources_used.push(list.source);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::card::Provenance;

    fn ingredient(
        name: &str,
        amount: Option<f32>,
        unit: Option<&str>,
        source: EvidenceSource,
    ) -> Ingredient {
        let mut i = Ingredient::new(name, Provenance::DetectedByModel);
        i.amount = amount;
        i.unit = unit.map(String::from);
        i.evidence_source = Some(source);
        i
    }

    #[test]
    fn test_union_dedupes_by_normalized_name() {
        let merged = merge_sources(vec![
            SourcedIngredients {
                source: EvidenceSource::Vision,
                ingredients: vec![
                    ingredient("Flour", Some(2.0), Some("cup"), EvidenceSource::Vision),
                    ingredient("eggs", Some(3.0), None, EvidenceSource::Vision),
                ],
            },
            SourcedIngredients {
                source: EvidenceSource::Transcript,
                ingredients: vec![
                    ingredient("flour", Some(2.0), Some("cup"), EvidenceSource::Transcript),
                    ingredient("milk", Some(1.0), Some("cup"), EvidenceSource::Transcript),
                ],
            },
        ]);

        let names: Vec<_> = merged
            .ingredients
            .iter()
            .map(|i| i.normalized_name.as_str())
            .collect();
        assert_eq!(names, vec!["flour", "eggs", "milk"]);
        assert!(merged.conflicts.is_empty());
        assert_eq!(
            merged.sources_used,
            vec![EvidenceSource::Vision, EvidenceSource::Transcript]
        );
    }

    #[test]
    fn test_disagreement_is_flagged_not_overwritten() {
        let merged = merge_sources(vec![
            SourcedIngredients {
                source: EvidenceSource::Vision,
                ingredients: vec![ingredient(
                    "butter",
                    Some(2.0),
                    Some("tbsp"),
                    EvidenceSource::Vision,
                )],
            },
            SourcedIngredients {
                source: EvidenceSource::Asr,
                ingredients: vec![ingredient(
                    "butter",
                    Some(4.0),
                    Some("tbsp"),
                    EvidenceSource::Asr,
                )],
            },
        ]);

        // The first source's entry survives in the list...
        assert_eq!(merged.ingredients.len(), 1);
        assert_eq!(merged.ingredients[0].amount, Some(2.0));

        // ...and the conflict retains both claims
        assert_eq!(merged.conflicts.len(), 1);
        let conflict = &merged.conflicts[0];
        assert_eq!(conflict.normalized_name, "butter");
        assert_eq!(conflict.claims.len(), 2);
        assert_eq!(conflict.claims[0].source, EvidenceSource::Vision);
        assert_eq!(conflict.claims[1].source, EvidenceSource::Asr);
    }

    #[test]
    fn test_agreement_within_tolerance_is_no_conflict() {
        let merged = merge_sources(vec![
            SourcedIngredients {
                source: EvidenceSource::Vision,
                ingredients: vec![ingredient("salt", None, None, EvidenceSource::Vision)],
            },
            SourcedIngredients {
                source: EvidenceSource::Transcript,
                ingredients: vec![ingredient("salt", None, None, EvidenceSource::Transcript)],
            },
        ]);
        assert!(merged.conflicts.is_empty());
        assert_eq!(merged.ingredients.len(), 1);
    }

    #[test]
    fn test_source_without_contribution_not_reported() {
        let merged = merge_sources(vec![
            SourcedIngredients {
                source: EvidenceSource::Vision,
                ingredients: vec![ingredient("salt", None, None, EvidenceSource::Vision)],
            },
            SourcedIngredients {
                source: EvidenceSource::Asr,
                ingredients: vec![],
            },
        ]);
        assert_eq!(merged.sources_used, vec![EvidenceSource::Vision]);
    }
}
