//! Evidence validation - the anti-hallucination gate.
//!
//! The model is a proposer; this is the gate. An ingredient survives only
//! if its claimed evidence phrase occurs as a literal substring of the
//! source text (case-insensitive, whitespace-normalized). Pure function,
//! no side effects.

use crate::traits::model::CandidateIngredient;

/// Candidates partitioned by whether their evidence held up.
#[derive(Debug, Clone, Default)]
pub struct EvidencePartition {
    pub validated: Vec<CandidateIngredient>,
    pub rejected: Vec<CandidateIngredient>,
}

/// Lowercase and collapse all whitespace runs to single spaces.
pub fn normalize_for_match(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.extend(c.to_lowercase());
            last_space = false;
        }
    }
    out.trim_end().to_string()
}

/// Partition candidates by literal evidence presence in `source_text`.
///
/// Candidates without any evidence phrase are rejected outright: for
/// model-derived ingredients the phrase is mandatory.
pub fn validate_evidence(
    source_text: &str,
    candidates: Vec<CandidateIngredient>,
) -> EvidencePartition {
    let haystack = normalize_for_match(source_text);
    let mut partition = EvidencePartition::default();

    for candidate in candidates {
        let supported = candidate
            .evidence_phrase
            .as_deref()
            .map(normalize_for_match)
            .is_some_and(|needle| !needle.is_empty() && haystack.contains(&needle));

        if supported {
            partition.validated.push(candidate);
        } else {
            partition.rejected.push(candidate);
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, evidence: Option<&str>) -> CandidateIngredient {
        let mut c = CandidateIngredient::new(name);
        c.evidence_phrase = evidence.map(String::from);
        c
    }

    #[test]
    fn test_literal_evidence_survives() {
        let source = "You'll need 2 cups of flour and a stick of butter.";
        let partition = validate_evidence(
            source,
            vec![
                candidate("flour", Some("2 cups of flour")),
                candidate("butter", Some("a stick of butter")),
            ],
        );
        assert_eq!(partition.validated.len(), 2);
        assert!(partition.rejected.is_empty());
    }

    #[test]
    fn test_fabricated_evidence_rejected() {
        let source = "Melt butter in a pan.";
        let partition = validate_evidence(
            source,
            vec![candidate("saffron", Some("a pinch of saffron"))],
        );
        assert!(partition.validated.is_empty());
        assert_eq!(partition.rejected.len(), 1);
        assert_eq!(partition.rejected[0].name, "saffron");
    }

    #[test]
    fn test_missing_evidence_rejected() {
        let partition = validate_evidence("anything", vec![candidate("flour", None)]);
        assert!(partition.validated.is_empty());

        let partition = validate_evidence("anything", vec![candidate("flour", Some("  "))]);
        assert!(partition.validated.is_empty());
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let source = "Add  2 CUPS\nof Flour";
        let partition =
            validate_evidence(source, vec![candidate("flour", Some("2 cups of flour"))]);
        assert_eq!(partition.validated.len(), 1);
    }

    #[test]
    fn test_normalize_for_match() {
        assert_eq!(normalize_for_match("  A \t B\n\nC  "), "a b c");
        assert_eq!(normalize_for_match(""), "");
    }
}
