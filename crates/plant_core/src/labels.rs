//! Label normalization and matching.

use serde::{Deserialize, Serialize};

/// Predicted label recorded when the API judges the image not to be a plant.
pub const NOT_A_PLANT: &str = "NOT_A_PLANT";

/// A single label suggestion returned by the identification API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    /// API probability in [0,1].
    pub confidence: f64,
}

/// Lowercase, trim, and collapse internal whitespace runs.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a predicted label counts as a pass for the expected one.
pub fn labels_match(expected: &str, predicted: &str) -> bool {
    let expected = normalize_label(expected);
    if predicted == NOT_A_PLANT {
        return expected == "not_a_plant" || expected == "not a plant";
    }
    expected == normalize_label(predicted)
}

/// Highest-confidence candidate. Ties go to the earliest one; NaN never wins.
pub fn top_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        match best {
            None if !candidate.confidence.is_nan() => best = Some(candidate),
            Some(current) if candidate.confidence > current.confidence => best = Some(candidate),
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn candidate(label: &str, confidence: f64) -> Candidate {
        Candidate {
            label: label.to_string(),
            confidence,
        }
    }

    #[rstest]
    #[case("Fungi", "Fungi", true)]
    #[case("fungi", "FUNGI", true)]
    #[case("  Fungi ", "Fungi", true)]
    #[case("early   blight", "Early Blight", true)]
    #[case("Fungi", "Bacteria", false)]
    #[case("Fungi", "Fungi sp.", false)]
    #[case("", "Fungi", false)]
    fn labels_match_after_normalization(
        #[case] expected: &str,
        #[case] predicted: &str,
        #[case] pass: bool,
    ) {
        assert_eq!(labels_match(expected, predicted), pass);
    }

    #[rstest]
    #[case("NOT_A_PLANT", true)]
    #[case("not a plant", true)]
    #[case("Not_A_Plant", true)]
    #[case("Fungi", false)]
    fn not_a_plant_only_matches_its_own_expectation(#[case] expected: &str, #[case] pass: bool) {
        assert_eq!(labels_match(expected, NOT_A_PLANT), pass);
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_label("\tLate  Blight \n"), "late blight");
    }

    #[test]
    fn top_candidate_picks_highest_confidence() {
        let candidates = vec![
            candidate("Bacteria", 0.2),
            candidate("Fungi", 0.87),
            candidate("Virus", 0.1),
        ];
        assert_eq!(top_candidate(&candidates).unwrap().label, "Fungi");
    }

    #[test]
    fn top_candidate_tie_goes_to_first_returned() {
        let candidates = vec![candidate("Fungi", 0.5), candidate("Bacteria", 0.5)];
        assert_eq!(top_candidate(&candidates).unwrap().label, "Fungi");
    }

    #[test]
    fn top_candidate_ignores_nan() {
        let candidates = vec![candidate("Broken", f64::NAN), candidate("Fungi", 0.3)];
        assert_eq!(top_candidate(&candidates).unwrap().label, "Fungi");
        assert!(top_candidate(&[]).is_none());
    }
}
