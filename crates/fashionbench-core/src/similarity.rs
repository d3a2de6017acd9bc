//! Similarity primitives.
//!
//! Pure functions scoring an observed value against an expected one. Every
//! function returns a value in `[0, 1]` and is symmetric in its two inputs.
//! Empty inputs are resolved explicitly (two empty answers are identical)
//! rather than raised.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use crate::error::ScoringError;
use crate::synonyms::SynonymTable;

/// Split text into lowercase word tokens.
///
/// Hyphens and apostrophes inside a word are kept (`high-end`, `levi's`) so
/// hyphenated domain terms survive as single tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .map(|t| t.trim_matches(|c| c == '-' || c == '\''))
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Case-folded and trimmed. Inner whitespace is significant.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// 1.0 if the case-insensitive, whitespace-trimmed strings are identical.
pub fn exact_match(a: &str, b: &str) -> f64 {
    if normalize(a) == normalize(b) {
        1.0
    } else {
        0.0
    }
}

/// Jaccard index of the two strings' word sets.
pub fn partial_match(a: &str, b: &str) -> f64 {
    let a: HashSet<String> = tokenize(a).into_iter().collect();
    let b: HashSet<String> = tokenize(b).into_iter().collect();
    jaccard(&a, &b)
}

/// Word-set Jaccard index after mapping synonyms to their canonical key.
///
/// Never scores below [`partial_match`]: merging synonyms can shrink a
/// union faster than it grows an intersection, so the plain overlap is kept
/// as a floor.
pub fn domain_similarity(a: &str, b: &str, synonyms: &SynonymTable) -> f64 {
    let a_tokens = tokenize(a);
    let b_tokens = tokenize(b);

    let plain = jaccard(
        &a_tokens.iter().collect::<HashSet<_>>(),
        &b_tokens.iter().collect::<HashSet<_>>(),
    );

    let a_canon: HashSet<String> = synonyms.canonicalize_tokens(&a_tokens).into_iter().collect();
    let b_canon: HashSet<String> = synonyms.canonicalize_tokens(&b_tokens).into_iter().collect();

    plain.max(jaccard(&a_canon, &b_canon))
}

/// Jaccard index over normalized list items, ignoring order and duplicates.
pub fn list_overlap_score<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> f64 {
    let a: HashSet<String> = a
        .iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();
    let b: HashSet<String> = b
        .iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();
    jaccard(&a, &b)
}

/// Check that a weight table can be used to combine scores.
pub fn validate_weights(weights: &BTreeMap<String, f64>) -> Result<(), ScoringError> {
    if weights.is_empty() {
        return Err(ScoringError::invalid_weights("no weights given"));
    }
    if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        return Err(ScoringError::invalid_weights(format!(
            "weight for `{name}` must be a finite non-negative number, got {w}"
        )));
    }
    if weights.values().sum::<f64>() <= 0.0 {
        return Err(ScoringError::invalid_weights("weights sum to zero"));
    }
    Ok(())
}

/// `Σ(score_i * weight_i) / Σ(weight_i)` over the components named in
/// `weights`. Components scored but not weighted are ignored.
pub fn weighted_score(
    component_scores: &BTreeMap<String, f64>,
    weights: &BTreeMap<String, f64>,
) -> Result<f64, ScoringError> {
    validate_weights(weights)?;

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (name, weight) in weights {
        let score = component_scores.get(name).ok_or_else(|| {
            ScoringError::invalid_weights(format!("component `{name}` has a weight but no score"))
        })?;
        weighted_sum += score * weight;
        total_weight += weight;
    }

    Ok((weighted_sum / total_weight).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn tokenize_keeps_hyphenated_terms() {
        assert_eq!(
            tokenize("A HIGH-END coat -- Levi's!"),
            vec!["a", "high-end", "coat", "levi's"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn exact_match_is_reflexive_and_normalized() {
        for s in ["", "Zara", "  Quiet Luxury ", "$89.99", "über chic"] {
            assert_eq!(exact_match(s, s), 1.0);
        }
        assert_eq!(exact_match("STYLE15", " style15 "), 1.0);
        assert_eq!(exact_match("Bohemian", "Boho"), 0.0);
        assert_eq!(exact_match("STYLE 15", "style  15"), 0.0);
    }

    #[test]
    fn partial_match_jaccard() {
        assert!((partial_match("red silk dress", "red cotton dress") - 0.5).abs() < 1e-9);
        assert_eq!(partial_match("", ""), 1.0);
        assert_eq!(partial_match("", "dress"), 0.0);
        assert_eq!(partial_match("Dress, RED", "red dress"), 1.0);
    }

    #[test]
    fn partial_match_is_symmetric() {
        let pairs = [
            ("oversized tailoring", "tailoring, power dressing"),
            ("", "x"),
            ("quiet luxury and stealth wealth", "quiet luxury"),
        ];
        for (a, b) in pairs {
            assert_eq!(partial_match(a, b), partial_match(b, a));
        }
    }

    #[test]
    fn domain_similarity_uses_synonyms() {
        let synonyms = SynonymTable::fashion();
        let a = "a luxury coat";
        let b = "a high-end coat";
        let domain = domain_similarity(a, b, &synonyms);
        assert_eq!(domain, 1.0);
        assert!(domain >= partial_match(a, b));
        assert_eq!(domain_similarity("bohemian", "boho", &synonyms), 1.0);
    }

    #[test]
    fn domain_similarity_never_below_plain_overlap() {
        let synonyms = SynonymTable::fashion();
        // Canonicalizing collapses {luxury, premium} into one token, which
        // alone would lower the Jaccard index.
        let a = "luxury premium";
        let b = "luxury premium knit";
        assert!(domain_similarity(a, b, &synonyms) >= partial_match(a, b));
    }

    #[test]
    fn domain_similarity_is_commutative() {
        let synonyms = SynonymTable::fashion();
        let pairs = [
            ("relaxed linen set", "casual linen set"),
            ("urban street-style fit", "streetwear"),
            ("", "boho"),
        ];
        for (a, b) in pairs {
            assert_eq!(
                domain_similarity(a, b, &synonyms),
                domain_similarity(b, a, &synonyms)
            );
        }
    }

    #[test]
    fn list_overlap_edge_cases() {
        let empty: [&str; 0] = [];
        assert_eq!(list_overlap_score(&empty, &empty), 1.0);
        assert_eq!(list_overlap_score(&empty, &["x"]), 0.0);
        assert_eq!(list_overlap_score(&["a", "b"], &["b", "a"]), 1.0);
        assert_eq!(list_overlap_score(&[" LTK "], &["ltk", "ltk"]), 1.0);
        assert!((list_overlap_score(&["a", "b"], &["b", "c"]) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_score_combines() {
        let scores = map(&[("x", 1.0), ("y", 0.0)]);
        let weights = map(&[("x", 1.0), ("y", 1.0)]);
        assert_eq!(weighted_score(&scores, &weights).unwrap(), 0.5);

        let weights = map(&[("x", 3.0), ("y", 1.0)]);
        assert_eq!(weighted_score(&scores, &weights).unwrap(), 0.75);
    }

    #[test]
    fn weighted_score_ignores_unweighted_components() {
        let scores = map(&[("x", 0.4), ("extra", 1.0)]);
        let weights = map(&[("x", 2.0)]);
        assert!((weighted_score(&scores, &weights).unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn weighted_score_rejects_bad_weights() {
        let scores = map(&[("x", 1.0)]);
        let cases = [
            map(&[]),
            map(&[("x", 0.0)]),
            map(&[("x", -1.0), ("y", 2.0)]),
            map(&[("x", f64::NAN)]),
            map(&[("x", 1.0), ("missing", 1.0)]),
        ];
        for weights in cases {
            let err = weighted_score(&scores, &weights).unwrap_err();
            assert!(matches!(err, ScoringError::InvalidWeights { .. }), "{weights:?}");
        }
    }
}
