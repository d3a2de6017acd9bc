//! Structured field extraction scoring.
//!
//! Compares each expected field with the primitive suited to its kind and
//! combines the per-field scores with `weighted_score`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::FieldValue;
use crate::similarity::{domain_similarity, exact_match, list_overlap_score};
use crate::synonyms::SynonymTable;

/// Field name segments that denote values which must match precisely.
const PRECISE_SEGMENTS: &[&str] = &[
    "code", "price", "discount", "link", "url", "id", "sku", "percent",
];

/// Which primitive a field is compared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Case-insensitive exact match (codes, prices, links, flags).
    Exact,
    /// Synonym-aware token overlap (brands, style descriptors).
    Domain,
    /// Set overlap (platforms, disclosures).
    List,
}

impl FieldKind {
    /// Infer the kind from the expected value and the field name.
    pub fn infer(name: &str, expected: &FieldValue) -> Self {
        match expected {
            FieldValue::List(_) => FieldKind::List,
            FieldValue::Bool(_) | FieldValue::Number(_) => FieldKind::Exact,
            FieldValue::Text(_) => {
                let lower = name.to_lowercase();
                let precise = lower
                    .split(['_', '-', ' '])
                    .any(|segment| PRECISE_SEGMENTS.contains(&segment));
                if precise {
                    FieldKind::Exact
                } else {
                    FieldKind::Domain
                }
            }
        }
    }
}

/// Per-field scores and their weighted combination.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldScores {
    pub per_field: BTreeMap<String, f64>,
    pub combined: f64,
}

/// Scores multi-field extractions.
#[derive(Debug, Clone, Default)]
pub struct FieldScorer {
    weights: BTreeMap<String, f64>,
    kinds: BTreeMap<String, FieldKind>,
}

impl FieldScorer {
    /// Build a scorer. Fields without a configured weight weigh 1.0.
    pub fn new(
        weights: BTreeMap<String, f64>,
        kinds: BTreeMap<String, FieldKind>,
    ) -> Result<Self, ScoringError> {
        if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || **w <= 0.0) {
            return Err(ScoringError::invalid_weights(format!(
                "field weight for `{name}` must be a positive number, got {w}"
            )));
        }
        Ok(Self { weights, kinds })
    }

    pub fn kind_of(&self, name: &str, expected: &FieldValue) -> FieldKind {
        self.kinds
            .get(name)
            .copied()
            .unwrap_or_else(|| FieldKind::infer(name, expected))
    }

    /// Score `observed` against every field in `expected`.
    ///
    /// Missing observed fields score 0.0; extra observed fields are ignored.
    /// `observed` is `None` when the model did not return a mapping at all.
    pub fn score(
        &self,
        expected: &BTreeMap<String, FieldValue>,
        observed: Option<&BTreeMap<String, FieldValue>>,
        synonyms: &SynonymTable,
    ) -> Result<FieldScores, ScoringError> {
        let mut per_field = BTreeMap::new();
        let mut weights = BTreeMap::new();

        for (name, want) in expected {
            let score = match observed.and_then(|o| o.get(name)) {
                None => 0.0,
                Some(got) => match self.kind_of(name, want) {
                    FieldKind::Exact => exact_match(&want.as_text(), &got.as_text()),
                    FieldKind::Domain => {
                        domain_similarity(&want.as_text(), &got.as_text(), synonyms)
                    }
                    FieldKind::List => list_overlap_score(&want.as_items(), &got.as_items()),
                },
            };
            per_field.insert(name.clone(), score);
            weights.insert(
                name.clone(),
                self.weights.get(name).copied().unwrap_or(1.0),
            );
        }

        let combined = crate::similarity::weighted_score(&per_field, &weights)?;
        Ok(FieldScores {
            per_field,
            combined,
        })
    }
}
