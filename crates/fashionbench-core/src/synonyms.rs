//! Domain synonym reference data.
//!
//! A [`SynonymTable`] is built once at startup and shared read-only (behind an
//! `Arc`) with every scorer that needs it. Groups are stored as one canonical
//! key with many alternates; lookups normalize both directions so that any
//! member of a group canonicalizes to the same key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A canonical domain term and its interchangeable alternates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymGroup {
    pub canonical: String,
    #[serde(default)]
    pub alternates: Vec<String>,
}

impl SynonymGroup {
    pub fn new(canonical: &str, alternates: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            alternates: alternates.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Built-in fashion vocabulary.
const FASHION_GROUPS: &[(&str, &[&str])] = &[
    ("luxury", &["high-end", "premium", "upscale", "designer"]),
    ("casual", &["relaxed", "laid-back", "comfortable", "easy"]),
    ("elegant", &["sophisticated", "refined", "polished", "chic"]),
    ("trendy", &["fashionable", "stylish", "on-trend", "contemporary"]),
    ("vintage", &["retro", "classic", "throwback", "timeless"]),
    ("minimalist", &["simple", "clean", "understated", "minimal"]),
    ("bohemian", &["boho", "hippie", "free-spirited", "eclectic"]),
    ("streetwear", &["urban", "street-style", "casual-cool"]),
    ("athleisure", &["sporty", "athletic", "activewear"]),
    ("sustainable", &["eco-friendly", "ethical", "conscious", "green"]),
];

/// Process-wide, read-only synonym lookup.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    groups: Vec<SynonymGroup>,
    /// Single-token member -> canonical key.
    tokens: HashMap<String, String>,
    /// Multi-token member -> canonical key.
    phrases: Vec<(Vec<String>, String)>,
}

impl SynonymTable {
    /// Build a table from groups. The first group claiming a term wins.
    pub fn new(groups: Vec<SynonymGroup>) -> Self {
        let mut tokens = HashMap::new();
        let mut phrases: Vec<(Vec<String>, String)> = Vec::new();

        // Canonical keys always map to themselves, even if an earlier group
        // lists the same word as an alternate.
        for group in &groups {
            let key = normalize_term(&group.canonical);
            if !key.contains(' ') {
                tokens.insert(key.clone(), key);
            }
        }

        for group in &groups {
            let key = normalize_term(&group.canonical);
            for term in std::iter::once(&group.canonical).chain(&group.alternates) {
                let term = normalize_term(term);
                if term.is_empty() {
                    continue;
                }
                if term.contains(' ') {
                    let words: Vec<String> = term.split(' ').map(String::from).collect();
                    if !phrases.iter().any(|(p, _)| *p == words) {
                        phrases.push((words, key.clone()));
                    }
                } else {
                    tokens.entry(term).or_insert_with(|| key.clone());
                }
            }
        }

        // Longest phrases first so greedy matching prefers them.
        phrases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            groups,
            tokens,
            phrases,
        }
    }

    /// The built-in fashion vocabulary.
    pub fn fashion() -> Self {
        Self::new(
            FASHION_GROUPS
                .iter()
                .map(|(canonical, alternates)| SynonymGroup::new(canonical, alternates))
                .collect(),
        )
    }

    /// The built-in vocabulary plus `extra` groups (which lose ties).
    pub fn fashion_with(extra: Vec<SynonymGroup>) -> Self {
        let mut table = Self::fashion();
        if extra.is_empty() {
            return table;
        }
        let mut groups = std::mem::take(&mut table.groups);
        groups.extend(extra);
        Self::new(groups)
    }

    pub fn groups(&self) -> &[SynonymGroup] {
        &self.groups
    }

    /// Canonical key for a single token, or the token itself.
    pub fn canonicalize<'a>(&'a self, token: &'a str) -> &'a str {
        self.tokens.get(token).map(String::as_str).unwrap_or(token)
    }

    /// Replace every group member in a token stream with its canonical key.
    pub fn canonicalize_tokens(&self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        'outer: while i < tokens.len() {
            for (phrase, key) in &self.phrases {
                let n = phrase.len();
                if i + n <= tokens.len() && tokens[i..i + n] == phrase[..] {
                    out.push(key.clone());
                    i += n;
                    continue 'outer;
                }
            }
            out.push(self.canonicalize(&tokens[i]).to_string());
            i += 1;
        }
        out
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::fashion()
    }
}

fn normalize_term(term: &str) -> String {
    crate::similarity::tokenize(term).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alternates_map_to_canonical() {
        let table = SynonymTable::fashion();
        assert_eq!(table.canonicalize("boho"), "bohemian");
        assert_eq!(table.canonicalize("high-end"), "luxury");
        assert_eq!(table.canonicalize("luxury"), "luxury");
        assert_eq!(table.canonicalize("denim"), "denim");
    }

    #[test]
    fn canonical_key_beats_alternate_of_other_group() {
        let table = SynonymTable::new(vec![
            SynonymGroup::new("vintage", &["classic"]),
            SynonymGroup::new("classic", &["timeless"]),
        ]);
        assert_eq!(table.canonicalize("classic"), "classic");
        assert_eq!(table.canonicalize("timeless"), "classic");
    }

    #[test]
    fn phrases_are_matched_greedily() {
        let table = SynonymTable::fashion_with(vec![SynonymGroup::new(
            "quiet-luxury",
            &["stealth wealth", "old money"],
        )]);
        let out = table.canonicalize_tokens(&toks(&["stealth", "wealth", "aesthetic"]));
        assert_eq!(out, toks(&["quiet-luxury", "aesthetic"]));
    }

    #[test]
    fn extra_groups_do_not_override_builtin() {
        let table =
            SynonymTable::fashion_with(vec![SynonymGroup::new("edgy", &["boho", "grunge"])]);
        assert_eq!(table.canonicalize("boho"), "bohemian");
        assert_eq!(table.canonicalize("grunge"), "edgy");
        assert_eq!(table.groups().len(), 11);
    }
}
