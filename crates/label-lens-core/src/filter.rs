//! Hallucination filter for claims-only evaluations.
//!
//! When only marketing claims were supplied, any finding about ingredients
//! cannot be grounded in the subject and is dropped. Classification is
//! behind [`IssueClassifier`] so the heuristic can be replaced.
//!
//! The filter never manufactures compliance: if every finding would be
//! removed, the original findings are kept unchanged.

use regex::Regex;
use tracing::{debug, info};

use crate::models::{Finding, Subject};

/// Decides whether an issue talks about ingredients rather than claims.
pub trait IssueClassifier: Send + Sync {
    fn is_ingredient_flavored(&self, issue: &str) -> bool;
}

/// Substrings that mark an issue as ingredient-related (case-insensitive).
pub const INGREDIENT_KEYWORDS: &[&str] = &[
    "ingredient",
    "listed in",
    "concentration",
    "formulation",
    "chemical",
    "compound",
];

/// Keyword plus chemical-name heuristic.
///
/// A capitalized token counts as a chemical name when it carries a
/// substance suffix. Suffixes that are rare in English (`Benzene`,
/// `Parabens`, `Vinyl`) count anywhere; suffixes shared with ordinary words
/// (`Sodium`, `Oxybenzone`, `Ethanol`, but also `Separate`) count only when
/// the token does not open a sentence. CAS registry numbers also count.
pub struct KeywordClassifier {
    strong_suffix: Regex,
    weak_suffix: Regex,
    cas_number: Regex,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            strong_suffix: Regex::new(r"\b[A-Z][a-z]{2,}(?:ene|ane|yl|ben)s?\b")
                .expect("strong suffix pattern is valid"),
            weak_suffix: Regex::new(r"\b[A-Z][a-z]{2,}(?:ate|ide|ol|one|ium)s?\b")
                .expect("weak suffix pattern is valid"),
            cas_number: Regex::new(r"\b\d{2,7}-\d{2}-\d\b").expect("CAS pattern is valid"),
        }
    }

    fn has_chemical_name(&self, issue: &str) -> bool {
        if self.strong_suffix.is_match(issue) {
            return true;
        }
        self.weak_suffix.find_iter(issue).any(|m| {
            let before = issue[..m.start()].trim_end();
            match before.chars().last() {
                None => false,
                Some(c) => !matches!(c, '.' | '!' | '?' | ':' | '"' | '\'' | '(' | '-'),
            }
        })
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueClassifier for KeywordClassifier {
    fn is_ingredient_flavored(&self, issue: &str) -> bool {
        let lower = issue.to_lowercase();
        INGREDIENT_KEYWORDS.iter().any(|k| lower.contains(k))
            || self.has_chemical_name(issue)
            || self.cas_number.is_match(issue)
    }
}

/// Result of filtering one framework's findings.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub findings: Vec<Finding>,
    /// Findings dropped as ingredient-flavored.
    pub removed: usize,
    /// True when filtering would have emptied the list and the original
    /// findings were restored.
    pub restored: bool,
}

/// Drop ingredient-flavored findings from a claims-only evaluation.
///
/// Subjects with ingredients, and empty finding lists, pass through untouched.
pub fn filter_findings(
    findings: Vec<Finding>,
    subject: &Subject,
    classifier: &dyn IssueClassifier,
) -> FilterOutcome {
    if !subject.is_claims_only() || findings.is_empty() {
        return FilterOutcome {
            findings,
            removed: 0,
            restored: false,
        };
    }

    let (kept, dropped): (Vec<Finding>, Vec<Finding>) = findings
        .iter()
        .cloned()
        .partition(|f| !classifier.is_ingredient_flavored(&f.issue));

    for f in &dropped {
        debug!(issue = %f.issue, "dropping ingredient-flavored finding from claims-only review");
    }

    if kept.is_empty() {
        info!(
            count = findings.len(),
            "every finding looked ingredient-related; keeping the unfiltered findings"
        );
        return FilterOutcome {
            findings,
            removed: 0,
            restored: true,
        };
    }

    FilterOutcome {
        removed: dropped.len(),
        findings: kept,
        restored: false,
    }
}
