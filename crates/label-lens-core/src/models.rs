//! Core data models used throughout Label Lens.
//!
//! These types represent the law corpus chunks, retrieval hits, and the
//! findings and reports that flow through the evaluation pipeline.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{InputError, ValidationError};

/// A window of law text, immutable once ingested.
///
/// `text` is always stored together with its embedding; the pairing is
/// enforced by the store, not by this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Opaque chunk UUID.
    pub id: String,
    pub text: String,
    /// Retrieval category the chunk belongs to (e.g. `prop65`).
    pub category: String,
    /// Identifier of the law document the chunk was cut from.
    pub source_document: String,
    /// Position of the chunk within its source document, starting at 0.
    pub chunk_index: i64,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// A single similarity-search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub chunk_text: String,
    pub metadata: serde_json::Value,
    pub source_document: String,
    /// Cosine similarity to the query, higher is more relevant.
    pub similarity: f64,
}

/// Ordered severity scale: `low < medium < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(ValidationError::UnknownSeverity(s.to_string())),
        }
    }
}

/// An issue paired with its severity and suggested fix.
///
/// Issues, severities, and fixes travel together from the moment the oracle
/// output is parsed, so filtering can never shift one onto another issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub issue: String,
    pub severity: Severity,
    pub fix: Option<String>,
}

impl Finding {
    pub fn new(issue: impl Into<String>, severity: Severity) -> Self {
        Self {
            issue: issue.into(),
            severity,
            fix: None,
        }
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }
}

/// One detected issue for one law framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceFinding {
    pub law: String,
    pub issue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    pub confidence: f64,
    pub severity: Severity,
}

/// The judgment for a single law framework.
///
/// There is no `compliant` field: compliance is derived from `findings`
/// being empty, so it cannot disagree with the findings.
#[derive(Debug, Clone, PartialEq)]
pub struct LawResult {
    pub law: String,
    pub confidence: f64,
    /// Compliance score in `0..=100`.
    pub compliance_score: u8,
    pub findings: Vec<ComplianceFinding>,
    pub fixes: Vec<String>,
    /// Free-form explanation for defaulted results.
    pub note: Option<String>,
}

impl LawResult {
    pub fn compliant(&self) -> bool {
        self.findings.is_empty()
    }
}

impl Serialize for LawResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.note.is_some() { 7 } else { 6 };
        let mut s = serializer.serialize_struct("LawResult", len)?;
        s.serialize_field("law", &self.law)?;
        s.serialize_field("compliant", &self.compliant())?;
        s.serialize_field("confidence", &self.confidence)?;
        s.serialize_field("compliance_score", &self.compliance_score)?;
        s.serialize_field("findings", &self.findings)?;
        s.serialize_field("fixes", &self.fixes)?;
        if let Some(note) = &self.note {
            s.serialize_field("note", note)?;
        }
        s.end()
    }
}

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub law: String,
    pub reason: String,
    pub confidence: f64,
    pub severity: Severity,
}

impl From<&ComplianceFinding> for ReportEntry {
    fn from(f: &ComplianceFinding) -> Self {
        Self {
            law: f.law.clone(),
            reason: f.issue.clone(),
            confidence: f.confidence,
            severity: f.severity,
        }
    }
}

/// Findings from every non-compliant framework, in framework-list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    pub non_compliant: Vec<ReportEntry>,
}

/// A jurisdiction/category pairing evaluated independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawFramework {
    /// Display name, e.g. `California Proposition 65`.
    pub name: String,
    /// Chunk store category used to filter retrieval.
    pub category: String,
}

impl LawFramework {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// The fixed framework list used when none is configured.
pub fn default_frameworks() -> Vec<LawFramework> {
    vec![
        LawFramework::new("California Proposition 65", "prop65"),
        LawFramework::new("FTC Health Products Compliance Guidance", "health_claims"),
    ]
}

/// The product data under evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subject {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub claims: Vec<String>,
}

impl Subject {
    pub fn new(ingredients: Vec<String>, claims: Vec<String>) -> Self {
        Self {
            ingredients,
            claims,
        }
    }

    /// Trim entries, drop blanks, and reject a subject with nothing to check.
    pub fn validated(self) -> Result<Self, InputError> {
        let clean = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        let subject = Self {
            ingredients: clean(self.ingredients),
            claims: clean(self.claims),
        };
        if subject.ingredients.is_empty() && subject.claims.is_empty() {
            return Err(InputError::EmptySubject);
        }
        Ok(subject)
    }

    pub fn has_ingredients(&self) -> bool {
        !self.ingredients.is_empty()
    }

    pub fn has_claims(&self) -> bool {
        !self.claims.is_empty()
    }

    /// True when only claims were supplied. Gates the hallucination filter.
    pub fn is_claims_only(&self) -> bool {
        !self.has_ingredients() && self.has_claims()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!(" HIGH ".parse::<Severity>().unwrap(), Severity::High);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_law_result_compliance_follows_findings() {
        let mut result = LawResult {
            law: "Prop 65".to_string(),
            confidence: 0.9,
            compliance_score: 90,
            findings: Vec::new(),
            fixes: Vec::new(),
            note: None,
        };
        assert!(result.compliant());
        result.findings.push(ComplianceFinding {
            law: "Prop 65".to_string(),
            issue: "Benzene is listed".to_string(),
            fix: None,
            confidence: 0.9,
            severity: Severity::High,
        });
        assert!(!result.compliant());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["compliant"], false);
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_subject_validation_drops_blanks() {
        let subject = Subject::new(vec!["  ".into()], vec![" Heals acne ".into()])
            .validated()
            .unwrap();
        assert!(subject.ingredients.is_empty());
        assert_eq!(subject.claims, vec!["Heals acne".to_string()]);
        assert!(subject.is_claims_only());
    }

    #[test]
    fn test_subject_validation_rejects_empty() {
        let err = Subject::new(vec![" ".into()], vec![]).validated().unwrap_err();
        assert_eq!(err, InputError::EmptySubject);
    }
}
