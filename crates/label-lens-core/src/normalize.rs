//! Severity normalization and [`LawResult`] assembly.
//!
//! Severities were aligned with issues when the verdict was parsed, so this
//! stage only applies rubric adjustments and attaches framework metadata.
//!
//! Soft-marketing boilerplate ("clinically tested" and similar) is detected
//! and logged, but its severity is left as the judge reported it. Escalating
//! `high` to `critical` for such issues is pending a product decision.

use tracing::debug;

use crate::filter::FilterOutcome;
use crate::models::{ComplianceFinding, Finding, LawFramework, LawResult, Severity};
use crate::validate::Verdict;

/// Phrases that mark generic label boilerplate.
pub const BOILERPLATE_PHRASES: &[&str] = &[
    "dermatologist recommended",
    "clinically tested",
    "gentle formula",
];

/// Case-insensitive check for a boilerplate phrase in an issue.
pub fn mentions_boilerplate(issue: &str) -> bool {
    let lower = issue.to_lowercase();
    BOILERPLATE_PHRASES.iter().any(|p| lower.contains(p))
}

/// Apply rubric adjustments to one finding's severity.
///
/// Boilerplate findings keep their severity; see the module docs.
pub fn adjust_severity(finding: &Finding) -> Severity {
    if mentions_boilerplate(&finding.issue) && finding.severity == Severity::High {
        debug!(issue = %finding.issue, "boilerplate claim reported as high; severity unchanged");
    }
    finding.severity
}

/// Build the framework's [`LawResult`] from a parsed verdict and the
/// filtered findings.
///
/// Each finding keeps the fix it was parsed with; the full `fixes` list is
/// also kept on the result. Compliance is never taken from the verdict's
/// own flag.
pub fn normalize(framework: &LawFramework, verdict: Verdict, filtered: FilterOutcome) -> LawResult {
    if let Some(reported) = verdict.reported_compliant {
        let derived = filtered.findings.is_empty();
        if reported != derived {
            debug!(
                law = %framework.name,
                reported,
                derived,
                "oracle compliance flag disagrees with findings; using findings"
            );
        }
    }

    let findings = filtered
        .findings
        .iter()
        .map(|f| ComplianceFinding {
            law: framework.name.clone(),
            issue: f.issue.clone(),
            fix: f.fix.clone(),
            confidence: verdict.confidence,
            severity: adjust_severity(f),
        })
        .collect();

    LawResult {
        law: framework.name.clone(),
        confidence: verdict.confidence,
        compliance_score: verdict.compliance_score,
        findings,
        fixes: verdict.fixes,
        note: None,
    }
}

/// The result used when retrieval found nothing for a framework.
pub fn no_evidence_result(framework: &LawFramework) -> LawResult {
    LawResult {
        law: framework.name.clone(),
        confidence: 0.0,
        compliance_score: 50,
        findings: Vec::new(),
        fixes: Vec::new(),
        note: Some("no relevant regulatory content".to_string()),
    }
}
