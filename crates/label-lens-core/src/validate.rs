//! Strict parsing of oracle output into a [`Verdict`].
//!
//! Parsing policy: a surrounding Markdown code fence is removed, then the
//! trimmed text must be exactly one JSON object. There is no attempt to dig
//! an object out of surrounding prose. Anything else is a
//! [`ValidationError`] so malformed judge output stays visible instead of
//! reading as "compliant".
//!
//! `issues`, `severities`, and `fixes` are zipped into [`Finding`]s here.
//! Missing severities default to `low`; surplus severities are dropped. A
//! fix is attached to the issue at the same position, when there is one.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::models::{Finding, Severity};

const EXCERPT_CHARS: usize = 200;

/// A schema-checked judgment from the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Law name echoed by the oracle, if any.
    pub law: Option<String>,
    /// The oracle's own `compliant` flag. Informational only; compliance is
    /// recomputed from the findings.
    pub reported_compliant: Option<bool>,
    pub findings: Vec<Finding>,
    pub fixes: Vec<String>,
    /// Clamped to `[0.0, 1.0]`; `0.0` when absent.
    pub confidence: f64,
    /// Rounded and clamped to `0..=100`; `0` when absent.
    pub compliance_score: u8,
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push('…');
    }
    out
}

/// Remove a wrapping ```` ```json ```` / ```` ``` ```` fence.
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest.trim_start_matches("json"),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

fn string_array(obj: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(ValidationError::Field {
                    field,
                    reason: format!("element {} is {}, expected a string", i, kind(other)),
                }),
            })
            .collect(),
        Some(other) => Err(ValidationError::Field {
            field,
            reason: format!("expected an array, got {}", kind(other)),
        }),
    }
}

fn number(obj: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(ValidationError::Field {
            field,
            reason: format!("expected a number, got {}", kind(other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse raw oracle text into a [`Verdict`].
pub fn parse_verdict(raw: &str) -> Result<Verdict, ValidationError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!(response = %excerpt(raw), "oracle response is not valid JSON");
        ValidationError::NotJson {
            reason: e.to_string(),
            excerpt: excerpt(raw),
        }
    })?;
    let obj = value.as_object().ok_or_else(|| ValidationError::NotObject {
        excerpt: excerpt(body),
    })?;

    let issues = string_array(obj, "issues")?;
    let labels = string_array(obj, "severities")?;
    let fixes = string_array(obj, "fixes")?;

    if labels.len() > issues.len() {
        debug!(
            issues = issues.len(),
            severities = labels.len(),
            "dropping surplus severities"
        );
    }
    let mut findings = Vec::with_capacity(issues.len());
    for (i, issue) in issues.into_iter().enumerate() {
        let severity = match labels.get(i) {
            Some(label) => label.parse::<Severity>()?,
            None => Severity::Low,
        };
        findings.push(Finding {
            issue,
            severity,
            fix: fixes.get(i).cloned(),
        });
    }

    let confidence = number(obj, "confidence")?.unwrap_or(0.0);
    let confidence = if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let compliance_score = number(obj, "compliance_score")?
        .filter(|s| s.is_finite())
        .map(|s| s.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0);

    let law = match obj.get("law") {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };
    let reported_compliant = obj.get("compliant").and_then(Value::as_bool);

    Ok(Verdict {
        law,
        reported_compliant,
        findings,
        fixes,
        confidence,
        compliance_score,
    })
}
