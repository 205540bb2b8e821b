//! `lens check`: evaluate a product against every configured law.
//!
//! Input is a JSON object `{ "ingredients": [...], "claims": [...] }` read
//! from a file or stdin. The aggregate report is printed to stdout as JSON;
//! logs go to stderr.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

use label_lens_core::evaluate::{Evaluation, Evaluator, LawSummary};
use label_lens_core::filter::KeywordClassifier;
use label_lens_core::models::{AggregateReport, Subject};

use crate::config::Config;
use crate::embedding::create_gateway;
use crate::oracle::create_oracle;
use crate::sqlite_store::SqliteStore;

#[derive(Serialize)]
struct DetailedReport<'a> {
    report: AggregateReport,
    laws: Vec<LawSummary<'a>>,
    average_compliance_score: Option<f64>,
}

/// Parse the subject JSON. Blank validation happens in the evaluator.
pub fn parse_subject(text: &str) -> Result<Subject> {
    serde_json::from_str(text)
        .context("input must be a JSON object with optional `ingredients` and `claims` string arrays")
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Run the evaluation with the configured providers and store.
pub async fn evaluate_subject(config: &Config, subject: Subject) -> Result<Evaluation> {
    let gateway = create_gateway(&config.embedding)?;
    let oracle = create_oracle(&config.oracle)?;
    let store = SqliteStore::open(config).await?;
    let classifier = KeywordClassifier::new();

    let evaluator = Evaluator {
        gateway: gateway.as_ref(),
        store: &store,
        oracle: oracle.as_ref(),
        classifier: &classifier,
        retrieval: config.retrieval.params(),
        oracle_params: config.oracle.params(),
        concurrency: config.evaluation.concurrency,
    };
    let evaluation = evaluator.evaluate(&config.laws, subject).await?;
    store.pool().close().await;
    Ok(evaluation)
}

/// Render the evaluation as the JSON printed by `lens check`.
pub fn render(evaluation: &Evaluation, detailed: bool) -> Result<String> {
    let out = if detailed {
        serde_json::to_string_pretty(&DetailedReport {
            report: evaluation.report(),
            laws: evaluation.law_summaries(),
            average_compliance_score: evaluation.average_compliance_score(),
        })?
    } else {
        serde_json::to_string_pretty(&evaluation.report())?
    };
    Ok(out)
}

/// `lens check` entry point.
pub async fn run_check(config: &Config, input: Option<&Path>, detailed: bool) -> Result<()> {
    let subject = parse_subject(&read_input(input)?)?;
    let evaluation = evaluate_subject(config, subject).await?;

    if let Some(avg) = evaluation.average_compliance_score() {
        tracing::info!(average_compliance_score = avg, "evaluation finished");
    }
    println!("{}", render(&evaluation, detailed)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subject_defaults_missing_lists() {
        let subject = parse_subject(r#"{"claims": ["Heals acne fast"]}"#).unwrap();
        assert!(subject.ingredients.is_empty());
        assert_eq!(subject.claims.len(), 1);
    }

    #[test]
    fn test_parse_subject_rejects_bad_shapes() {
        assert!(parse_subject("not json").is_err());
        assert!(parse_subject(r#"{"ingredients": "benzene"}"#).is_err());
    }
}
