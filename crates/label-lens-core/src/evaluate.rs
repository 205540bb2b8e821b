//! The per-law evaluation loop and report aggregation.
//!
//! Each [`LawFramework`] runs retrieve → prompt → oracle → validate →
//! filter → normalize independently. Frameworks are evaluated with bounded
//! concurrency, and outcomes are always returned in framework-list order.
//! A failure inside one framework becomes an "Analysis error" entry in the
//! report and never stops the others.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::embedding::EmbeddingGateway;
use crate::error::{FrameworkError, InputError};
use crate::filter::{filter_findings, IssueClassifier};
use crate::models::{AggregateReport, LawFramework, LawResult, ReportEntry, Severity, Subject};
use crate::normalize::{no_evidence_result, normalize};
use crate::oracle::{ComplianceOracle, OracleParams};
use crate::prompt::{build_prompt, SubjectFocus};
use crate::retrieve::{retrieve, RetrievalParams};
use crate::store::ChunkStore;
use crate::validate::parse_verdict;

/// Frameworks evaluated at once when nothing else is configured.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// How one framework's pipeline ended.
#[derive(Debug)]
pub struct FrameworkOutcome {
    pub framework: LawFramework,
    pub result: Result<LawResult, FrameworkError>,
}

/// Every framework's outcome, in framework-list order.
#[derive(Debug)]
pub struct Evaluation {
    pub outcomes: Vec<FrameworkOutcome>,
}

impl Evaluation {
    /// Collapse the outcomes into the user-facing report.
    pub fn report(&self) -> AggregateReport {
        aggregate(&self.outcomes)
    }

    /// Mean `compliance_score` over frameworks that produced a result.
    pub fn average_compliance_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| f64::from(r.compliance_score))
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// Per-framework view for detailed output.
    pub fn law_summaries(&self) -> Vec<LawSummary<'_>> {
        self.outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(result) => LawSummary::Result(result),
                Err(e) => LawSummary::Error {
                    law: &o.framework.name,
                    error: e.to_string(),
                },
            })
            .collect()
    }
}

/// Serializable view of one framework outcome.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LawSummary<'a> {
    Result(&'a LawResult),
    Error { law: &'a str, error: String },
}

/// Build the report: one entry per finding of each non-compliant
/// framework, plus one entry per failed framework, in list order.
pub fn aggregate(outcomes: &[FrameworkOutcome]) -> AggregateReport {
    let mut report = AggregateReport::default();
    for outcome in outcomes {
        match &outcome.result {
            Ok(result) if !result.compliant() => {
                report
                    .non_compliant
                    .extend(result.findings.iter().map(ReportEntry::from));
            }
            Ok(_) => {}
            Err(e) => report.non_compliant.push(ReportEntry {
                law: outcome.framework.name.clone(),
                reason: format!("Analysis error: {}", e),
                confidence: 0.0,
                severity: Severity::High,
            }),
        }
    }
    report
}

/// Collaborators and tuning for an evaluation run.
pub struct Evaluator<'a> {
    pub gateway: &'a dyn EmbeddingGateway,
    pub store: &'a dyn ChunkStore,
    pub oracle: &'a dyn ComplianceOracle,
    pub classifier: &'a dyn IssueClassifier,
    pub retrieval: RetrievalParams,
    pub oracle_params: OracleParams,
    /// Maximum frameworks in flight at once; values below 1 count as 1.
    pub concurrency: usize,
}

impl<'a> Evaluator<'a> {
    /// Evaluate a subject against every framework.
    ///
    /// Only an unusable subject is an error. Framework failures are carried
    /// in the returned [`Evaluation`].
    pub async fn evaluate(
        &self,
        frameworks: &[LawFramework],
        subject: Subject,
    ) -> Result<Evaluation, InputError> {
        let subject = subject.validated()?;
        info!(
            frameworks = frameworks.len(),
            ingredients = subject.ingredients.len(),
            claims = subject.claims.len(),
            "starting compliance evaluation"
        );

        let subject = &subject;
        let outcomes = stream::iter(frameworks.iter().cloned())
            .map(|framework| async move {
                let result = self.evaluate_framework(&framework, subject).await;
                if let Err(e) = &result {
                    error!(law = %framework.name, error = %e, "framework evaluation failed");
                }
                FrameworkOutcome { framework, result }
            })
            .buffered(self.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        Ok(Evaluation { outcomes })
    }

    /// Run the full pipeline for one framework.
    pub async fn evaluate_framework(
        &self,
        framework: &LawFramework,
        subject: &Subject,
    ) -> Result<LawResult, FrameworkError> {
        let focus = SubjectFocus::of(subject).ok_or(InputError::EmptySubject)?;

        let evidence = retrieve(self.gateway, self.store, framework, subject, &self.retrieval).await;
        if evidence.is_empty() {
            info!(law = %framework.name, "no relevant regulatory content; defaulting to compliant");
            return Ok(no_evidence_result(framework));
        }

        let prompt = build_prompt(framework, &evidence, subject, focus);
        debug!(law = %framework.name, excerpts = evidence.len(), prompt = %prompt, "calling compliance oracle");

        let raw = self.oracle.complete(&prompt, &self.oracle_params).await?;
        debug!(law = %framework.name, response = %raw, "oracle response");

        let verdict = parse_verdict(&raw)?;
        let filtered = filter_findings(verdict.findings.clone(), subject, self.classifier);
        if filtered.removed > 0 {
            info!(law = %framework.name, removed = filtered.removed, "dropped ingredient findings from claims-only review");
        }

        Ok(normalize(framework, verdict, filtered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmbeddingError, OracleError};
    use crate::filter::KeywordClassifier;
    use crate::models::{default_frameworks, Chunk};
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    const PROP65: &str = "California Proposition 65";

    struct UnitGateway;

    #[async_trait]
    impl EmbeddingGateway for UnitGateway {
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }
    }

    /// Answers by framework: the Prop 65 reply when the prompt names it,
    /// the other reply otherwise.
    struct ScriptedOracle {
        prop65: Result<String, ()>,
        other: Result<String, ()>,
        prop65_delay: Duration,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedOracle {
        fn new(prop65: &str, other: &str) -> Self {
            Self {
                prop65: Ok(prop65.to_string()),
                other: Ok(other.to_string()),
                prop65_delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                prop65: Err(()),
                other: Err(()),
                prop65_delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ComplianceOracle for ScriptedOracle {
        fn model_name(&self) -> &str {
            "scripted"
        }
        async fn complete(&self, prompt: &str, _params: &OracleParams) -> Result<String, OracleError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = if prompt.contains(PROP65) {
                tokio::time::sleep(self.prop65_delay).await;
                &self.prop65
            } else {
                &self.other
            };
            reply.clone().map_err(|_| OracleError::Disabled)
        }
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        let rows = [
            ("prop65", "prop65_list.txt", "Benzene is known to cause cancer."),
            ("health_claims", "ftc_guidance.txt", "Disease claims require competent evidence."),
        ];
        for (i, (category, doc, text)) in rows.iter().enumerate() {
            let chunk = Chunk {
                id: format!("c{}", i),
                text: text.to_string(),
                category: category.to_string(),
                source_document: doc.to_string(),
                chunk_index: 0,
                hash: String::new(),
            };
            store.insert(&chunk, &[0.9, 0.1]).await.unwrap();
        }
        store
    }

    fn evaluator<'a>(
        store: &'a InMemoryStore,
        oracle: &'a ScriptedOracle,
        classifier: &'a KeywordClassifier,
    ) -> Evaluator<'a> {
        Evaluator {
            gateway: &UnitGateway,
            store,
            oracle,
            classifier,
            retrieval: RetrievalParams::default(),
            oracle_params: OracleParams::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    #[tokio::test]
    async fn test_benzene_is_flagged_under_prop65() {
        let store = seeded_store().await;
        let oracle = ScriptedOracle::new(
            r#"{"issues": ["Benzene is listed as a carcinogen and requires a warning"],
                "severities": ["critical"], "fixes": ["Add a Prop 65 warning"],
                "confidence": 0.9, "compliance_score": 20}"#,
            r#"{"issues": [], "confidence": 0.7, "compliance_score": 95}"#,
        );
        let classifier = KeywordClassifier::new();
        let eval = evaluator(&store, &oracle, &classifier)
            .evaluate(&default_frameworks(), Subject::new(vec!["benzene".into()], vec![]))
            .await
            .unwrap();

        let report = eval.report();
        assert_eq!(report.non_compliant.len(), 1);
        assert_eq!(report.non_compliant[0].law, PROP65);
        assert!(report.non_compliant[0].severity >= Severity::High);
        assert_eq!(eval.average_compliance_score(), Some(57.5));
    }

    #[tokio::test]
    async fn test_claims_only_drops_ingredient_findings() {
        let store = seeded_store().await;
        let reply = r#"```json
{"issues": ["'Heals acne fast' is a drug claim", "Concentration of actives is not disclosed"],
 "severities": ["high", "medium"], "confidence": 0.8, "compliance_score": 30}
```"#;
        let oracle = ScriptedOracle::new(reply, reply);
        let classifier = KeywordClassifier::new();
        let subject = Subject::new(vec![], vec!["Heals acne fast and reduces inflammation".into()]);
        let eval = evaluator(&store, &oracle, &classifier)
            .evaluate(&default_frameworks(), subject)
            .await
            .unwrap();

        let prompts = oracle.prompts.lock().unwrap();
        assert!(prompts.iter().all(|p| p.contains("Ignore ingredients entirely")));

        let report = eval.report();
        assert_eq!(report.non_compliant.len(), 2);
        assert!(report
            .non_compliant
            .iter()
            .all(|e| !e.reason.contains("Concentration") && e.severity == Severity::High));
    }

    #[tokio::test]
    async fn test_no_evidence_defaults_to_compliant() {
        let store = InMemoryStore::new();
        let oracle = ScriptedOracle::failing();
        let classifier = KeywordClassifier::new();
        let eval = evaluator(&store, &oracle, &classifier)
            .evaluate(&default_frameworks(), Subject::new(vec!["water".into()], vec![]))
            .await
            .unwrap();

        assert!(eval.report().non_compliant.is_empty());
        assert!(oracle.prompts.lock().unwrap().is_empty());
        for outcome in &eval.outcomes {
            let result = outcome.result.as_ref().unwrap();
            assert!(result.compliant());
            assert_eq!(result.compliance_score, 50);
        }
    }

    #[tokio::test]
    async fn test_every_framework_failing_keeps_report_shape() {
        let store = seeded_store().await;
        let oracle = ScriptedOracle::failing();
        let classifier = KeywordClassifier::new();
        let frameworks = default_frameworks();
        let eval = evaluator(&store, &oracle, &classifier)
            .evaluate(&frameworks, Subject::new(vec!["benzene".into()], vec![]))
            .await
            .unwrap();

        let report = eval.report();
        let laws: Vec<&str> = report.non_compliant.iter().map(|e| e.law.as_str()).collect();
        let expected: Vec<&str> = frameworks.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(laws, expected);
        assert!(report
            .non_compliant
            .iter()
            .all(|e| e.reason.starts_with("Analysis error: ")));
        assert_eq!(eval.average_compliance_score(), None);
    }

    #[tokio::test]
    async fn test_malformed_verdict_is_an_analysis_error() {
        let store = seeded_store().await;
        let oracle = ScriptedOracle::new(
            "I think this is fine.",
            r#"{"issues": [], "compliance_score": 90}"#,
        );
        let classifier = KeywordClassifier::new();
        let eval = evaluator(&store, &oracle, &classifier)
            .evaluate(&default_frameworks(), Subject::new(vec!["benzene".into()], vec![]))
            .await
            .unwrap();

        let report = eval.report();
        assert_eq!(report.non_compliant.len(), 1);
        assert_eq!(report.non_compliant[0].law, PROP65);
        assert!(report.non_compliant[0].reason.contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_report_order_follows_framework_list() {
        let store = seeded_store().await;
        let mut oracle = ScriptedOracle::new(
            r#"{"issues": ["Benzene needs a warning"], "severities": ["high"]}"#,
            r#"{"issues": ["Benzene claim is unsupported"], "severities": ["medium"]}"#,
        );
        oracle.prop65_delay = Duration::from_millis(50);
        let classifier = KeywordClassifier::new();
        let eval = evaluator(&store, &oracle, &classifier)
            .evaluate(&default_frameworks(), Subject::new(vec!["benzene".into()], vec![]))
            .await
            .unwrap();

        let laws: Vec<String> = eval.report().non_compliant.into_iter().map(|e| e.law).collect();
        assert_eq!(laws[0], PROP65);
        assert_eq!(laws[1], "FTC Health Products Compliance Guidance");
    }

    #[tokio::test]
    async fn test_empty_subject_is_rejected() {
        let store = InMemoryStore::new();
        let oracle = ScriptedOracle::failing();
        let classifier = KeywordClassifier::new();
        let err = evaluator(&store, &oracle, &classifier)
            .evaluate(&default_frameworks(), Subject::new(vec!["  ".into()], vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, InputError::EmptySubject);
    }

    #[test]
    fn test_compliant_results_are_left_out_of_report() {
        let ok = FrameworkOutcome {
            framework: LawFramework::new("A", "a"),
            result: Ok(no_evidence_result(&LawFramework::new("A", "a"))),
        };
        assert!(aggregate(&[ok]).non_compliant.is_empty());
    }
}
