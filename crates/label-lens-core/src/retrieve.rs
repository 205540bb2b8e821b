//! Evidence retrieval for one law framework.
//!
//! A handful of query strings are derived from the subject (generic
//! prohibitions, watch-listed ingredients, individual claims), at most
//! [`RetrievalParams::max_queries`] of them are embedded and searched, and
//! the hits are merged into an [`EvidenceSet`]: one excerpt per source
//! document, capped at [`RetrievalParams::evidence_cap`].
//!
//! Queries run concurrently; the merge walks their results in query order,
//! so the evidence is the same as running them one after another and
//! stopping once the cap is reached.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::embedding::EmbeddingGateway;
use crate::models::{LawFramework, RetrievalResult, Subject};
use crate::store::{ChunkStore, VectorQuery, DEFAULT_THRESHOLD};

/// Known-hazardous substances that get a dedicated retrieval query.
pub const HIGH_RISK_WATCHLIST: &[&str] = &[
    "benzene",
    "formaldehyde",
    "lead",
    "mercury",
    "paraben",
    "phthalate",
    "triclosan",
    "hydroquinone",
    "toluene",
    "coal tar",
    "1,4-dioxane",
    "oxybenzone",
];

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    /// Exclusive similarity floor.
    pub threshold: f64,
    /// Rows requested from the store per query.
    pub per_query_limit: usize,
    /// Queries actually issued per framework.
    pub max_queries: usize,
    /// Maximum evidence excerpts per framework.
    pub evidence_cap: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            per_query_limit: 5,
            max_queries: 4,
            evidence_cap: 8,
        }
    }
}

/// Deduplicated, capped evidence for one framework judgment.
///
/// No two members share a `source_document`, and the length never exceeds
/// the cap given at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceSet {
    items: Vec<RetrievalResult>,
    seen: HashSet<String>,
    cap: usize,
}

impl EvidenceSet {
    pub fn new(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            cap,
        }
    }

    /// Add a result. Returns `false` if the set is full or the source
    /// document is already represented.
    pub fn push(&mut self, result: RetrievalResult) -> bool {
        if self.is_full() || self.seen.contains(&result.source_document) {
            return false;
        }
        self.seen.insert(result.source_document.clone());
        self.items.push(result);
        true
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn items(&self) -> &[RetrievalResult] {
        &self.items
    }
}

fn on_watchlist(ingredient: &str) -> bool {
    let lower = ingredient.to_lowercase();
    HIGH_RISK_WATCHLIST.iter().any(|term| lower.contains(term))
}

/// Derive the ordered query strings for one framework, before capping.
pub fn build_queries(framework: &LawFramework, subject: &Subject) -> Vec<String> {
    let mut queries = Vec::new();
    if subject.has_ingredients() {
        queries.push(format!("{} prohibited substances", framework.name));
    }
    if subject.has_claims() {
        queries.push(format!("{} prohibited claims", framework.name));
    }
    for ingredient in subject.ingredients.iter().filter(|i| on_watchlist(i)) {
        queries.push(format!("{} toxicity warning and labeling requirements", ingredient));
    }
    for claim in &subject.claims {
        queries.push(format!("restrictions on the marketing claim: {}", claim));
    }

    let mut seen = HashSet::new();
    queries.retain(|q| seen.insert(q.to_lowercase()));
    queries
}

async fn run_query<S: ChunkStore + ?Sized>(
    gateway: &dyn EmbeddingGateway,
    store: &S,
    framework: &LawFramework,
    query: &str,
    params: &RetrievalParams,
) -> Vec<RetrievalResult> {
    let embedding = match gateway.embed(query).await {
        Ok(v) => v,
        Err(e) => {
            warn!(law = %framework.name, query, error = %e, "query embedding failed; treating as no evidence");
            return Vec::new();
        }
    };
    let request = VectorQuery {
        embedding: &embedding,
        category: Some(&framework.category),
        limit: params.per_query_limit,
        threshold: params.threshold,
    };
    match store.query(&request).await {
        Ok(rows) => {
            debug!(law = %framework.name, query, hits = rows.len(), "retrieval query finished");
            rows
        }
        Err(e) => {
            warn!(law = %framework.name, query, error = %e, "chunk store query failed; treating as no evidence");
            Vec::new()
        }
    }
}

/// Build the evidence set for one framework.
///
/// Embedding and store failures are logged and count as "no hits" for the
/// affected query. An empty set is a valid outcome, not an error.
pub async fn retrieve<S: ChunkStore + ?Sized>(
    gateway: &dyn EmbeddingGateway,
    store: &S,
    framework: &LawFramework,
    subject: &Subject,
    params: &RetrievalParams,
) -> EvidenceSet {
    let mut queries = build_queries(framework, subject);
    queries.truncate(params.max_queries);

    let batches = join_all(
        queries
            .iter()
            .map(|q| run_query(gateway, store, framework, q, params)),
    )
    .await;

    merge_batches(batches, params)
}

/// Fold per-query hits, in query order, into a capped evidence set.
pub fn merge_batches(batches: Vec<Vec<RetrievalResult>>, params: &RetrievalParams) -> EvidenceSet {
    let mut evidence = EvidenceSet::new(params.evidence_cap);
    for result in batches.into_iter().flatten() {
        if evidence.is_full() {
            break;
        }
        if result.similarity > params.threshold {
            evidence.push(result);
        }
    }
    evidence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::models::Chunk;
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::Mutex;

    /// Maps any text to a fixed vector, recording the texts it saw.
    struct FixedGateway {
        vector: Vec<f32>,
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FixedGateway {
        fn new(vector: Vec<f32>) -> Self {
            Self {
                vector,
                seen: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl EmbeddingGateway for FixedGateway {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> usize {
            self.vector.len()
        }
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.seen.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(EmbeddingError::Request("offline".into()));
            }
            Ok(self.vector.clone())
        }
    }

    fn hit(doc: &str, similarity: f64) -> RetrievalResult {
        RetrievalResult {
            chunk_text: format!("excerpt from {}", doc),
            metadata: serde_json::json!({}),
            source_document: doc.to_string(),
            similarity,
        }
    }

    fn prop65() -> LawFramework {
        LawFramework::new("California Proposition 65", "prop65")
    }

    #[test]
    fn test_queries_for_watchlisted_ingredients() {
        let subject = Subject::new(vec!["Water".into(), "Benzene".into()], vec![]);
        let queries = build_queries(&prop65(), &subject);
        assert_eq!(queries.len(), 2);
        assert!(queries[0].contains("prohibited substances"));
        assert!(queries[1].starts_with("Benzene"));
    }

    #[test]
    fn test_queries_for_claims() {
        let subject = Subject::new(vec![], vec!["Heals acne fast".into()]);
        let queries = build_queries(&prop65(), &subject);
        assert_eq!(queries.len(), 2);
        assert!(queries[0].contains("prohibited claims"));
        assert!(queries[1].contains("Heals acne fast"));
    }

    #[test]
    fn test_evidence_set_dedups_by_document() {
        let mut set = EvidenceSet::new(8);
        assert!(set.push(hit("d1", 0.9)));
        assert!(!set.push(hit("d1", 0.8)));
        assert!(set.push(hit("d2", 0.7)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_merge_stops_at_cap_mid_batch() {
        let params = RetrievalParams {
            evidence_cap: 3,
            ..RetrievalParams::default()
        };
        let batches = vec![
            vec![hit("d1", 0.9), hit("d2", 0.8)],
            vec![hit("d2", 0.95), hit("d3", 0.7), hit("d4", 0.6)],
            vec![hit("d5", 0.99)],
        ];
        let evidence = merge_batches(batches, &params);
        let docs: Vec<&str> = evidence
            .items()
            .iter()
            .map(|r| r.source_document.as_str())
            .collect();
        assert_eq!(docs, vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn test_merge_invariants_hold_for_many_batches() {
        let params = RetrievalParams::default();
        let batches: Vec<Vec<RetrievalResult>> = (0..6)
            .map(|q| {
                (0..5)
                    .map(|i| hit(&format!("d{}", (q * 3 + i) % 7), 0.31 + i as f64 / 10.0))
                    .collect()
            })
            .collect();
        let evidence = merge_batches(batches, &params);
        assert!(evidence.len() <= params.evidence_cap);
        let docs: HashSet<&str> = evidence
            .items()
            .iter()
            .map(|r| r.source_document.as_str())
            .collect();
        assert_eq!(docs.len(), evidence.len());
        assert!(evidence.items().iter().all(|r| r.similarity > params.threshold));
    }

    #[tokio::test]
    async fn test_retrieve_caps_issued_queries() {
        let gateway = FixedGateway::new(vec![1.0, 0.0]);
        let store = InMemoryStore::new();
        let subject = Subject::new(
            vec!["benzene".into(), "lead acetate".into(), "mercury".into()],
            vec!["Heals acne".into(), "Prevents wrinkles".into()],
        );
        let evidence = retrieve(&gateway, &store, &prop65(), &subject, &RetrievalParams::default()).await;
        assert!(evidence.is_empty());
        assert_eq!(gateway.seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_retrieve_filters_by_category() {
        let gateway = FixedGateway::new(vec![1.0, 0.0]);
        let store = InMemoryStore::new();
        for (i, (category, doc)) in [("prop65", "p1"), ("prop65", "p2"), ("health_claims", "h1")]
            .iter()
            .enumerate()
        {
            let chunk = Chunk {
                id: format!("c{}", i),
                text: format!("law text {}", i),
                category: category.to_string(),
                source_document: doc.to_string(),
                chunk_index: 0,
                hash: String::new(),
            };
            store.insert(&chunk, &[1.0, 0.1]).await.unwrap();
        }
        let subject = Subject::new(vec!["benzene".into()], vec![]);
        let evidence = retrieve(&gateway, &store, &prop65(), &subject, &RetrievalParams::default()).await;
        assert_eq!(evidence.len(), 2);
        assert!(evidence
            .items()
            .iter()
            .all(|r| r.source_document.starts_with('p')));
    }

    #[tokio::test]
    async fn test_retrieve_survives_gateway_failure() {
        let mut gateway = FixedGateway::new(vec![1.0, 0.0]);
        gateway.fail = true;
        let store = InMemoryStore::new();
        let subject = Subject::new(vec!["benzene".into()], vec![]);
        let evidence = retrieve(&gateway, &store, &prop65(), &subject, &RetrievalParams::default()).await;
        assert!(evidence.is_empty());
    }

    fn arb_hit() -> impl Strategy<Value = RetrievalResult> {
        (0u8..12, -1.0f64..1.0).prop_map(|(doc, sim)| hit(&format!("d{}", doc), sim))
    }

    proptest! {
        #[test]
        fn proptest_merge_is_deduped_capped_and_above_threshold(
            batches in prop::collection::vec(prop::collection::vec(arb_hit(), 0..8), 0..6),
            evidence_cap in 0usize..10,
            threshold in -0.5f64..0.9,
        ) {
            let params = RetrievalParams {
                threshold,
                evidence_cap,
                ..RetrievalParams::default()
            };
            let evidence = merge_batches(batches.clone(), &params);

            prop_assert!(evidence.len() <= evidence_cap);
            let docs: HashSet<&str> = evidence
                .items()
                .iter()
                .map(|r| r.source_document.as_str())
                .collect();
            prop_assert_eq!(docs.len(), evidence.len());
            prop_assert!(evidence.items().iter().all(|r| r.similarity > threshold));

            // Same outcome as feeding the hits one at a time in query order.
            let mut sequential = EvidenceSet::new(evidence_cap);
            for r in batches.into_iter().flatten().filter(|r| r.similarity > threshold) {
                sequential.push(r);
            }
            prop_assert_eq!(evidence.items(), sequential.items());
        }
    }
}
