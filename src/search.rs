//! Ad-hoc similarity search over the law corpus.

use anyhow::Result;

use label_lens_core::models::RetrievalResult;
use label_lens_core::store::{ChunkStore, VectorQuery};

use crate::config::Config;
use crate::embedding::create_gateway;
use crate::sqlite_store::SqliteStore;

const EXCERPT_CHARS: usize = 240;

/// Embed `query` and return matching chunks above the configured threshold.
pub async fn search_corpus(
    config: &Config,
    query: &str,
    category: Option<&str>,
    limit: usize,
) -> Result<Vec<RetrievalResult>> {
    let gateway = create_gateway(&config.embedding)?;
    let embedding = gateway.embed(query).await?;
    let store = SqliteStore::open(config).await?;
    let results = store
        .query(&VectorQuery {
            embedding: &embedding,
            category,
            limit,
            threshold: config.retrieval.threshold,
        })
        .await?;
    store.pool().close().await;
    Ok(results)
}

/// `lens search` entry point.
pub async fn run_search(
    config: &Config,
    query: &str,
    category: Option<&str>,
    limit: usize,
) -> Result<()> {
    let results = search_corpus(config, query, category, limit).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let category = result
            .metadata
            .get("category")
            .and_then(|c| c.as_str())
            .unwrap_or("-");
        println!(
            "{}. [{:.3}] {} ({})",
            i + 1,
            result.similarity,
            result.source_document,
            category
        );
        let excerpt: String = result
            .chunk_text
            .replace('\n', " ")
            .chars()
            .take(EXCERPT_CHARS)
            .collect();
        println!("    excerpt: \"{}\"", excerpt.trim());
        println!();
    }
    Ok(())
}
