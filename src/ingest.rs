//! Law corpus ingestion.
//!
//! Reads plain-text law documents, strips page-footer artifacts, cuts them
//! into overlapping word windows, embeds each window, and writes it to the
//! chunk store under one retrieval category.
//!
//! There is no deduplication key: ingesting the same document twice stores
//! its chunks twice. Use `--replace` to clear the corpus first.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};
use walkdir::WalkDir;

use label_lens_core::chunk::chunk_document;
use label_lens_core::embedding::EmbeddingGateway;
use label_lens_core::models::Chunk;
use label_lens_core::store::{ingest, ChunkStore};

use crate::config::{ChunkingConfig, Config};
use crate::embedding::create_gateway;
use crate::sqlite_store::SqliteStore;

const INCLUDE_GLOB: &str = "**/*.txt";

/// Per-run ingestion switches from the CLI.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub category: String,
    /// Delete every stored chunk before writing.
    pub replace: bool,
    /// Chunk and count only; nothing is embedded or written.
    pub dry_run: bool,
}

/// A law document ready to be embedded.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    /// Path relative to the ingest root (the file name for a single file).
    pub source_document: String,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub files: usize,
    pub chunks: usize,
    pub written: usize,
    pub failed: usize,
    pub cleared: u64,
}

fn page_artifact() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Page +\d+ +/ +\d+").expect("page artifact pattern is valid"))
}

/// Remove `Page N / M` footer artifacts left by PDF-to-text conversion.
pub fn strip_page_artifacts(text: &str) -> String {
    page_artifact().replace_all(text, "").into_owned()
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Resolve `path` into `(file, source_document)` pairs, sorted by source.
pub fn discover_files(path: &Path) -> Result<Vec<(PathBuf, String)>> {
    if !path.exists() {
        bail!("Ingest path does not exist: {}", path.display());
    }

    if path.is_file() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        return Ok(vec![(path.to_path_buf(), name)]);
    }

    let include_set = build_globset(&[INCLUDE_GLOB])?;
    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file = entry.path();
        let relative = file.strip_prefix(path).unwrap_or(file);
        let rel_str = relative.to_string_lossy().to_string();
        if !include_set.is_match(&rel_str) {
            continue;
        }
        files.push((file.to_path_buf(), rel_str));
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

/// Read, clean, and chunk every document under `path`.
pub fn prepare(path: &Path, category: &str, chunking: &ChunkingConfig) -> Result<Vec<PreparedDocument>> {
    let mut documents = Vec::new();
    for (file, source_document) in discover_files(path)? {
        let raw = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let text = strip_page_artifacts(&raw);
        let chunks = chunk_document(
            &source_document,
            category,
            &text,
            chunking.size_words,
            chunking.overlap_words,
        )?;
        documents.push(PreparedDocument {
            source_document,
            chunks,
        });
    }
    Ok(documents)
}

/// Embed and store prepared documents. Per-chunk failures are logged and
/// counted.
pub async fn write_documents<S: ChunkStore + ?Sized>(
    store: &S,
    gateway: &dyn EmbeddingGateway,
    documents: &[PreparedDocument],
    replace: bool,
) -> Result<IngestSummary> {
    let mut summary = IngestSummary {
        files: documents.len(),
        chunks: documents.iter().map(|d| d.chunks.len()).sum(),
        ..IngestSummary::default()
    };

    if replace {
        summary.cleared = store.clear().await?;
        info!(removed = summary.cleared, "cleared existing law chunks");
    }

    for document in documents {
        for chunk in &document.chunks {
            match ingest(store, gateway, chunk).await {
                Ok(()) => summary.written += 1,
                Err(e) => {
                    warn!(
                        source = %chunk.source_document,
                        chunk_index = chunk.chunk_index,
                        error = %e,
                        "failed to ingest chunk"
                    );
                    summary.failed += 1;
                }
            }
        }
        info!(source = %document.source_document, chunks = document.chunks.len(), "ingested document");
    }

    Ok(summary)
}

/// `lens ingest` entry point.
pub async fn run_ingest(config: &Config, path: &Path, options: &IngestOptions) -> Result<()> {
    if options.category.trim().is_empty() {
        bail!("--category must not be empty");
    }
    let documents = prepare(path, &options.category, &config.chunking)?;

    if options.dry_run {
        let chunks: usize = documents.iter().map(|d| d.chunks.len()).sum();
        println!("ingest {} (dry-run)", path.display());
        println!("  files found: {}", documents.len());
        println!("  estimated chunks: {}", chunks);
        return Ok(());
    }

    let gateway = create_gateway(&config.embedding)?;
    let store = SqliteStore::open(config).await?;
    let summary = write_documents(&store, gateway.as_ref(), &documents, options.replace).await?;

    println!("ingest {}", path.display());
    println!("  category: {}", options.category);
    println!("  files: {}", summary.files);
    if options.replace {
        println!("  chunks cleared: {}", summary.cleared);
    }
    println!("  chunks written: {}", summary.written);
    if summary.failed > 0 {
        println!("  chunks failed: {}", summary.failed);
    }
    for (category, count) in store.category_counts().await? {
        println!("  stored [{}]: {}", category, count);
    }
    println!("ok");
    Ok(())
}
