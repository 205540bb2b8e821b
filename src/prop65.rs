//! Parser for the plain-text California Proposition 65 chemical list.
//!
//! The list is published as a PDF; after text extraction each chemical is a
//! run of lines: the chemical name, one line per toxicity type, its CAS
//! number, and the date it was listed. Page headers and column titles are
//! noise and skipped.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::path::Path;

/// One listed chemical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Prop65Entry {
    pub chemical: String,
    pub toxicity: Vec<String>,
    pub cas: Option<String>,
    pub date_listed: Option<String>,
}

const TOXICITY_TERMS: &[&str] = &["cancer", "developmental", "reproductive", "male", "female"];

const NOISE: &[&str] = &[
    "state of california",
    "environmental protection agency",
    "office of environmental health hazard assessment",
    "chemical",
    "cas",
    "date listed",
    "the office",
];

struct LineKind {
    cas: Regex,
    date: Regex,
}

enum Line<'a> {
    Noise,
    Toxicity(String),
    Cas(&'a str),
    Date(&'a str),
    Name(&'a str),
}

impl LineKind {
    fn new() -> Self {
        Self {
            cas: Regex::new(r"^\d{2,7}-\d{2}-\d$").expect("CAS pattern is valid"),
            date: Regex::new(r"^[A-Z][a-z]+ \d{1,2}, \d{4}$").expect("date pattern is valid"),
        }
    }

    fn classify<'a>(&self, line: &'a str) -> Line<'a> {
        let lower = line.to_lowercase();
        if NOISE.iter().any(|kw| lower.contains(kw)) {
            Line::Noise
        } else if TOXICITY_TERMS.contains(&lower.as_str()) {
            Line::Toxicity(lower)
        } else if self.cas.is_match(line) {
            Line::Cas(line)
        } else if self.date.is_match(line) {
            Line::Date(line)
        } else {
            Line::Name(line)
        }
    }
}

/// Parse list text into entries, in list order.
///
/// Toxicity, CAS, and date lines seen before the first chemical name are
/// attached to that first entry.
pub fn parse_list(text: &str) -> Vec<Prop65Entry> {
    let kinds = LineKind::new();
    let mut entries = Vec::new();
    let mut current = Prop65Entry::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match kinds.classify(line) {
            Line::Noise => {}
            Line::Toxicity(t) => current.toxicity.push(t),
            Line::Cas(cas) => current.cas = Some(cas.to_string()),
            Line::Date(date) => current.date_listed = Some(date.to_string()),
            Line::Name(name) => {
                if !current.chemical.is_empty() {
                    entries.push(std::mem::take(&mut current));
                }
                current.chemical = name.to_string();
            }
        }
    }
    if !current.chemical.is_empty() {
        entries.push(current);
    }
    entries
}

/// `lens prop65` entry point: print the parsed list as JSON.
pub fn run_prop65(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries = parse_list(&text);
    tracing::info!(entries = entries.len(), "parsed Proposition 65 list");
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
