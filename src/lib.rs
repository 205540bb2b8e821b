//! # Label Lens
//!
//! Retrieval-grounded compliance checks for cosmetic ingredients and
//! marketing claims.
//!
//! Law documents are chunked, embedded, and stored in SQLite. At check time
//! each configured law framework retrieves its most relevant excerpts, a
//! reasoning model judges the product against them, and the judgments are
//! validated, filtered, and merged into one report.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  Law texts  │──▶│ Chunk+Embed │──▶│    SQLite    │
//! │   (.txt)    │   │  (ingest)   │   │  law_chunks  │
//! └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                            │
//!                  ┌─────────────────────────┤
//!                  ▼                         ▼
//!            ┌──────────┐          ┌──────────────────┐
//!            │  search  │          │ check (per law:  │
//!            │          │          │ retrieve → judge)│
//!            └──────────┘          └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lens init                                         # create database
//! lens ingest law_docs/prop65 --category prop65     # ingest a corpus
//! lens search "benzene warning" --category prop65
//! echo '{"ingredients": ["benzene"]}' | lens check
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite chunk store |
//! | [`embedding`] | Embedding gateways |
//! | [`oracle`] | Reasoning-model clients |
//! | [`retry`] | Backoff for hosted APIs |
//! | [`ingest`] | Law corpus ingestion |
//! | [`prop65`] | Prop 65 chemical list parser |
//! | [`search`] | Ad-hoc corpus search |
//! | [`check`] | Compliance evaluation command |
//! | [`logging`] | stderr tracing setup |

pub mod check;
pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod oracle;
pub mod prop65;
pub mod retry;
pub mod search;
pub mod sqlite_store;
