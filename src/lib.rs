//! # RAG Context
//!
//! A retrieval-augmented-generation context engine: an in-memory knowledge
//! store, lexical retrieval over it, and formatting of retrieval results
//! into a context block for a downstream language-model prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ add/submit   │──▶│ Indexing task│──▶│  Document    │
//! │ (CLI / HTTP) │   │ timeout+abort│   │  Store       │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │
//!                     ┌────────────────────────┤
//!                     ▼                        ▼
//!              ┌──────────────┐        ┌──────────────┐
//!              │  Retriever   │──────▶ │   Prompt     │
//!              │  (lexical)   │        │   Template   │
//!              └──────────────┘        └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ragctx documents                          # list seeded documents
//! ragctx search "product features"          # ranked results
//! ragctx context "product features"         # formatted prompt block
//! ragctx --config ./config/ragctx.toml serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`knowledge`] | Knowledge base service and indexing tasks |
//! | [`indexer`] | Built-in indexer implementations |
//! | [`seed`] | Startup fixtures and seed files |
//! | [`server`] | JSON HTTP server |
//!
//! Data model, store and retriever traits, scoring, and prompt formatting
//! live in the `rag-context-core` crate.

pub mod config;
pub mod indexer;
pub mod knowledge;
pub mod logging;
pub mod seed;
pub mod server;
