//! # vibcheck
//!
//! A Rust web service that validates free-text product ideas for
//! non-developers by gathering evidence from GitHub and web search, ranking
//! it, and streaming an LLM-written feasibility report over SSE.
//!
//! ## Architecture
//!
//! The analysis pipeline:
//!
//! ```text
//!                       ┌──────────────┐
//!                       │  User Idea   │
//!                       └──────┬───────┘
//!                              │
//!                              ▼
//!                  ┌───────────────────────┐
//!                  │  Classify (fast LLM)  │
//!                  │ SEARCHABLE/IMPOSSIBLE │
//!                  │  /AMBIGUOUS + queries │
//!                  └───────────┬───────────┘
//!                              │ IMPOSSIBLE skips search
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!     ┌──────────────────┐          ┌──────────────────┐
//!     │  GitHub Search   │          │   Web Search     │
//!     │ strict tier, then│          │ 3-4 categories   │
//!     │ broad fallback   │          │ concurrently     │
//!     │ → signal + repos │          │ → scored sources │
//!     └────────┬─────────┘          └────────┬─────────┘
//!              └──────────────┬──────────────┘
//!                             ▼
//!                 ┌───────────────────────┐
//!                 │    Ranking Engine     │
//!                 │ weighted multi-factor │
//!                 │ + multi-query boost   │
//!                 │ → evidence digest     │
//!                 └───────────┬───────────┘
//!                             ▼
//!                 ┌───────────────────────┐
//!                 │  Report (chat LLM)    │
//!                 │  streamed as deltas,  │
//!                 │  parsed server-side   │
//!                 └───────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, search APIs, and LLM settings
//! - [`models`] - Shared data types: `GithubRepo`, `WebResult`, `KeywordExtraction`, signals
//! - [`fetch`] - HTTP retry layer with exponential backoff and per-attempt timeouts
//! - [`cache`] - Bounded TTL caches and deterministic cache key derivation
//! - [`search::github`] - Tiered repository search with README/activity enrichment
//! - [`search::web`] - Per-category web evidence aggregation with dedup and filtering
//! - [`rank`] - Signal-dependent weighted scoring and prompt digest assembly
//! - [`llm::classify`] - Idea classification and query extraction via the fast model
//! - [`llm::report_stream`] - Streaming report generation via Ollama or OpenAI-compatible APIs
//! - [`sse`] - Wire envelope for the event stream, `[DONE]`-terminated
//! - [`report`] - Markdown report sectioning and verdict/confidence extraction
//! - [`prompts`] - Korean report prompt templates
//! - [`fixtures`] - Deterministic fallbacks when the LLM is unavailable
//! - [`api`] - Axum HTTP handler for the analysis endpoint
//! - [`state`] - Shared application state: HTTP client, caches, concurrency limits

pub mod api;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod fixtures;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod rank;
pub mod report;
pub mod search;
pub mod sse;
pub mod state;
