//! nytimes-mcp: MCP server for New York Times article search
//!
//! This library exposes a single tool, `search_articles`, that searches the
//! NYTimes Article Search API for a keyword over the last 30 days and returns
//! a compact summary of each match.
//!
//! # Architecture
//!
//! - **Tool registry**: declares `search_articles` and validates its arguments
//! - **Dispatcher**: runs tool calls and keeps protocol errors (bad requests)
//!   apart from tool errors (upstream failures)
//! - **Upstream client**: one `GET articlesearch.json` per call, no retries
//! - **Normaliser**: maps rich upstream documents to `ArticleSummary`
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and the API key
//! - [`error`]: Error types
//! - [`mcp`]: MCP protocol implementation
//! - [`nytimes`]: Article Search API client and data model

pub mod config;
pub mod error;
pub mod mcp;
pub mod nytimes;
