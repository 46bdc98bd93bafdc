//! New York Times Article Search API integration.
//!
//! - [`client`]: HTTP client and the [`ArticleSource`] seam
//! - [`models`]: upstream response schema and [`ArticleSummary`]
//! - [`normalize`]: upstream document to summary mapping
//! - [`window`]: the trailing 30-day search window

pub mod client;
pub mod models;
pub mod normalize;
pub mod window;

pub use client::{ArticleSource, NyTimesClient, SearchQuery};
pub use models::{ArticleSummary, UpstreamArticle};
pub use normalize::{normalize, normalize_all, UNKNOWN_AUTHOR};
pub use window::DateWindow;
