//! Request handling behind the JSON-RPC layer.
//!
//! The [`Dispatcher`] owns no mutable state: it is built once with an
//! [`ArticleSource`] and shared across concurrently running requests.
//!
//! Failures take one of two channels, kept apart by [`ToolOutcome`]:
//!
//! - **Protocol errors** (unknown tool, bad arguments, unknown resource,
//!   internal faults) abort the request with a JSON-RPC error.
//! - **Tool errors** (the upstream API failed or was unreachable) are a
//!   successful JSON-RPC response whose result is flagged `isError`.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::mcp::protocol::ErrorCode;
use crate::mcp::tools::{self, ToolDescriptor, SEARCH_ARTICLES};
use crate::nytimes::window::{utc_today, DateWindow};
use crate::nytimes::{normalize_all, ArticleSource, SearchQuery};

/// Prefix of every tool-level upstream error message.
pub const UPSTREAM_ERROR_PREFIX: &str = "NYTimes API error";

/// A request-aborting error reported to the host as JSON-RPC `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// JSON-RPC error code.
    pub code: ErrorCode,
    /// Error message.
    pub message: String,
}

impl ProtocolError {
    /// Creates a protocol error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Outcome of a `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The tool ran; text payload for the host.
    Content(String),
    /// The tool ran but the upstream failed; readable explanation.
    ToolError(String),
    /// The call itself was rejected.
    ProtocolError(ProtocolError),
}

impl ToolOutcome {
    /// Splits into the JSON-RPC result or error channel.
    ///
    /// # Errors
    ///
    /// Returns the [`ProtocolError`] for [`ToolOutcome::ProtocolError`].
    pub fn into_result(self) -> Result<ToolCallResult, ProtocolError> {
        match self {
            Self::Content(text) => Ok(ToolCallResult::text(text)),
            Self::ToolError(message) => Ok(ToolCallResult::error(message)),
            Self::ProtocolError(error) => Err(error),
        }
    }
}

/// Content item in a tool call response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Handles tool and resource requests.
#[derive(Clone)]
pub struct Dispatcher {
    source: Arc<dyn ArticleSource>,
    today: fn() -> NaiveDate,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher searching through `source`, using the UTC date.
    #[must_use]
    pub fn new(source: Arc<dyn ArticleSource>) -> Self {
        Self {
            source,
            today: utc_today,
        }
    }

    /// Replaces the clock used to compute the search window.
    #[must_use]
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Lists the registered tools.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        tools::list_tools()
    }

    /// Lists browsable resources. There are none.
    #[must_use]
    pub fn list_resources(&self) -> Vec<Value> {
        Vec::new()
    }

    /// Reads a resource. Always fails since none exist.
    ///
    /// # Errors
    ///
    /// Always returns an `InvalidRequest` [`ProtocolError`].
    pub fn read_resource(&self, uri: &str) -> Result<Value, ProtocolError> {
        Err(ProtocolError::new(
            ErrorCode::InvalidRequest,
            format!("Unknown resource: {uri}"),
        ))
    }

    /// Runs tool `name` with raw host arguments.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> ToolOutcome {
        match name {
            SEARCH_ARTICLES => self.search_articles(arguments).await,
            _ => ToolOutcome::ProtocolError(ProtocolError::new(
                ErrorCode::MethodNotFound,
                format!("Unknown tool: {name}"),
            )),
        }
    }

    async fn search_articles(&self, arguments: &Value) -> ToolOutcome {
        let request = match tools::validate_search_args(arguments) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected search arguments");
                return ToolOutcome::ProtocolError(ProtocolError::new(
                    ErrorCode::InvalidParams,
                    "Invalid search arguments",
                ));
            }
        };

        let query = SearchQuery {
            keyword: request.keyword,
            window: DateWindow::ending_on((self.today)()),
        };

        tracing::info!(keyword = %query.keyword, "Calling search_articles");

        let articles = match self.source.search(&query).await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(status = ?e.status, error = %e, "Upstream search failed");
                return ToolOutcome::ToolError(format!("{UPSTREAM_ERROR_PREFIX}: {e}"));
            }
        };

        let summaries = normalize_all(&articles);
        match serde_json::to_string_pretty(&summaries) {
            Ok(text) => ToolOutcome::Content(text),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialise article summaries");
                ToolOutcome::ProtocolError(ProtocolError::new(
                    ErrorCode::InternalError,
                    "Internal error: failed to serialise result",
                ))
            }
        }
    }
}
