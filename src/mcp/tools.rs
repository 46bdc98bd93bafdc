//! Tool registry: declared tools and their argument validation.
//!
//! Each tool pairs a JSON Schema advertised through `tools/list` with a pure
//! validation function that turns raw host arguments into a typed request.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ArgumentError;

/// Name of the article search tool.
pub const SEARCH_ARTICLES: &str = "search_articles";

/// A tool definition for the `tools/list` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Returns every tool this server exposes.
#[must_use]
pub fn list_tools() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: SEARCH_ARTICLES.to_string(),
        description: "Search NYTimes articles from the last 30 days based on a keyword"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "keyword": {
                    "type": "string",
                    "description": "Keyword to search for in articles"
                }
            },
            "required": ["keyword"]
        }),
    }]
}

/// Validated arguments for [`SEARCH_ARTICLES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Search keyword. May be empty; forwarded as-is.
    pub keyword: String,
}

/// Validates raw `search_articles` arguments.
///
/// # Errors
///
/// Returns an [`ArgumentError`] unless `raw` is an object whose `keyword`
/// field is a string.
pub fn validate_search_args(raw: &Value) -> Result<SearchRequest, ArgumentError> {
    let obj = raw.as_object().ok_or(ArgumentError::NotAnObject)?;
    let keyword = obj
        .get("keyword")
        .ok_or(ArgumentError::MissingField("keyword"))?;
    let keyword = keyword.as_str().ok_or(ArgumentError::WrongType {
        field: "keyword",
        expected: "string",
    })?;

    Ok(SearchRequest {
        keyword: keyword.to_string(),
    })
}

/// Predicate form of [`validate_search_args`].
#[must_use]
pub fn is_valid_search_args(raw: &Value) -> bool {
    validate_search_args(raw).is_ok()
}
