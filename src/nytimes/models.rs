//! Article Search API response schema.
//!
//! The upstream documents are rich and loosely populated: fields are often
//! missing or `null` depending on the document type. Every field here is
//! defaulted so one odd document never fails a whole response.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level body of `articlesearch.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    /// Upstream status string, `"OK"` on success.
    pub status: String,
    /// Copyright notice.
    pub copyright: String,
    /// The result envelope.
    pub response: ResponseBody,
}

/// The `response` envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseBody {
    /// Matching documents, newest first when requested with `sort=newest`.
    #[serde(deserialize_with = "null_as_default")]
    pub docs: Vec<UpstreamArticle>,
    /// Hit counts and timing.
    pub meta: Option<ResponseMeta>,
}

/// Result metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseMeta {
    /// Total number of matches.
    pub hits: u64,
    /// Offset of this page.
    pub offset: u64,
    /// Query time in milliseconds.
    pub time: u64,
}

/// A single document as returned by the upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamArticle {
    /// Document identifier.
    #[serde(rename = "_id")]
    pub id: Option<String>,
    /// Short summary.
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Canonical article URL.
    pub web_url: Option<String>,
    /// Search snippet.
    pub snippet: Option<String>,
    /// First paragraph.
    pub lead_paragraph: Option<String>,
    /// Print section, if printed.
    pub print_section: Option<String>,
    /// Print page, if printed.
    pub print_page: Option<String>,
    /// Originating source.
    pub source: Option<String>,
    /// Attached media entries (kept opaque).
    #[serde(deserialize_with = "null_as_default")]
    pub multimedia: Vec<serde_json::Value>,
    /// Headline variants.
    pub headline: Option<Headline>,
    /// Subject tags.
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: Vec<Keyword>,
    /// Publication timestamp as sent by the upstream.
    pub pub_date: Option<String>,
    /// Document type (article, multimedia, ...).
    pub document_type: Option<String>,
    /// News desk.
    pub news_desk: Option<String>,
    /// Section name.
    pub section_name: Option<String>,
    /// Author attribution.
    pub byline: Option<Byline>,
    /// Material type (News, Op-Ed, ...).
    pub type_of_material: Option<String>,
    /// Word count.
    pub word_count: Option<u64>,
    /// Upstream URI.
    pub uri: Option<String>,
}

/// Headline variants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Headline {
    /// Main headline.
    pub main: Option<String>,
    /// Kicker above the headline.
    pub kicker: Option<String>,
    /// Content kicker.
    pub content_kicker: Option<String>,
    /// Print headline.
    pub print_headline: Option<String>,
    /// Headline name.
    pub name: Option<String>,
    /// SEO headline.
    pub seo: Option<String>,
    /// Sub-headline.
    pub sub: Option<String>,
}

/// A subject tag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Keyword {
    /// Tag category (subject, persons, glocations, ...).
    pub name: Option<String>,
    /// Tag value.
    pub value: Option<String>,
    /// Relevance rank.
    pub rank: Option<u32>,
    /// Major flag (`"Y"`/`"N"`).
    pub major: Option<String>,
}

/// Author attribution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Byline {
    /// Original byline text, e.g. `"By Jane Doe"`.
    pub original: Option<String>,
    /// Structured author list.
    #[serde(deserialize_with = "null_as_default")]
    pub person: Vec<Person>,
    /// Organisation credited instead of a person.
    pub organization: Option<String>,
}

/// A structured author entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Person {
    /// Given name.
    pub firstname: Option<String>,
    /// Middle name.
    pub middlename: Option<String>,
    /// Family name.
    pub lastname: Option<String>,
    /// Suffix qualifier.
    pub qualifier: Option<String>,
    /// Title.
    pub title: Option<String>,
    /// Role (reported, photographed, ...).
    pub role: Option<String>,
    /// Organisation.
    pub organization: Option<String>,
    /// Ordering rank.
    pub rank: Option<u32>,
}

/// Structured error body returned with non-2xx responses.
///
/// The API answers gateway errors with `{"fault": {"faultstring": ...}}` and
/// application errors with `{"message": ...}` or `{"errors": [...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    /// Plain message.
    pub message: Option<String>,
    /// Gateway fault.
    pub fault: Option<Fault>,
    /// Application error list.
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

/// Gateway fault detail.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fault {
    /// Fault description.
    pub faultstring: Option<String>,
}

impl ErrorBody {
    /// Returns the most specific message the body carries.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message
            .or_else(|| self.fault.and_then(|f| f.faultstring))
            .or_else(|| (!self.errors.is_empty()).then(|| self.errors.join("; ")))
            .filter(|m| !m.trim().is_empty())
    }
}

/// The normalised article handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    /// Main headline.
    pub title: String,
    /// Short summary; empty when the upstream has none.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Article URL.
    pub url: String,
    /// Publication timestamp, verbatim from the upstream.
    pub published_date: String,
    /// Original byline, or `"Unknown"`.
    pub author: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
