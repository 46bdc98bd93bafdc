//! Mapping from upstream documents to [`ArticleSummary`].

use super::models::{ArticleSummary, UpstreamArticle};

/// Author used when the upstream byline has no original text.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Maps one upstream document to its summary.
///
/// Total: missing strings become empty, a missing or empty byline becomes
/// [`UNKNOWN_AUTHOR`]. `pub_date` is passed through unchanged.
#[must_use]
pub fn normalize(article: &UpstreamArticle) -> ArticleSummary {
    let title = article
        .headline
        .as_ref()
        .and_then(|h| h.main.clone())
        .unwrap_or_default();

    let author = article
        .byline
        .as_ref()
        .and_then(|b| b.original.as_deref())
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string();

    ArticleSummary {
        title,
        abstract_text: article.abstract_text.clone().unwrap_or_default(),
        url: article.web_url.clone().unwrap_or_default(),
        published_date: article.pub_date.clone().unwrap_or_default(),
        author,
    }
}

/// Maps every document in order.
#[must_use]
pub fn normalize_all(articles: &[UpstreamArticle]) -> Vec<ArticleSummary> {
    articles.iter().map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::nytimes::models::{Byline, Headline};

    fn article(title: &str, author: Option<&str>) -> UpstreamArticle {
        UpstreamArticle {
            abstract_text: Some(format!("About {title}")),
            web_url: Some(format!("https://www.nytimes.com/{title}.html")),
            pub_date: Some("2024-03-14T09:00:00+0000".to_string()),
            headline: Some(Headline {
                main: Some(title.to_string()),
                ..Headline::default()
            }),
            byline: Some(Byline {
                original: author.map(str::to_string),
                ..Byline::default()
            }),
            ..UpstreamArticle::default()
        }
    }

    #[test]
    fn maps_fixed_fields() {
        let summary = normalize(&article("budget", Some("By Jane Doe")));
        assert_eq!(summary.title, "budget");
        assert_eq!(summary.abstract_text, "About budget");
        assert_eq!(summary.url, "https://www.nytimes.com/budget.html");
        assert_eq!(summary.published_date, "2024-03-14T09:00:00+0000");
        assert_eq!(summary.author, "By Jane Doe");
    }

    #[test]
    fn missing_byline_is_unknown() {
        assert_eq!(normalize(&article("a", None)).author, UNKNOWN_AUTHOR);
        assert_eq!(normalize(&article("a", Some(""))).author, UNKNOWN_AUTHOR);

        let mut no_byline = article("a", None);
        no_byline.byline = None;
        assert_eq!(normalize(&no_byline).author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn empty_document_yields_empty_strings() {
        let summary = normalize(&UpstreamArticle::default());
        assert_eq!(summary.title, "");
        assert_eq!(summary.abstract_text, "");
        assert_eq!(summary.url, "");
        assert_eq!(summary.published_date, "");
        assert_eq!(summary.author, UNKNOWN_AUTHOR);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["abstract"], "");
    }

    #[test]
    fn preserves_order() {
        let docs = vec![
            article("first", None),
            article("second", Some("By A")),
            article("third", None),
        ];
        let titles: Vec<_> = normalize_all(&docs).into_iter().map(|s| s.title).collect();
        assert_eq!(titles, ["first", "second", "third"]);
    }

    proptest! {
        #[test]
        fn prop_author_never_empty(
            title in ".*",
            author in proptest::option::of(".*"),
            drop_byline: bool,
        ) {
            let mut doc = article(&title, author.as_deref());
            if drop_byline {
                doc.byline = None;
            }
            let summary = normalize(&doc);
            prop_assert!(!summary.author.is_empty());
            match author.filter(|a| !a.is_empty() && !drop_byline) {
                Some(a) => prop_assert_eq!(summary.author, a),
                None => prop_assert_eq!(summary.author, UNKNOWN_AUTHOR),
            }
        }

        #[test]
        fn prop_one_summary_per_document(count in 0usize..50) {
            let docs: Vec<_> = (0..count).map(|i| article(&i.to_string(), None)).collect();
            let summaries = normalize_all(&docs);
            prop_assert_eq!(summaries.len(), count);
            for (i, summary) in summaries.iter().enumerate() {
                prop_assert_eq!(&summary.title, &i.to_string());
            }
        }
    }
}
