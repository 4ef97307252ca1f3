//! Client and parser for the read-only comment search mirror.
//!
//! The mirror is a separate site with its own markup and no session; search
//! is strictly best-effort. Any failure, network or parse, degrades to an
//! empty result set so the feature can never take a screen down with it.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use tracing::warn;
use url::Url;

use crate::client::ForumClient;
use crate::error::ForumError;
use crate::scrape::{self, collect_text, first, first_attr, first_text};

static RESULT_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector(".comment"));
static HEADER_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector("div:first-child"));
static AUTHOR_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector("b"));
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector("a"));
static CONTENT_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector("div:nth-child(3)"));
static DATE_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector("div:nth-child(4)"));

static POINTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([\d-]+)\)").expect("points pattern is valid"));
static PAGE_NO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pageNo=(\d+)").expect("page number pattern is valid"));
static COMMENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"comment-(\d+)").expect("comment id pattern is valid"));
static HYPHEN_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{3,}").expect("hyphen run pattern is valid"));

/// Query parameters understood by the search mirror; unset fields are
/// simply omitted from the request.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub user: Option<String>,
    pub comment: Option<String>,
    pub is_reg: Option<String>,
    pub points: Option<String>,
    pub fromdate: Option<String>,
    pub todate: Option<String>,
}

/// One row from the search mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Comment id extracted from the result link, or `""`.
    pub id: String,
    pub author: String,
    pub is_registered: bool,
    pub points: i64,
    pub date: String,
    pub content_html: String,
    /// Listing page the original comment lives on; 1 when the link does not
    /// say.
    pub page_no: u32,
    /// Raw href of the result link, the origin of `page_no` and `id`.
    pub link: String,
}

/// Run a search against the mirror.
///
/// Never fails: transport errors, bad statuses and unparseable responses
/// all collapse to an empty vec with a logged warning.
pub async fn search(client: &ForumClient, params: &SearchParams) -> Vec<SearchResult> {
    match try_search(client, params).await {
        Ok(results) => results,
        Err(err) => {
            warn!(error = %err, "search failed, returning no results");
            Vec::new()
        }
    }
}

async fn try_search(
    client: &ForumClient,
    params: &SearchParams,
) -> Result<Vec<SearchResult>, ForumError> {
    let mut url = Url::parse(&format!("{}/results/", client.config().search_origin))
        .map_err(|_| ForumError::UnexpectedShape("search origin is not a valid URL".into()))?;

    {
        let mut query = url.query_pairs_mut();
        for (name, value) in [
            ("user", &params.user),
            ("comment", &params.comment),
            ("is_reg", &params.is_reg),
            ("points", &params.points),
            ("fromdate", &params.fromdate),
            ("todate", &params.todate),
        ] {
            if let Some(value) = value {
                query.append_pair(name, value);
            }
        }
    }

    // The mirror is a different site: the forum session cookie must not be
    // sent to it, so this bypasses the cookie-carrying transport.
    let response = client.http().get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ForumError::Status(status));
    }

    Ok(parse_search_results(&response.text().await?))
}

/// Parse the mirror's results page.
#[must_use]
pub fn parse_search_results(html: &str) -> Vec<SearchResult> {
    let document = scrape::parse_document(html);
    let mut results = Vec::new();

    for el in document.select(&RESULT_SEL) {
        let header = first(&el, &HEADER_SEL);

        let author_b = header.and_then(|h| first(&h, &AUTHOR_SEL));
        let author = author_b
            .map(|b| collect_text(&b))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Ismeretlen".to_string());
        let is_registered = author_b
            .map(|b| scrape::has_class(&b, "registered"))
            .unwrap_or(false);

        let header_text = header.map(|h| collect_text(&h)).unwrap_or_default();
        let points = POINTS_RE
            .captures(&header_text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);

        let link = header
            .map(|h| first_attr(&h, &LINK_SEL, "href"))
            .unwrap_or_default();
        let page_no = PAGE_NO_RE
            .captures(&link)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1);
        let id = COMMENT_ID_RE
            .captures(&link)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let content_html = first(&el, &CONTENT_SEL)
            .map(|div| div.inner_html())
            .unwrap_or_default();

        let date = HYPHEN_RUN_RE
            .replace_all(&first_text(&el, &DATE_SEL), "")
            .trim()
            .to_string();

        results.push(SearchResult {
            id,
            author,
            is_registered,
            points,
            date,
            content_html,
            page_no,
            link,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS: &str = r#"
        <html><body>
        <div class="comment">
            <div>
                <b class="registered">alice</b> (42)
                <a href="/index.php?pageNo=7#comment-123">ugrás</a>
            </div>
            <div>meta</div>
            <div><p>found <b>this</b></p></div>
            <div>--- 2024-01-02 ---</div>
        </div>
        <div class="comment">
            <div><b></b> (-3)</div>
            <div>meta</div>
            <div>body</div>
            <div>2024-01-03</div>
        </div>
        </body></html>
    "#;

    #[test]
    fn results_are_extracted_with_link_derived_fields() {
        let results = parse_search_results(RESULTS);

        assert_eq!(results.len(), 2);

        let hit = &results[0];
        assert_eq!(hit.author, "alice");
        assert!(hit.is_registered);
        assert_eq!(hit.points, 42);
        assert_eq!(hit.page_no, 7);
        assert_eq!(hit.id, "123");
        assert_eq!(hit.link, "/index.php?pageNo=7#comment-123");
        assert_eq!(hit.content_html, "<p>found <b>this</b></p>");
        assert_eq!(hit.date, "2024-01-02");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let results = parse_search_results(RESULTS);
        let hit = &results[1];

        assert_eq!(hit.author, "Ismeretlen");
        assert!(!hit.is_registered);
        assert_eq!(hit.points, -3, "signed point totals parse");
        assert_eq!(hit.page_no, 1);
        assert_eq!(hit.id, "");
    }

    #[test]
    fn empty_page_yields_no_results() {
        assert!(parse_search_results("<html><body></body></html>").is_empty());
    }
}
