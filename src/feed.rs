//! Listing-page parser: comments, pagination, and refresh guarding.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use scraper::Selector;
use tracing::debug;

use crate::client::ForumClient;
use crate::error::ForumError;
use crate::scrape::{
    self, absolute_url, collect_text, first, first_attr, first_text, has_class,
    rewrite_img_sources,
};

static COMMENT_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector(".comment"));
static AUTHOR_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector(".header strong"));
static DATE_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector(".header .date"));
static AVATAR_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector(".content .left img"));
static CONTENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| scrape::selector(".content .right .innerDiv"));
static ACTIVE_PAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| scrape::selector(".paginator a.active"));
static PAGE_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector(".paginator a"));

/// Direction of a comment vote, mirroring the form value the site expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// One scraped forum comment.
///
/// Optional sub-elements degrade to documented defaults; only a missing id
/// drops the record entirely (that is how ad rows and malformed markup are
/// filtered out).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Stable identifier from the container's `rel` attribute. Non-empty for
    /// every record this module produces.
    pub id: String,
    /// Display name; `"Unknown"` when the author element is missing.
    pub author: String,
    /// Rank label from the author element's combined `title` attribute.
    pub author_rank: String,
    /// Point total from the same `title` attribute, kept as text.
    pub author_points: String,
    /// Raw `class` attribute of the author element.
    pub author_classes: String,
    /// Free-text date; the server's format is too inconsistent to parse.
    pub date: String,
    /// Inner markup of the body with image sources made absolute.
    pub content_html: String,
    /// Absolute avatar URL, or `""`.
    pub avatar_url: String,
    /// Vote counter; 0 when absent or non-numeric.
    pub upvotes: i64,
    pub is_highlighted: bool,
    pub can_vote: bool,
    pub has_voted: Option<VoteDirection>,
}

/// Parse a listing page into comments, preserving document order.
#[must_use]
pub fn parse_comments(html: &str, origin: &str) -> Vec<Comment> {
    let document = scrape::parse_document(html);
    let mut comments = Vec::new();

    for el in document.select(&COMMENT_SEL) {
        let id = el.value().attr("rel").unwrap_or_default().to_string();
        if id.is_empty() {
            continue;
        }

        let author_el = first(&el, &AUTHOR_SEL);
        let author = author_el
            .map(|a| collect_text(&a))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let title = author_el
            .and_then(|a| a.value().attr("title"))
            .unwrap_or_default();
        let (author_rank, author_points) = split_author_title(title);
        let author_classes = author_el
            .and_then(|a| a.value().attr("class"))
            .unwrap_or_default()
            .to_string();

        let content_html = first(&el, &CONTENT_SEL)
            .map(|body| rewrite_img_sources(origin, &body.inner_html()))
            .unwrap_or_default();

        comments.push(Comment {
            author,
            author_rank,
            author_points,
            author_classes,
            date: first_text(&el, &DATE_SEL),
            content_html,
            avatar_url: absolute_url(origin, &first_attr(&el, &AVATAR_SEL, "src")),
            upvotes: vote_count(&el, &id),
            is_highlighted: has_class(&el, "highlighted"),
            can_vote: has_class(&el, "votable"),
            has_voted: voted_direction(&el),
            id,
        });
    }

    comments
}

/// Resolve the total page count from a listing page's pagination controls.
///
/// The active indicator can under-report when the active page is not the
/// last one rendered, so every numeric link label is scanned as well and the
/// maximum wins. Non-numeric labels ("next" and friends) are ignored.
#[must_use]
pub fn parse_page_count(html: &str) -> u32 {
    let document = scrape::parse_document(html);

    let mut max_page = document
        .select(&ACTIVE_PAGE_SEL)
        .next()
        .and_then(|el| collect_text(&el).parse().ok())
        .unwrap_or(1);

    for link in document.select(&PAGE_LINK_SEL) {
        if let Ok(number) = collect_text(&link).parse::<u32>() {
            max_page = max_page.max(number);
        }
    }

    max_page
}

/// Split the combined author `title` attribute into (rank, points).
///
/// The last whitespace token is the point total and everything before it is
/// the rank label. Fewer than two tokens means neither is present.
fn split_author_title(title: &str) -> (String, String) {
    let tokens: Vec<&str> = title.split_whitespace().collect();
    if tokens.len() < 2 {
        return (String::new(), String::new());
    }

    let (rank, points) = tokens.split_at(tokens.len() - 1);
    (rank.join(" "), points[0].to_string())
}

fn vote_count(el: &scraper::ElementRef<'_>, id: &str) -> i64 {
    let Some(votes_sel) = Selector::parse(&format!(".votes-{id}")).ok() else {
        return 0;
    };

    first(el, &votes_sel)
        .map(|votes| collect_text(&votes))
        .and_then(|text| text.parse().ok())
        .unwrap_or(0)
}

fn voted_direction(el: &scraper::ElementRef<'_>) -> Option<VoteDirection> {
    if has_class(el, "voted-up") {
        Some(VoteDirection::Up)
    } else if has_class(el, "voted-down") {
        Some(VoteDirection::Down)
    } else {
        None
    }
}

impl ForumClient {
    /// Fetch and parse one listing page.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn fetch_comments(&self, page_no: u32) -> Result<Vec<Comment>, ForumError> {
        let url = self.forum_url(&format!("/index.php?pageNo={page_no}"));
        let html = self.get_text(&url).await?;

        let comments = parse_comments(&html, &self.config().forum_origin);
        debug!(page_no, count = comments.len(), "parsed listing page");

        Ok(comments)
    }

    /// Determine the total number of listing pages.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn fetch_page_count(&self) -> Result<u32, ForumError> {
        let url = self.forum_url("/index.php");
        let html = self.get_text(&url).await?;

        Ok(parse_page_count(&html))
    }
}

/// Generation counter that keeps a stale in-flight refresh from clobbering a
/// newer one.
///
/// Call [`FeedWatcher::begin`] before starting a fetch; once the response is
/// in, pass the result through [`FetchGuard::accept`]. If another fetch began
/// in the meantime the result is discarded.
#[derive(Debug, Default)]
pub struct FeedWatcher {
    generation: AtomicU64,
}

impl FeedWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch, invalidating any earlier in-flight one.
    pub fn begin(&self) -> FetchGuard<'_> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        FetchGuard {
            watcher: self,
            generation,
        }
    }
}

/// Token for one fetch begun through a [`FeedWatcher`].
#[derive(Debug)]
pub struct FetchGuard<'a> {
    watcher: &'a FeedWatcher,
    generation: u64,
}

impl FetchGuard<'_> {
    /// Whether no newer fetch has begun since this one.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.watcher.generation.load(Ordering::SeqCst) == self.generation
    }

    /// Keep `value` only if this fetch is still the newest one.
    #[must_use]
    pub fn accept<T>(&self, value: T) -> Option<T> {
        self.is_current().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://forum.example.com";

    const LISTING: &str = r#"
        <html><body>
        <div class="comment highlighted votable" rel="101">
            <div class="header">
                <strong title="Elite Member 1500" class="member elite">alice</strong>
                <span class="date">2024-01-02 10:00</span>
            </div>
            <div class="content">
                <div class="left"><img src="uploads/alice.png"></div>
                <div class="right"><div class="innerDiv"><p>First!</p><img src="/pics/cat.jpg"></div></div>
            </div>
            <span class="votes-101">12</span>
        </div>
        <div class="comment" rel="">
            <div class="header"><strong>ad bot</strong></div>
        </div>
        <div class="comment votable voted-up" rel="102">
            <div class="header"><span class="date">2024-01-02 10:05</span></div>
            <div class="content">
                <div class="right"><div class="innerDiv">plain text</div></div>
            </div>
            <span class="votes-102">not a number</span>
        </div>
        </body></html>
    "#;

    #[test]
    fn records_without_an_id_are_dropped() {
        let comments = parse_comments(LISTING, ORIGIN);

        assert_eq!(comments.len(), 2);
        assert!(comments.iter().all(|c| !c.id.is_empty()));
    }

    #[test]
    fn document_order_is_preserved() {
        let comments = parse_comments(LISTING, ORIGIN);

        assert_eq!(comments[0].id, "101");
        assert_eq!(comments[1].id, "102");
    }

    #[test]
    fn fields_are_extracted_and_urls_resolved() {
        let comments = parse_comments(LISTING, ORIGIN);
        let first = &comments[0];

        assert_eq!(first.author, "alice");
        assert_eq!(first.author_rank, "Elite Member");
        assert_eq!(first.author_points, "1500");
        assert_eq!(first.author_classes, "member elite");
        assert_eq!(first.date, "2024-01-02 10:00");
        assert_eq!(
            first.avatar_url,
            "https://forum.example.com/uploads/alice.png"
        );
        assert_eq!(first.upvotes, 12);
        assert!(first.is_highlighted);
        assert!(first.can_vote);
        assert_eq!(first.has_voted, None);
        assert!(first
            .content_html
            .contains(r#"<img src="https://forum.example.com/pics/cat.jpg">"#));
    }

    #[test]
    fn missing_optional_fields_get_defaults() {
        let comments = parse_comments(LISTING, ORIGIN);
        let second = &comments[1];

        assert_eq!(second.author, "Unknown");
        assert_eq!(second.author_rank, "");
        assert_eq!(second.author_points, "");
        assert_eq!(second.avatar_url, "");
        assert_eq!(second.upvotes, 0, "non-numeric counter parses to 0");
        assert!(!second.is_highlighted);
        assert_eq!(second.has_voted, Some(VoteDirection::Up));
    }

    #[test]
    fn author_title_with_one_token_yields_empty_fields() {
        assert_eq!(split_author_title("Newbie"), (String::new(), String::new()));
        assert_eq!(split_author_title(""), (String::new(), String::new()));
        assert_eq!(
            split_author_title("Elite Member 1500"),
            ("Elite Member".to_string(), "1500".to_string())
        );
    }

    #[test]
    fn page_count_takes_the_maximum_numeric_label() {
        let html = r#"
            <div class="paginator">
                <a>1</a><a>2</a><a class="active">3</a><a>4</a><a>next</a>
            </div>
        "#;

        assert_eq!(parse_page_count(html), 4);
    }

    #[test]
    fn page_count_defaults_to_one_without_a_paginator() {
        assert_eq!(parse_page_count("<html><body></body></html>"), 1);
    }

    #[test]
    fn stale_fetch_results_are_discarded() {
        let watcher = FeedWatcher::new();

        let stale = watcher.begin();
        let fresh = watcher.begin();

        assert!(!stale.is_current());
        assert_eq!(stale.accept(vec![1]), None);
        assert_eq!(fresh.accept(vec![2]), Some(vec![2]));
    }
}
