//! Reply-quote formatter: rendered comment HTML back to forum markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::feed::Comment;

static QUOTE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div class=['"]quote['"]>.*?</div>"#).expect("quote block pattern is valid")
});
static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br pattern is valid"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Turn a comment's rendered body back into forum markup for quoting.
///
/// Existing quote blocks are removed first so quoting a quote does not pile
/// up nested blocks; the rest is flattened to plain text with line breaks
/// kept, and wrapped in the forum's own `[quote=…]` tag.
#[must_use]
pub fn format_reply(comment: &Comment) -> String {
    let content = QUOTE_BLOCK_RE.replace_all(&comment.content_html, "");
    let content = BR_RE.replace_all(&content, "\n");
    let content = TAG_RE.replace_all(&content, "");

    let content = decode_entities(&content);

    format!("[quote={}]{}[/quote]\n", comment.author, content.trim())
}

/// Decode the handful of named entities the forum actually emits.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment_with_body(author: &str, content_html: &str) -> Comment {
        Comment {
            id: "1".to_string(),
            author: author.to_string(),
            author_rank: String::new(),
            author_points: String::new(),
            author_classes: String::new(),
            date: String::new(),
            content_html: content_html.to_string(),
            avatar_url: String::new(),
            upvotes: 0,
            is_highlighted: false,
            can_vote: false,
            has_voted: None,
        }
    }

    #[test]
    fn quote_blocks_are_removed_and_breaks_kept() {
        let comment =
            comment_with_body("alice", r#"<div class="quote">old</div><p>Hi<br>there</p>"#);

        assert_eq!(format_reply(&comment), "[quote=alice]Hi\nthere[/quote]\n");
    }

    #[test]
    fn named_entities_are_decoded() {
        let comment = comment_with_body("bob", "1 &lt; 2 &amp;&amp; 3 &gt; 2&nbsp;&quot;ok&quot;");

        assert_eq!(
            format_reply(&comment),
            "[quote=bob]1 < 2 && 3 > 2 \"ok\"[/quote]\n"
        );
    }

    #[test]
    fn self_closing_and_spaced_breaks_are_handled() {
        let comment = comment_with_body("eve", "a<br />b<br/>c");

        assert_eq!(format_reply(&comment), "[quote=eve]a\nb\nc[/quote]\n");
    }

    #[test]
    fn empty_body_produces_an_empty_quote() {
        let comment = comment_with_body("eve", "");

        assert_eq!(format_reply(&comment), "[quote=eve][/quote]\n");
    }
}
