//! Profile-page parser.

use std::sync::LazyLock;

use scraper::Selector;
use tracing::warn;

use crate::client::ForumClient;
use crate::error::ForumError;
use crate::scrape::{self, absolute_url, collect_text};

static USERNAME_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector(".username"));
static AVATAR_SEL: LazyLock<Selector> =
    LazyLock::new(|| scrape::selector(r#"img[src^="uploads/"]"#));
static SIGNATURE_SEL: LazyLock<Selector> =
    LazyLock::new(|| scrape::selector(r#"input[name="signature"]"#));
static EM_SEL: LazyLock<Selector> = LazyLock::new(|| scrape::selector("em"));

/// The authenticated user's profile as scraped from the profile page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    /// Only matched from images under the site's upload directory, so a
    /// random decorative image cannot be mistaken for the avatar.
    pub avatar_url: Option<String>,
    pub signature: String,
    /// Authentication code shown on the profile page. Positional extraction
    /// (second `em` on the page); see [`parse_profile`].
    pub auth_code: String,
}

/// Parse the profile page.
///
/// The username is the one required field: when it is absent the whole parse
/// yields `None`, which callers treat as "not logged in or the page moved".
///
/// The auth code is read from the second `em` element on the page. That is a
/// fragile positional assumption inherited from the site's markup; when the
/// page has fewer than two `em` elements a warning is logged and the code is
/// left empty rather than grabbing some unrelated element.
#[must_use]
pub fn parse_profile(html: &str, origin: &str) -> Option<UserProfile> {
    let document = scrape::parse_document(html);

    let username = document
        .select(&USERNAME_SEL)
        .next()
        .map(|el| collect_text(&el))?;
    if username.is_empty() {
        return None;
    }

    let avatar_url = document
        .select(&AVATAR_SEL)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| absolute_url(origin, src));

    let signature = document
        .select(&SIGNATURE_SEL)
        .next()
        .and_then(|input| input.value().attr("value"))
        .unwrap_or_default()
        .to_string();

    let auth_code = match document.select(&EM_SEL).nth(1) {
        Some(el) => collect_text(&el),
        None => {
            warn!("profile page has fewer than two em elements; auth code left empty");
            String::new()
        }
    };

    Some(UserProfile {
        username,
        avatar_url,
        signature,
        auth_code,
    })
}

impl ForumClient {
    /// Fetch and parse the authenticated user's profile.
    ///
    /// `Ok(None)` means the page loaded but had no username on it: the
    /// session is not (or no longer) authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn fetch_profile(&self) -> Result<Option<UserProfile>, ForumError> {
        let url = self.forum_url("/index.php?page=profile");
        let html = self.get_text(&url).await?;

        Ok(parse_profile(&html, &self.config().forum_origin))
    }
}
