//! Mutating operations: login, posting, voting, profile update.
//!
//! Every mutation follows the same token-replay protocol the site's own
//! forms use: GET the relevant page, pull the hidden anti-forgery token out
//! of it, POST the form with that token through the cookie-carrying
//! transport. No mutation is ever attempted without a freshly fetched token.

use std::sync::LazyLock;

use reqwest::multipart::{Form, Part};
use scraper::Selector;
use tracing::debug;

use crate::client::ForumClient;
use crate::constants::{LOGOUT_MARKER, TOKEN_FIELD};
use crate::error::SubmitError;
use crate::feed::VoteDirection;
use crate::scrape;

static TOKEN_SEL: LazyLock<Selector> =
    LazyLock::new(|| scrape::selector(&format!(r#"input[name="{TOKEN_FIELD}"]"#)));

/// Fields the posting form includes purely to trap spam bots; the client
/// must submit them empty like a browser would.
const HONEYPOT_FIELDS: [&str; 5] = ["email", "phone", "address", "url", "website"];

/// Outcome of a login attempt that reached the server.
///
/// Rejected credentials are a normal outcome, not an error: the server
/// answers 200 either way and only the page content tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted,
    Rejected,
}

/// An avatar image to attach to a profile update.
#[derive(Debug, Clone)]
pub struct AvatarImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Pull the hidden anti-forgery token out of a form page, if present.
fn extract_token(html: &str) -> Option<String> {
    let document = scrape::parse_document(html);

    document
        .select(&TOKEN_SEL)
        .next()
        .and_then(|input| input.value().attr("value"))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Content type for an uploaded file, inferred from its extension.
/// The site serves avatars as JPEG by default, so that is the fallback.
fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| "image/jpeg".to_string())
}

impl ForumClient {
    /// GET `path` and extract the anti-forgery token from it.
    async fn fetch_token(&self, path: &str, page: &'static str) -> Result<String, SubmitError> {
        let html = self.get_text(&self.forum_url(path)).await?;

        extract_token(&html).ok_or(SubmitError::MissingToken { page })
    }

    /// Log in with the given credentials.
    ///
    /// Success means the response body contains the logout link marker that
    /// only authenticated pages carry; any session cookie the server issued
    /// has already been absorbed by the transport layer by then.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is missing or the exchange fails at
    /// the HTTP level. Wrong credentials are `Ok(LoginOutcome::Rejected)`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, SubmitError> {
        let path = "/index.php?page=login";
        let token = self.fetch_token(path, "login page").await?;

        let request = self.http().post(self.forum_url(path)).form(&[
            (TOKEN_FIELD, token.as_str()),
            ("name", username),
            ("password", password),
        ]);
        let response = self.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status(status));
        }

        let body = response.text().await?;
        if body.contains(LOGOUT_MARKER) {
            debug!(username, "login accepted");
            Ok(LoginOutcome::Accepted)
        } else {
            debug!(username, "login rejected");
            Ok(LoginOutcome::Rejected)
        }
    }

    /// Post a comment to the main listing.
    ///
    /// Success is judged on HTTP status alone; the server reports its own
    /// validation failures only inside the page content, so a rejected post
    /// is indistinguishable from an accepted one here. Accepted trade-off.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is missing or the POST fails.
    pub async fn post_comment(&self, nickname: &str, message: &str) -> Result<(), SubmitError> {
        let token = self.fetch_token("/index.php", "posting page").await?;

        let mut fields = vec![
            (TOKEN_FIELD, token.as_str()),
            ("name", nickname),
            ("comment", message),
        ];
        for honeypot in HONEYPOT_FIELDS {
            fields.push((honeypot, ""));
        }

        let request = self.http().post(self.forum_url("/index.php")).form(&fields);
        let response = self.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status(status));
        }

        Ok(())
    }

    /// Vote on a comment.
    ///
    /// The endpoint's response is returned verbatim; its format is not part
    /// of any contract we trust, so interpreting it is the caller's problem.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is missing or the POST fails.
    pub async fn vote(
        &self,
        comment_id: &str,
        direction: VoteDirection,
    ) -> Result<String, SubmitError> {
        let token = self.fetch_token("/index.php", "listing page").await?;

        let request = self.http().post(self.forum_url("/include/ajax.php")).form(&[
            ("action", "voteComment"),
            ("id", comment_id),
            ("direction", direction.as_str()),
            (TOKEN_FIELD, token.as_str()),
        ]);
        let response = self.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status(status));
        }

        Ok(response.text().await?)
    }

    /// Update the signature and, optionally, the avatar on the profile page.
    ///
    /// Like posting, success is judged on HTTP status alone.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is missing or the POST fails.
    pub async fn update_profile(
        &self,
        signature: &str,
        image: Option<AvatarImage>,
    ) -> Result<(), SubmitError> {
        let path = "/index.php?page=profile";
        let token = self.fetch_token(path, "profile page").await?;

        let mut form = Form::new()
            .text("form-action", "update-user")
            .text(TOKEN_FIELD, token)
            .text("signature", signature.to_string());

        if let Some(image) = image {
            let content_type = content_type_for(&image.filename);
            let part = Part::bytes(image.bytes)
                .file_name(image.filename)
                .mime_str(&content_type)?;
            form = form.part("image", part);
        }

        let request = self.http().post(self.forum_url(path)).multipart(form);
        let response = self.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status(status));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_extracted_from_hidden_input() {
        let html = r#"<form><input type="hidden" name="token" value="abc123"></form>"#;

        assert_eq!(extract_token(html), Some("abc123".to_string()));
    }

    #[test]
    fn missing_or_empty_token_yields_none() {
        assert_eq!(extract_token("<form></form>"), None);
        assert_eq!(
            extract_token(r#"<form><input name="token" value=""></form>"#),
            None
        );
    }

    #[test]
    fn content_type_follows_the_file_extension() {
        assert_eq!(content_type_for("avatar.png"), "image/png");
        assert_eq!(content_type_for("avatar.gif"), "image/gif");
    }

    #[test]
    fn unknown_extensions_fall_back_to_jpeg() {
        assert_eq!(content_type_for("avatar"), "image/jpeg");
        assert_eq!(content_type_for("avatar.weird"), "image/jpeg");
    }
}
