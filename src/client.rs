//! Transport layer: cookie injection and `Set-Cookie` capture.
//!
//! Every request to the forum goes through [`ForumClient::execute`] so the
//! session cookie stays current regardless of which call site triggered the
//! response that refreshed it. There is no retry logic; transport failures
//! propagate to the caller as-is.

use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::{RequestBuilder, Response};
use tracing::debug;

use crate::config::Config;
use crate::error::ForumError;
use crate::session::Session;

/// HTTP client bound to one [`Session`] and one set of endpoints.
pub struct ForumClient {
    http: reqwest::Client,
    config: Config,
    session: Session,
}

impl ForumClient {
    /// Build a client. The configured user agent becomes the default for
    /// every request; individual requests may still override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: Config, session: Session) -> Result<Self, ForumError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            session,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The raw HTTP client, for requests that must *not* carry the forum
    /// session cookie (the search mirror, the upload host).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL of a path on the forum origin.
    pub(crate) fn forum_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.config.forum_origin, path_and_query)
    }

    /// Send a request with the session cookie attached, then absorb any
    /// `Set-Cookie` headers on the response into the session.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the request fails; the status code is
    /// not inspected here.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response, ForumError> {
        let cookie = self.session.cookie();
        let request = if cookie.is_empty() {
            request
        } else {
            request.header(COOKIE, cookie)
        };

        let response = request.send().await?;
        self.capture_cookies(response.headers());

        Ok(response)
    }

    /// GET a forum page and return its body, requiring a 2xx status.
    pub(crate) async fn get_text(&self, url: &str) -> Result<String, ForumError> {
        let response = self.execute(self.http.get(url)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForumError::Status(status));
        }

        Ok(response.text().await?)
    }

    /// Update the session from `Set-Cookie` response headers.
    ///
    /// Each cookie is stripped down to its `name=value` segment (attributes
    /// like path and expiry are discarded) and the segments are rejoined with
    /// `"; "` as the new session cookie. Responses without `Set-Cookie` leave
    /// the session untouched.
    fn capture_cookies(&self, headers: &HeaderMap) {
        let mut cookies = Vec::new();

        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };

            // Intermediaries sometimes merge several Set-Cookie headers into
            // one comma-separated value; expiry dates also contain commas, so
            // only fragments that look like name=value pairs are kept.
            for fragment in raw.split(',') {
                let Some(pair) = fragment.split(';').next() else {
                    continue;
                };
                let pair = pair.trim();
                if !pair.is_empty() && pair.contains('=') {
                    cookies.push(pair.to_string());
                }
            }
        }

        if !cookies.is_empty() {
            let combined = cookies.join("; ");
            debug!(cookies = cookies.len(), "session cookie updated");
            self.session.set_cookie(&combined);
        }
    }
}
