//! Error types for read and mutating operations.

use std::borrow::Cow;

use thiserror::Error;

/// Failure of a read operation (feed, profile, upload, page count).
#[derive(Debug, Error)]
pub enum ForumError {
    /// Network-level failure: DNS, connect, timeout, body read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered, but not with a usable page.
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    /// The page arrived but its markup no longer matches what we scrape.
    #[error("unexpected page shape: {0}")]
    UnexpectedShape(Cow<'static, str>),
}

/// Failure of a mutating operation (login, post, vote, profile update).
///
/// Mutations all follow the token-replay protocol, so they share a failure
/// taxonomy distinct from plain reads. `MissingToken` is recoverable: the
/// caller can re-fetch the page and try again.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The hidden anti-forgery token input was absent from the form page.
    #[error("anti-forgery token not found on {page}")]
    MissingToken { page: &'static str },

    /// Network-level failure on either the token fetch or the POST.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The POST completed but the server did not report success.
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    /// A page involved in the submission no longer has the expected markup.
    #[error("unexpected page shape: {0}")]
    UnexpectedShape(Cow<'static, str>),
}

impl From<ForumError> for SubmitError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::Transport(e) => Self::Transport(e),
            ForumError::Status(code) => Self::Status(code),
            ForumError::UnexpectedShape(what) => Self::UnexpectedShape(what),
        }
    }
}
