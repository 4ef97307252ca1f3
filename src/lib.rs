//! Scraping API client for a legacy PHP comment forum.
//!
//! The forum has no machine-readable API: every operation here works by
//! fetching server-rendered HTML, extracting structured data out of it, and
//! replaying the site's own forms (including its anti-forgery token) for
//! mutations. Session state is a plain cookie string captured from
//! `Set-Cookie` responses and re-sent on every request.
//!
//! The crate is a library consumed by a UI layer; it exposes no binary and
//! installs no tracing subscriber.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod feed;
pub mod format;
pub mod profile;
pub mod scrape;
pub mod search;
pub mod session;
pub mod submit;
pub mod upload;

pub use client::ForumClient;
pub use config::Config;
pub use error::{ForumError, SubmitError};
pub use feed::{Comment, FeedWatcher, VoteDirection};
pub use profile::UserProfile;
pub use search::{SearchParams, SearchResult};
pub use session::{Session, SessionStore, StoredUser};
pub use submit::{AvatarImage, LoginOutcome};
