//! Shared constants used across the client.

/// User agent sent when a request does not override it.
///
/// The forum rejects some requests from clients that do not identify as a
/// browser, so this mirrors a current desktop Chrome.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scheme+host prefix of the forum itself; used to resolve scraped URLs.
pub const DEFAULT_FORUM_ORIGIN: &str = "https://forum.sodika.dk";

/// Scheme+host prefix of the read-only comment search mirror.
pub const DEFAULT_SEARCH_ORIGIN: &str = "https://komment.sodikereso.info";

/// Anonymous file-hosting endpoint used for avatar/image uploads.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://catbox.moe/user/api.php";

/// Name of the hidden anti-forgery token input on every form page.
pub const TOKEN_FIELD: &str = "token";

/// Marker that only appears in the markup of an authenticated page.
pub const LOGOUT_MARKER: &str = "page=logout";
