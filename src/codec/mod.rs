//! Wire codecs: percent-encoding, query strings and URLs.
//!
//! The query codec turns `?a=1&b=2` into an ordered map and back. The URL
//! codec resolves a URL against a base, normalizes its fields, reflects a
//! state object into a URL and joins partial URLs into an href.

pub mod percent;
pub mod query;
pub mod url;

pub use query::QueryMap;
pub use url::{ParsedUrl, UrlOverlay};
