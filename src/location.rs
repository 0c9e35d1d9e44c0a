//! Source of the current document location.

use parking_lot::RwLock;

/// Provides the href that relative URLs resolve against and that
/// `update_url` reads when no URL is given.
pub trait Location: Send + Sync {
    /// The current absolute href.
    fn href(&self) -> String;
}

/// A location held in memory and moved by the host.
#[derive(Debug)]
pub struct StaticLocation {
    href: RwLock<String>,
}

impl StaticLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: RwLock::new(href.into()),
        }
    }

    /// Navigate to a new href.
    pub fn assign(&self, href: impl Into<String>) {
        *self.href.write() = href.into();
    }
}

impl Location for StaticLocation {
    fn href(&self) -> String {
        self.href.read().clone()
    }
}

impl<F> Location for F
where
    F: Fn() -> String + Send + Sync,
{
    fn href(&self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_location_assign() {
        let location = StaticLocation::new("https://example.com/");
        assert_eq!(location.href(), "https://example.com/");

        location.assign("https://example.com/next");
        assert_eq!(location.href(), "https://example.com/next");
    }

    #[test]
    fn test_closure_location() {
        let location = || "https://example.com/from-closure".to_string();
        assert_eq!(Location::href(&location), "https://example.com/from-closure");
    }
}
