//! Route token matching.
//!
//! # Responsibilities
//! - Test a literal route token against the received bytes
//! - Offer containment (default) and anchored variants
//!
//! # Design Decisions
//! - Matching is byte-exact and case-sensitive
//! - Containment means a token appearing in a header or the body also
//!   matches; anchored matching only looks at the start of the request
//! - No regex to guarantee O(n) matching

/// Trait for matching received bytes against a route token.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if `buf` matches this condition.
    fn matches(&self, buf: &[u8]) -> bool;

    /// The literal token being matched.
    fn token(&self) -> &str;
}

/// Matches when the token occurs anywhere in the buffer.
#[derive(Debug, Clone)]
pub struct ContainsMatcher {
    token: String,
}

impl ContainsMatcher {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Matcher for ContainsMatcher {
    fn matches(&self, buf: &[u8]) -> bool {
        let needle = self.token.as_bytes();
        if needle.is_empty() {
            return true;
        }
        buf.windows(needle.len()).any(|w| w == needle)
    }

    fn token(&self) -> &str {
        &self.token
    }
}

/// Matches when the buffer starts with the token.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    token: String,
}

impl PrefixMatcher {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Matcher for PrefixMatcher {
    fn matches(&self, buf: &[u8]) -> bool {
        buf.starts_with(self.token.as_bytes())
    }

    fn token(&self) -> &str {
        &self.token
    }
}
