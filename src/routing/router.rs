//! Route lookup.
//!
//! # Responsibilities
//! - Store the fixed, ordered route table
//! - Look up the first matching route for received bytes
//! - Return matched route kind or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Declaration order, not longest match: `"GET / "` is listed first and
//!   cannot shadow the others because of its trailing space
//! - Explicit None rather than silent default

use std::fmt;

use crate::config::RoutingConfig;
use crate::routing::matcher::{ContainsMatcher, Matcher, PrefixMatcher};

/// The handlers a request can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Root,
    Echo,
    UserAgent,
    FileRead,
    FileWrite,
}

impl RouteKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Root => "root",
            RouteKind::Echo => "echo",
            RouteKind::UserAgent => "user_agent",
            RouteKind::FileRead => "file_read",
            RouteKind::FileWrite => "file_write",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route tokens in match order.
pub const ROUTE_TABLE: [(&str, RouteKind); 5] = [
    ("GET / ", RouteKind::Root),
    ("GET /echo/", RouteKind::Echo),
    ("GET /user-agent ", RouteKind::UserAgent),
    ("GET /files", RouteKind::FileRead),
    ("POST /files", RouteKind::FileWrite),
];

/// One compiled route table entry.
#[derive(Debug)]
struct Route {
    kind: RouteKind,
    matcher: Box<dyn Matcher>,
}

/// The compiled route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile the route table, anchored or by containment.
    pub fn new(anchored: bool) -> Self {
        let routes = ROUTE_TABLE
            .iter()
            .map(|&(token, kind)| {
                let matcher: Box<dyn Matcher> = if anchored {
                    Box::new(PrefixMatcher::new(token))
                } else {
                    Box::new(ContainsMatcher::new(token))
                };
                Route { kind, matcher }
            })
            .collect();

        Self { routes }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.anchored)
    }

    /// Find the first route whose token matches `buf`.
    pub fn match_request(&self, buf: &[u8]) -> Option<RouteKind> {
        let hit = self.routes.iter().find(|r| r.matcher.matches(buf));
        if let Some(route) = hit {
            tracing::trace!(route = %route.kind, token = route.matcher.token(), "Route matched");
        }
        hit.map(|r| r.kind)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(false)
    }
}
