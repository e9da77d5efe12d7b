//! # Route Registry
//!
//! A named route table with navigation-state synchronization:
//!
//! - **Named Routes** - Build and navigate to URLs by route name and params
//! - **Route Matching** - `:param`, `:param<regex>` and `*wildcard` patterns
//! - **Resolution Policies** - First declared match, or every prefix match
//! - **Query Updates** - Edit the search string without a route change notification
//! - **Listeners** - Exactly one notification per structural navigation
//!
//! # Quick Start
//!
//! ```
//! use route_registry::{MemoryHistory, RouteParams, Router};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let router = Router::builder()
//!     .route("home", "/")
//!     .route("user", "/users/:id")
//!     .build(MemoryHistory::new("/"))
//!     .unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! router.listen(move |active| {
//!     let name = active.as_ref().map(|route| route.name.clone());
//!     sink.borrow_mut().push(name);
//! });
//!
//! router.push("user", &RouteParams::new().with("id", "7")).unwrap();
//! router.set_query("tab", Some("posts"));
//!
//! assert_eq!(*seen.borrow(), [Some("user".to_string())]);
//! assert_eq!(router.pathname(), "/users/7");
//! assert_eq!(router.queries().get("tab"), Some("posts"));
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)
//! - `cache` (default) - LRU memo of resolutions keyed by pathname

#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Cache (optional)
#[cfg(feature = "cache")]
pub mod cache;

// Core routing modules
pub mod history;
pub mod listeners;
pub mod matcher;
pub mod resolve;
pub mod route;
pub mod router;

// Error handling
pub mod error;

pub mod params;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{CacheStats, ResolutionCache};
pub use error::{RouterError, RouterResult};
pub use history::{History, HistoryEntry, HistoryUpdate, Location, MemoryHistory, NavigationIntent};
pub use listeners::{Listener, ListenerId, ListenerSet, Subscription};
pub use matcher::{Constraint, PathPattern, Segment};
pub use params::{QueryParams, RouteParams};
pub use resolve::{AllMatches, FirstMatch, ResolutionPolicy};
pub use route::{normalize_base, RouteDescriptor, RouteTable};
pub use router::{Router, RouterBuilder};

use std::collections::HashMap;

/// How a history entry became current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationAction {
    /// A new entry was appended
    Push,
    /// The current entry was overwritten
    Replace,
    /// The stack cursor moved (back/forward/go)
    Pop,
}

/// A route matching the current location
///
/// Produced fresh by every resolution; never mutated afterwards.
///
/// # Example
///
/// ```
/// use route_registry::{FirstMatch, ResolutionPolicy, RouteTable};
///
/// let table = RouteTable::new([("user", "/users/:id")], None).unwrap();
/// let route = FirstMatch::snapshot(FirstMatch::resolve(&table, "/users/42")).unwrap();
///
/// assert_eq!(route.name, "user");
/// assert_eq!(route.params.get("id"), Some("42"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoute {
    /// Route name
    pub name: String,
    /// Pattern as configured, without the base prefix
    pub pattern: String,
    /// Captured parameters, percent-decoded
    pub params: RouteParams,
    /// Matched pathname, without the base prefix
    pub pathname: String,
}

/// Every active route, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveRoutes {
    routes: HashMap<String, ActiveRoute>,
}

impl ActiveRoutes {
    /// Get an active route by name
    pub fn get(&self, name: &str) -> Option<&ActiveRoute> {
        self.routes.get(name)
    }

    /// Check if a route is active
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Iterate over active routes (no particular order)
    pub fn iter(&self) -> impl Iterator<Item = &ActiveRoute> {
        self.routes.values()
    }

    /// Names of the active routes (no particular order)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<ActiveRoute> for ActiveRoutes {
    fn from_iter<I: IntoIterator<Item = ActiveRoute>>(iter: I) -> Self {
        Self {
            routes: iter
                .into_iter()
                .map(|route| (route.name.clone(), route))
                .collect(),
        }
    }
}
