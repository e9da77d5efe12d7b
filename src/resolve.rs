//! Active route resolution
//!
//! Two policies are offered, chosen per router:
//!
//! - [`FirstMatch`] walks the table in declaration order and returns the first
//!   route whose pattern matches the whole pathname. Overlapping patterns are
//!   disambiguated purely by order: a general pattern declared before a more
//!   specific one shadows it.
//! - [`AllMatches`] collects every route whose pattern is a segment prefix of
//!   the pathname. The root route only matches the root pathname exactly.
//!
//! Resolution is recomputed on demand and every call yields freshly allocated
//! snapshots, so consumers can detect "a navigation happened" with
//! [`Rc::ptr_eq`] even when the same route stays active.

use crate::route::{RouteDescriptor, RouteTable};
use crate::{trace_log, ActiveRoute, ActiveRoutes, RouteParams};
use std::fmt;
use std::rc::Rc;

/// Strategy turning a pathname into the value listeners observe
pub trait ResolutionPolicy: 'static {
    /// Value handed to listeners and returned by `Router::current`
    type Snapshot: Clone + fmt::Debug + 'static;

    /// Matching routes for `pathname`
    fn resolve(table: &RouteTable, pathname: &str) -> Vec<ActiveRoute>;

    /// Wrap resolved routes into a new snapshot
    fn snapshot(matches: Vec<ActiveRoute>) -> Self::Snapshot;
}

/// At most one active route, first declared match wins
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

/// Every route whose pattern prefixes the pathname
#[derive(Debug, Clone, Copy, Default)]
pub struct AllMatches;

fn activate(
    table: &RouteTable,
    route: &RouteDescriptor,
    params: RouteParams,
    pathname: &str,
) -> ActiveRoute {
    ActiveRoute {
        name: route.name().to_string(),
        pattern: route.pattern().to_string(),
        params,
        pathname: table.strip_base(pathname).to_string(),
    }
}

impl ResolutionPolicy for FirstMatch {
    type Snapshot = Option<Rc<ActiveRoute>>;

    fn resolve(table: &RouteTable, pathname: &str) -> Vec<ActiveRoute> {
        let found = table.iter().find_map(|route| {
            route
                .matcher()
                .test(pathname)
                .map(|params| activate(table, route, params, pathname))
        });

        trace_log!(
            "First match for '{}': {:?}",
            pathname,
            found.as_ref().map(|route| route.name.as_str())
        );
        found.into_iter().collect()
    }

    fn snapshot(matches: Vec<ActiveRoute>) -> Self::Snapshot {
        matches.into_iter().next().map(Rc::new)
    }
}

impl ResolutionPolicy for AllMatches {
    type Snapshot = Rc<ActiveRoutes>;

    fn resolve(table: &RouteTable, pathname: &str) -> Vec<ActiveRoute> {
        let found: Vec<ActiveRoute> = table
            .iter()
            .filter_map(|route| {
                let params = if route.is_root() {
                    route.matcher().test(pathname)
                } else {
                    route.matcher().partial_test(pathname)
                };
                params.map(|params| activate(table, route, params, pathname))
            })
            .collect();

        trace_log!("{} active routes for '{}'", found.len(), pathname);
        found
    }

    fn snapshot(matches: Vec<ActiveRoute>) -> Self::Snapshot {
        Rc::new(matches.into_iter().collect())
    }
}
