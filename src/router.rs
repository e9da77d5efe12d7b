//! Router facade and notification hub
//!
//! A [`Router`] owns the route table, drives a [`History`] and keeps exactly
//! one subscription to it. Every history update except a query-only replace
//! re-resolves the active route(s) against the live location and fans a fresh
//! snapshot out to the router's listeners.

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, ResolutionCache};
use crate::error::RouterResult;
use crate::history::{History, HistoryUpdate, Location, NavigationIntent};
use crate::listeners::{ListenerSet, Subscription};
use crate::params::{QueryParams, RouteParams};
use crate::resolve::{FirstMatch, ResolutionPolicy};
use crate::route::{RouteDescriptor, RouteTable};
use crate::{debug_log, trace_log};
#[cfg(feature = "cache")]
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

struct Inner<P: ResolutionPolicy> {
    table: RouteTable,
    history: Rc<dyn History>,
    listeners: ListenerSet<P::Snapshot>,
    #[cfg(feature = "cache")]
    cache: RefCell<ResolutionCache>,
    hub: Subscription,
}

impl<P: ResolutionPolicy> Inner<P> {
    fn handle_update(&self, update: &HistoryUpdate) {
        if update.is_query_only_replace() {
            trace_log!("Query-only replace to '{}' suppressed", update.location);
            return;
        }

        let snapshot = self.resolve(&self.history.location().pathname);
        let delivered = self.listeners.notify(&snapshot);
        debug_log!(
            "{:?} to '{}' delivered to {} listeners",
            update.action,
            update.location,
            delivered
        );
    }

    fn resolve(&self, pathname: &str) -> P::Snapshot {
        #[cfg(feature = "cache")]
        let routes = {
            let cached = self.cache.borrow_mut().get(pathname);
            match cached {
                Some(routes) => routes,
                None => {
                    let routes = P::resolve(&self.table, pathname);
                    self.cache
                        .borrow_mut()
                        .insert(pathname.to_string(), routes.clone());
                    routes
                }
            }
        };
        #[cfg(not(feature = "cache"))]
        let routes = P::resolve(&self.table, pathname);

        P::snapshot(routes)
    }
}

impl<P: ResolutionPolicy> Drop for Inner<P> {
    fn drop(&mut self) {
        self.hub.unsubscribe();
    }
}

/// Named-route router bound to a navigation history
///
/// `P` selects how the active route is resolved: [`FirstMatch`] (the default)
/// yields `Option<Rc<ActiveRoute>>`, [`AllMatches`](crate::AllMatches) yields
/// `Rc<ActiveRoutes>`.
///
/// Cloning yields another handle to the same router, so listeners can capture
/// one and navigate from inside a notification.
///
/// # Example
///
/// ```
/// use route_registry::{History, MemoryHistory, QueryParams, RouteParams, Router};
///
/// let history = MemoryHistory::new("/");
/// let router = Router::builder()
///     .route("home", "/")
///     .route("post", "/posts/:slug")
///     .base("/blog")
///     .build(history.clone())
///     .unwrap();
///
/// let params = RouteParams::new().with("slug", "hello world");
/// let query: QueryParams = [("ref", "feed")].into_iter().collect();
/// router.push_with_query("post", &params, &query).unwrap();
///
/// assert_eq!(history.location().href(), "/blog/posts/hello%20world?ref=feed");
/// assert_eq!(router.pathname(), "/posts/hello%20world");
/// assert_eq!(router.current().unwrap().params.get("slug"), Some("hello world"));
/// ```
pub struct Router<P: ResolutionPolicy = FirstMatch> {
    inner: Rc<Inner<P>>,
}

impl Router {
    /// Start configuring a router
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }
}

impl<P: ResolutionPolicy> Router<P> {
    /// Look up a route by name
    pub fn route(&self, name: &str) -> RouterResult<&RouteDescriptor> {
        self.inner.table.get(name)
    }

    /// All routes in declaration order
    pub fn routes(&self) -> &RouteTable {
        &self.inner.table
    }

    /// Build the full pathname (base included) of a named route
    pub fn url(&self, name: &str, params: &RouteParams) -> RouterResult<String> {
        self.inner.table.url(name, params)
    }

    /// Navigate to a named route, adding a history entry
    pub fn push(&self, name: &str, params: &RouteParams) -> RouterResult<()> {
        self.push_location(self.location_for(name, params, None)?);
        Ok(())
    }

    /// Like [`Router::push`], with a search string built from `query`
    pub fn push_with_query(
        &self,
        name: &str,
        params: &RouteParams,
        query: &QueryParams,
    ) -> RouterResult<()> {
        self.push_location(self.location_for(name, params, Some(query))?);
        Ok(())
    }

    /// Navigate to a named route, overwriting the current history entry
    pub fn replace(&self, name: &str, params: &RouteParams) -> RouterResult<()> {
        self.replace_location(self.location_for(name, params, None)?);
        Ok(())
    }

    /// Like [`Router::replace`], with a search string built from `query`
    pub fn replace_with_query(
        &self,
        name: &str,
        params: &RouteParams,
        query: &QueryParams,
    ) -> RouterResult<()> {
        self.replace_location(self.location_for(name, params, Some(query))?);
        Ok(())
    }

    fn location_for(
        &self,
        name: &str,
        params: &RouteParams,
        query: Option<&QueryParams>,
    ) -> RouterResult<Location> {
        let pathname = self.url(name, params)?;
        let search = query.map(QueryParams::to_query_string).unwrap_or_default();
        Ok(Location::new(pathname, search))
    }

    fn push_location(&self, location: Location) {
        debug_log!("Push to '{}'", location);
        self.inner
            .history
            .push(location, NavigationIntent::Structural);
    }

    fn replace_location(&self, location: Location) {
        debug_log!("Replace with '{}'", location);
        self.inner
            .history
            .replace(location, NavigationIntent::Structural);
    }

    /// Set (`Some`) or remove (`None`) one query parameter
    ///
    /// Replaces the current entry with the same pathname. Listeners are not
    /// notified.
    pub fn set_query(&self, key: &str, value: Option<&str>) {
        let location = self.inner.history.location();
        let mut query = QueryParams::parse(&location.search);
        match value {
            Some(value) => query.set(key, value),
            None => {
                query.remove(key);
            }
        }

        let location = Location::new(location.pathname, query.to_query_string());
        debug_log!("Query update '{}' to '{}'", key, location);
        self.inner
            .history
            .replace(location, NavigationIntent::QueryOnly);
    }

    /// Register a listener for active route changes
    ///
    /// The listener runs once per structural navigation with a newly allocated
    /// snapshot, including when the same route becomes active again.
    pub fn listen(&self, listener: impl Fn(&P::Snapshot) + 'static) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    /// Active route(s) for the current location
    pub fn current(&self) -> P::Snapshot {
        self.inner.resolve(&self.inner.history.location().pathname)
    }

    /// Query parameters of the current location
    pub fn queries(&self) -> QueryParams {
        QueryParams::parse(&self.inner.history.location().search)
    }

    /// Current pathname without the base prefix
    pub fn pathname(&self) -> String {
        let location = self.inner.history.location();
        self.inner.table.strip_base(&location.pathname).to_string()
    }

    /// Current location as reported by the history
    pub fn location(&self) -> Location {
        self.inner.history.location()
    }

    /// Normalized base prefix (empty when none)
    pub fn base(&self) -> &str {
        self.inner.table.base()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.borrow().stats()
    }
}

impl<P: ResolutionPolicy> Clone for Router<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: ResolutionPolicy> fmt::Debug for Router<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.inner.table)
            .field("location", &self.inner.history.location())
            .field("listeners", &self.inner.listeners)
            .finish()
    }
}

/// Router configuration
///
/// Obtained from [`Router::builder`]. Routes are kept in declaration order;
/// nothing is compiled until [`RouterBuilder::build`].
pub struct RouterBuilder<P: ResolutionPolicy = FirstMatch> {
    routes: Vec<(String, String)>,
    base: Option<String>,
    #[cfg(feature = "cache")]
    cache_capacity: usize,
    policy: PhantomData<fn() -> P>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            base: None,
            #[cfg(feature = "cache")]
            cache_capacity: ResolutionCache::DEFAULT_CAPACITY,
            policy: PhantomData,
        }
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ResolutionPolicy> RouterBuilder<P> {
    /// Declare a route
    pub fn route(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.routes.push((name.into(), pattern.into()));
        self
    }

    /// Declare several routes in order
    pub fn routes<I, K, V>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.routes.extend(
            routes
                .into_iter()
                .map(|(name, pattern)| (name.into(), pattern.into())),
        );
        self
    }

    /// Prefix prepended to every pattern
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Switch the resolution policy
    pub fn policy<Q: ResolutionPolicy>(self) -> RouterBuilder<Q> {
        RouterBuilder {
            routes: self.routes,
            base: self.base,
            #[cfg(feature = "cache")]
            cache_capacity: self.cache_capacity,
            policy: PhantomData,
        }
    }

    /// Resolution cache size, 0 disables it
    #[cfg(feature = "cache")]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Compile every route and attach to `history`
    ///
    /// Fails with [`RouterError::InvalidPattern`](crate::RouterError::InvalidPattern)
    /// without subscribing to the history.
    pub fn build(self, history: impl History + 'static) -> RouterResult<Router<P>> {
        let table = RouteTable::new(self.routes, self.base.as_deref())?;
        let history: Rc<dyn History> = Rc::new(history);
        #[cfg(feature = "cache")]
        let cache = ResolutionCache::with_capacity(self.cache_capacity);

        let inner = Rc::new_cyclic(|weak: &Weak<Inner<P>>| {
            let weak = weak.clone();
            let hub = history.listen(Rc::new(move |update: &HistoryUpdate| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_update(update);
                }
            }));

            Inner {
                table,
                history,
                listeners: ListenerSet::new(),
                #[cfg(feature = "cache")]
                cache: RefCell::new(cache),
                hub,
            }
        });
        Ok(Router { inner })
    }
}

impl<P: ResolutionPolicy> fmt::Debug for RouterBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.routes)
            .field("base", &self.base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AllMatches, MemoryHistory, NavigationAction};
    use std::cell::{Cell, RefCell};

    fn router(history: &MemoryHistory) -> Router {
        Router::builder()
            .route("home", "/")
            .route("about", "/about")
            .route("user", "/users/:id")
            .build(history.clone())
            .unwrap()
    }

    fn count_notifications<P: ResolutionPolicy>(router: &Router<P>) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        router.listen(move |_| sink.set(sink.get() + 1));
        count
    }

    #[test]
    fn test_current_resolves_initial_location() {
        let history = MemoryHistory::new("/users/5");
        let router = router(&history);

        let active = router.current().unwrap();
        assert_eq!(active.name, "user");
        assert_eq!(active.params.get("id"), Some("5"));
    }

    #[test]
    fn test_current_none_when_unmatched() {
        let history = MemoryHistory::new("/nowhere");
        assert!(router(&history).current().is_none());
    }

    #[test]
    fn test_push_adds_entry_and_notifies() {
        let history = MemoryHistory::new("/");
        let router = router(&history);
        let count = count_notifications(&router);

        router.push("about", &RouteParams::new()).unwrap();

        assert_eq!(count.get(), 1);
        assert_eq!(history.len(), 2);
        assert_eq!(router.pathname(), "/about");
    }

    #[test]
    fn test_replace_overwrites_entry() {
        let history = MemoryHistory::new("/");
        let router = router(&history);
        let count = count_notifications(&router);

        router
            .replace("user", &RouteParams::new().with("id", "3"))
            .unwrap();

        assert_eq!(count.get(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_entry().intent, NavigationIntent::Structural);
        assert_eq!(router.location().href(), "/users/3");
    }

    #[test]
    fn test_unknown_route_does_not_navigate() {
        let history = MemoryHistory::new("/");
        let router = router(&history);
        let count = count_notifications(&router);

        let err = router.push("missing", &RouteParams::new()).unwrap_err();
        assert!(err.is_route_not_found());
        assert!(router.route("missing").is_err());
        assert_eq!(history.len(), 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_missing_param_does_not_navigate() {
        let history = MemoryHistory::new("/");
        let router = router(&history);

        let err = router.push("user", &RouteParams::new()).unwrap_err();
        assert!(err.is_missing_param());
        assert_eq!(router.pathname(), "/");
    }

    #[test]
    fn test_set_query_is_query_only_replace() {
        let history = MemoryHistory::new("/about?page=1");
        let router = router(&history);
        let count = count_notifications(&router);

        let updates = Rc::new(RefCell::new(Vec::new()));
        let sink = updates.clone();
        history.listen(Rc::new(move |update: &HistoryUpdate| {
            sink.borrow_mut().push(update.clone());
        }));

        router.set_query("sort", Some("desc"));
        router.set_query("page", None);

        assert_eq!(count.get(), 0);
        assert_eq!(history.len(), 1);
        assert_eq!(router.location().href(), "/about?sort=desc");

        let updates = updates.borrow();
        assert_eq!(updates.len(), 2);
        assert!(updates.iter().all(HistoryUpdate::is_query_only_replace));
        assert_eq!(updates[0].action, NavigationAction::Replace);
    }

    #[test]
    fn test_set_query_last_key_removed_clears_search() {
        let history = MemoryHistory::new("/about?tab=1");
        let router = router(&history);

        router.set_query("tab", None);
        assert_eq!(router.location().search, "");
        assert!(router.queries().is_empty());
    }

    #[test]
    fn test_each_notification_is_a_new_snapshot() {
        let history = MemoryHistory::new("/");
        let router = router(&history);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        router.listen(move |active| sink.borrow_mut().push(active.clone()));

        router.push("about", &RouteParams::new()).unwrap();
        router.push("about", &RouteParams::new()).unwrap();

        let seen = seen.borrow();
        let first = seen[0].as_ref().unwrap();
        let second = seen[1].as_ref().unwrap();
        assert_eq!(first, second);
        assert!(!Rc::ptr_eq(first, second));
    }

    #[test]
    fn test_pop_notifies() {
        let history = MemoryHistory::new("/");
        let router = router(&history);
        router.push("about", &RouteParams::new()).unwrap();

        let names = Rc::new(RefCell::new(Vec::new()));
        let sink = names.clone();
        router.listen(move |active| {
            let name = active.as_ref().map(|route| route.name.clone());
            sink.borrow_mut().push(name);
        });

        assert!(history.back());
        assert_eq!(*names.borrow(), [Some("home".to_string())]);
    }

    #[test]
    fn test_pop_to_query_only_entry_notifies() {
        let history = MemoryHistory::new("/");
        let router = router(&history);
        router.set_query("q", Some("x"));
        router.push("about", &RouteParams::new()).unwrap();
        let count = count_notifications(&router);

        history.back();
        assert_eq!(count.get(), 1);
        assert_eq!(router.queries().get("q"), Some("x"));
    }

    #[test]
    fn test_all_matches_policy() {
        let history = MemoryHistory::new("/settings/profile");
        let router = Router::builder()
            .route("root", "/")
            .route("settings", "/settings")
            .route("settings_profile", "/settings/profile")
            .policy::<AllMatches>()
            .build(history)
            .unwrap();

        let active = router.current();
        assert_eq!(active.len(), 2);
        assert!(active.contains("settings"));
        assert!(active.contains("settings_profile"));
    }

    #[test]
    fn test_invalid_pattern_fails_build() {
        let history = MemoryHistory::new("/");
        let err = Router::builder()
            .route("bad", "/files/*rest/tail")
            .build(history.clone())
            .unwrap_err();

        assert!(err.is_invalid_pattern());
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn test_dropping_last_handle_releases_history() {
        let history = MemoryHistory::new("/");
        let router = router(&history);
        let handle = router.clone();
        assert_eq!(history.listener_count(), 1);

        drop(router);
        assert_eq!(history.listener_count(), 1);
        drop(handle);
        assert_eq!(history.listener_count(), 0);

        history.push(Location::parse("/about"), NavigationIntent::Structural);
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_resolution_is_cached() {
        let history = MemoryHistory::new("/users/1");
        let router = router(&history);

        router.current();
        router.current();

        let stats = router.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_cache_can_be_disabled() {
        let router = Router::builder()
            .route("home", "/")
            .cache_capacity(0)
            .build(MemoryHistory::new("/"))
            .unwrap();

        assert!(router.current().is_some());
        assert!(router.current().is_some());
        assert_eq!(router.cache_stats(), CacheStats::default());
    }
}
