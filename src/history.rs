//! Navigation history
//!
//! [`History`] is the navigation engine the router drives: it owns the current
//! [`Location`], records push/replace entries and reports every entry change to
//! its listeners. [`MemoryHistory`] is the in-process implementation:
//! - Forward/backward navigation
//! - History truncation on new navigation
//! - Configurable history limits
//!
//! Each entry remembers the [`NavigationIntent`] it was created with, so a
//! listener can tell a query-only rewrite from a structural navigation.

use crate::listeners::{Listener, ListenerSet, Subscription};
use crate::{trace_log, NavigationAction};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Pathname plus search string
///
/// `search` is either empty or starts with `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Path portion, always starting with `/`
    pub pathname: String,
    /// Query portion including its leading `?`, or empty
    pub search: String,
}

impl Location {
    /// Create a location, normalizing both parts
    ///
    /// ```
    /// use route_registry::Location;
    ///
    /// let location = Location::new("users", "tab=posts");
    /// assert_eq!(location.pathname, "/users");
    /// assert_eq!(location.search, "?tab=posts");
    /// assert_eq!(Location::new("/", "?").search, "");
    /// ```
    pub fn new(pathname: impl Into<String>, search: impl Into<String>) -> Self {
        let mut pathname = pathname.into();
        if !pathname.starts_with('/') {
            pathname.insert(0, '/');
        }

        let search = search.into();
        let search = match search.strip_prefix('?').unwrap_or(&search) {
            "" => String::new(),
            query => format!("?{}", query),
        };

        Self { pathname, search }
    }

    /// Split an href such as `/users/1?tab=posts#top`
    ///
    /// Any fragment is discarded.
    pub fn parse(href: &str) -> Self {
        let href = href.split_once('#').map_or(href, |(before, _)| before);
        match href.split_once('?') {
            Some((pathname, search)) => Self::new(pathname, search),
            None => Self::new(href, ""),
        }
    }

    /// Pathname followed by search
    pub fn href(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("/", "")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pathname, self.search)
    }
}

/// Why an entry was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NavigationIntent {
    /// A navigation that may change the active route
    #[default]
    Structural,
    /// Only the search string changed
    QueryOnly,
}

/// Navigation history entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Location of this entry
    pub location: Location,
    /// Intent the entry was written with
    pub intent: NavigationIntent,
}

impl HistoryEntry {
    /// Create a new history entry
    pub fn new(location: Location, intent: NavigationIntent) -> Self {
        Self { location, intent }
    }
}

/// Entry change reported to history listeners
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryUpdate {
    /// How the entry was reached
    pub action: NavigationAction,
    /// The new current location
    pub location: Location,
    /// Intent stored on the new current entry
    pub intent: NavigationIntent,
}

impl HistoryUpdate {
    /// Check if this update only rewrote the search string of the current entry
    pub fn is_query_only_replace(&self) -> bool {
        self.action == NavigationAction::Replace && self.intent == NavigationIntent::QueryOnly
    }
}

/// Navigation engine contract
///
/// Listeners are invoked synchronously from `push`/`replace` (and any other
/// entry change) after the new entry is current. Implementations must not
/// hold interior borrows while listeners run: a listener may navigate again.
pub trait History {
    /// The current location
    fn location(&self) -> Location;

    /// Append an entry, discarding forward entries
    fn push(&self, location: Location, intent: NavigationIntent);

    /// Overwrite the current entry
    fn replace(&self, location: Location, intent: NavigationIntent);

    /// Subscribe to entry changes
    fn listen(&self, listener: Listener<HistoryUpdate>) -> Subscription;
}

#[derive(Debug)]
struct Stack {
    entries: Vec<HistoryEntry>,
    current: usize,
    max_size: usize,
}

impl Stack {
    fn current_entry(&self) -> &HistoryEntry {
        &self.entries[self.current]
    }

    fn update(&self, action: NavigationAction) -> HistoryUpdate {
        let entry = self.current_entry();
        HistoryUpdate {
            action,
            location: entry.location.clone(),
            intent: entry.intent,
        }
    }

    /// Remove oldest entries, keeping the current one reachable
    fn enforce_size_limit(&mut self) {
        if self.max_size > 0 && self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.current = self.current.saturating_sub(excess);
        }
    }
}

/// In-memory navigation history
///
/// Cloning yields another handle to the same stack.
///
/// # Example
///
/// ```
/// use route_registry::{History, Location, MemoryHistory, NavigationIntent};
///
/// let history = MemoryHistory::new("/");
/// history.push(Location::parse("/users?page=2"), NavigationIntent::Structural);
/// assert_eq!(history.location().search, "?page=2");
///
/// history.back();
/// assert_eq!(history.location().pathname, "/");
/// ```
#[derive(Clone)]
pub struct MemoryHistory {
    stack: Rc<RefCell<Stack>>,
    listeners: ListenerSet<HistoryUpdate>,
}

impl MemoryHistory {
    /// Default maximum number of entries
    pub const DEFAULT_MAX_SIZE: usize = 1000;

    /// Create a new history whose only entry is `initial` (an href)
    pub fn new(initial: &str) -> Self {
        Self::with_max_size(initial, Self::DEFAULT_MAX_SIZE)
    }

    /// Create with custom max size (0 = unlimited)
    pub fn with_max_size(initial: &str, max_size: usize) -> Self {
        Self {
            stack: Rc::new(RefCell::new(Stack {
                entries: vec![HistoryEntry::new(
                    Location::parse(initial),
                    NavigationIntent::Structural,
                )],
                current: 0,
                max_size,
            })),
            listeners: ListenerSet::new(),
        }
    }

    /// Go back one entry
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Go forward one entry
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move `delta` entries through the stack
    ///
    /// Returns `false` (and notifies nobody) if the target is out of range
    /// or `delta` is zero.
    pub fn go(&self, delta: isize) -> bool {
        let update = {
            let mut stack = self.stack.borrow_mut();
            let Some(target) = stack.current.checked_add_signed(delta) else {
                return false;
            };
            if delta == 0 || target >= stack.entries.len() {
                return false;
            }
            stack.current = target;
            stack.update(NavigationAction::Pop)
        };
        self.dispatch(&update);
        true
    }

    /// Check if can go back
    pub fn can_go_back(&self) -> bool {
        self.stack.borrow().current > 0
    }

    /// Check if can go forward
    pub fn can_go_forward(&self) -> bool {
        let stack = self.stack.borrow();
        stack.current + 1 < stack.entries.len()
    }

    /// Get current entry
    pub fn current_entry(&self) -> HistoryEntry {
        self.stack.borrow().current_entry().clone()
    }

    /// Get all entries
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.stack.borrow().entries.clone()
    }

    /// Get current index
    pub fn index(&self) -> usize {
        self.stack.borrow().current
    }

    /// Get history length
    pub fn len(&self) -> usize {
        self.stack.borrow().entries.len()
    }

    /// Always false: a history holds at least its current entry
    pub fn is_empty(&self) -> bool {
        self.stack.borrow().entries.is_empty()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn dispatch(&self, update: &HistoryUpdate) {
        trace_log!(
            "History {:?} to '{}' ({:?})",
            update.action,
            update.location,
            update.intent
        );
        self.listeners.notify(update);
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Location {
        self.stack.borrow().current_entry().location.clone()
    }

    fn push(&self, location: Location, intent: NavigationIntent) {
        let update = {
            let mut stack = self.stack.borrow_mut();
            let keep = stack.current + 1;
            stack.entries.truncate(keep);
            stack.entries.push(HistoryEntry::new(location, intent));
            stack.current += 1;
            stack.enforce_size_limit();
            stack.update(NavigationAction::Push)
        };
        self.dispatch(&update);
    }

    fn replace(&self, location: Location, intent: NavigationIntent) {
        let update = {
            let mut stack = self.stack.borrow_mut();
            let current = stack.current;
            stack.entries[current] = HistoryEntry::new(location, intent);
            stack.update(NavigationAction::Replace)
        };
        self.dispatch(&update);
    }

    fn listen(&self, listener: Listener<HistoryUpdate>) -> Subscription {
        self.listeners.subscribe_rc(listener)
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHistory")
            .field("stack", &self.stack.borrow())
            .field("listeners", &self.listeners)
            .finish()
    }
}
