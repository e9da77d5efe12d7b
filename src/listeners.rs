//! Listener registry with snapshot-on-notify semantics
//!
//! Both the navigation history and the router fan events out through a
//! [`ListenerSet`]. Notification copies the current listener list before
//! invoking anything, so listeners may subscribe, unsubscribe or trigger a
//! nested notification while a fan-out is in flight.
//!
//! # Example
//!
//! ```
//! use route_registry::ListenerSet;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let set = ListenerSet::<u32>::new();
//! let seen = Rc::new(Cell::new(0));
//!
//! let sink = seen.clone();
//! let subscription = set.subscribe(move |value| sink.set(*value));
//!
//! set.notify(&7);
//! assert_eq!(seen.get(), 7);
//!
//! subscription.unsubscribe();
//! assert_eq!(set.notify(&9), 0);
//! assert_eq!(seen.get(), 7);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared callback invoked with each event
pub type Listener<E> = Rc<dyn Fn(&E)>;

/// Identity of one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registry<E> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(ListenerId, Listener<E>)>>,
}

trait Unsubscribe {
    fn remove(&self, id: ListenerId) -> bool;
    fn contains(&self, id: ListenerId) -> bool;
}

impl<E> Unsubscribe for Registry<E> {
    fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    fn contains(&self, id: ListenerId) -> bool {
        self.entries.borrow().iter().any(|(entry, _)| *entry == id)
    }
}

/// Set of listeners for events of type `E`
///
/// Cloning yields another handle to the same set.
pub struct ListenerSet<E> {
    registry: Rc<Registry<E>>,
}

impl<E: 'static> ListenerSet<E> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a listener
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        self.subscribe_rc(Rc::new(listener))
    }

    /// Register an already shared listener
    ///
    /// Registering the same `Rc` twice creates two independent registrations.
    pub fn subscribe_rc(&self, listener: Listener<E>) -> Subscription {
        let id = ListenerId(self.registry.next_id.get());
        self.registry.next_id.set(id.0 + 1);
        self.registry.entries.borrow_mut().push((id, listener));

        let registry = Rc::downgrade(&self.registry);
        let registry: Weak<dyn Unsubscribe> = registry;
        Subscription { registry, id }
    }

    /// Invoke every listener registered at call time
    ///
    /// Returns how many listeners were invoked.
    pub fn notify(&self, event: &E) -> usize {
        let snapshot: Vec<Listener<E>> = self
            .registry
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.registry.entries.borrow().len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.registry.entries.borrow().is_empty()
    }
}

impl<E: 'static> Default for ListenerSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ListenerSet<E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<E> fmt::Debug for ListenerSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.registry.entries.borrow().len())
            .finish()
    }
}

/// Handle returned by `subscribe`
///
/// Dropping a subscription keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    registry: Weak<dyn Unsubscribe>,
    id: ListenerId,
}

impl Subscription {
    /// Remove the listener. Later calls are no-ops.
    ///
    /// A fan-out already in progress still reaches this listener.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    /// Check if the listener is still registered
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }

    /// Registration identity
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<usize>>, impl Fn(&u32) + 'static) {
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        (count, move |_: &u32| sink.set(sink.get() + 1))
    }

    #[test]
    fn test_notify_reaches_every_listener() {
        let set = ListenerSet::<u32>::new();
        let (a, listener_a) = counter();
        let (b, listener_b) = counter();
        set.subscribe(listener_a);
        set.subscribe(listener_b);

        assert_eq!(set.notify(&1), 2);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let set = ListenerSet::<u32>::new();
        let (count, listener) = counter();
        let subscription = set.subscribe(listener);
        assert!(subscription.is_active());

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());
        assert!(set.is_empty());

        set.notify(&1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_unsubscribe_removes_only_its_registration() {
        let set = ListenerSet::<u32>::new();
        let shared: Listener<u32> = Rc::new(|_: &u32| {});
        let first = set.subscribe_rc(shared.clone());
        let second = set.subscribe_rc(shared);
        assert_ne!(first.id(), second.id());

        first.unsubscribe();
        assert_eq!(set.len(), 1);
        assert!(second.is_active());
    }

    #[test]
    fn test_listener_added_during_notify_waits_for_next_cycle() {
        let set = ListenerSet::<u32>::new();
        let (late, late_listener) = counter();
        let late_listener: Listener<u32> = Rc::new(late_listener);

        let handle = set.clone();
        set.subscribe(move |_| {
            handle.subscribe_rc(late_listener.clone());
        });

        set.notify(&1);
        assert_eq!(late.get(), 0);

        set.notify(&2);
        assert_eq!(late.get(), 1);
    }

    #[test]
    fn test_subscription_outlives_set() {
        let set = ListenerSet::<u32>::new();
        let subscription = set.subscribe(|_| {});
        drop(set);

        assert!(!subscription.is_active());
        subscription.unsubscribe();
    }
}
