use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use structure::StructureRecord;

/// What changed in a [`SelectionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Current(Option<Rc<StructureRecord>>),
    Loading(bool),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&StoreChange)>;

struct StoreInner {
    current: RefCell<Option<Rc<StructureRecord>>>,
    loading: Cell<bool>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_subscription: Cell<u64>,
}

/// Shared selection state for one page: the loaded structure and a loading
/// flag.
///
/// Single-threaded by construction (`Rc`, not `Send`). Handles are cheap
/// clones of the same state and are only obtainable from a [`StoreProvider`].
/// Listeners run synchronously after the state has been updated and may read
/// or mutate the store themselves.
#[derive(Clone)]
pub struct SelectionStore {
    inner: Rc<StoreInner>,
}

impl fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionStore")
            .field("current", &self.current().map(|r| r.id.clone()))
            .field("loading", &self.loading())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl SelectionStore {
    fn new() -> Self {
        Self {
            inner: Rc::new(StoreInner {
                current: RefCell::new(None),
                loading: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
                next_subscription: Cell::new(1),
            }),
        }
    }

    pub fn current(&self) -> Option<Rc<StructureRecord>> {
        self.inner.current.borrow().clone()
    }

    /// Replaces the current record. Always notifies: a re-fetch of the same
    /// identifier is still a new record.
    pub fn set_current(&self, record: Option<StructureRecord>) {
        let record = record.map(Rc::new);
        *self.inner.current.borrow_mut() = record.clone();
        self.notify(&StoreChange::Current(record));
    }

    pub fn loading(&self) -> bool {
        self.inner.loading.get()
    }

    /// Notifies only when the flag actually flips.
    pub fn set_loading(&self, loading: bool) {
        if self.inner.loading.replace(loading) != loading {
            self.notify(&StoreChange::Loading(loading));
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&StoreChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    /// Returns `true` if the subscription was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn notify(&self, change: &StoreChange) {
        // Snapshot so listeners can (un)subscribe or write back re-entrantly.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(change);
        }
    }
}

/// Owns the page's [`SelectionStore`]; consumers borrow handles from it.
#[derive(Debug)]
pub struct StoreProvider {
    store: SelectionStore,
}

impl Default for StoreProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreProvider {
    pub fn new() -> Self {
        Self {
            store: SelectionStore::new(),
        }
    }

    pub fn store(&self) -> SelectionStore {
        self.store.clone()
    }
}
