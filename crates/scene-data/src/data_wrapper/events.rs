use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

pub type ListenerId = u64;

pub(crate) type Listener = Rc<dyn Fn()>;

/// Listener list with pause/resume batching.
///
/// Listeners are `Fn` so a listener that mutates the wrapper (and so
/// re-enters `emit`) does not hit a borrowed cell. Re-entrancy is not
/// otherwise limited: a listener that keeps writing loops forever.
pub(crate) struct Notifier {
    next_id: Cell<ListenerId>,
    listeners: RefCell<BTreeMap<ListenerId, Listener>>,
    paused: Cell<usize>,
    pending: Cell<bool>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            listeners: RefCell::new(BTreeMap::new()),
            paused: Cell::new(0),
            pending: Cell::new(false),
        }
    }

    pub(crate) fn subscribe(&self, listener: Listener) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id.saturating_add(1));
        self.listeners.borrow_mut().insert(id, listener);
        id
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(&id).is_some()
    }

    pub(crate) fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Runs the listeners; returns `false` when the call was swallowed by a pause.
    pub(crate) fn emit(&self) -> bool {
        if self.paused.get() > 0 {
            self.pending.set(true);
            return false;
        }
        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();
        for (id, listener) in snapshot {
            // Skip listeners removed by an earlier listener in this round.
            if self.listeners.borrow().contains_key(&id) {
                listener();
            }
        }
        true
    }

    pub(crate) fn pause(&self) {
        self.paused.set(self.paused.get() + 1);
    }

    /// Leaves one pause level; returns `true` once no pause is left.
    pub(crate) fn resume(&self) -> bool {
        match self.paused.get() {
            0 => true,
            1 => {
                self.paused.set(0);
                self.pending.set(false);
                true
            }
            n => {
                self.paused.set(n - 1);
                false
            }
        }
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.get() > 0
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.get()
    }
}
