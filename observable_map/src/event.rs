//! A minimal synchronous publish/subscribe primitive.
//!
//! [`Listeners`] keeps callbacks in registration order and invokes all of them, in that order,
//! whenever an event is emitted. Nothing is caught: a panicking listener unwinds straight into
//! the code that emitted the event, and the listeners after it are not called.
use std::fmt;

/// Handle identifying a registered listener, used to unsubscribe it again.
///
/// Identifiers are unique within the registry that handed them out and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// An ordered registry of callbacks of type `F`, typically a `dyn FnMut(..)` trait object.
pub struct Listeners<F: ?Sized> {
    listeners: Vec<(ListenerId, Box<F>)>,
    next_id: u64,
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Listeners {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<F: ?Sized> fmt::Debug for Listeners<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|(id, _)| id))
            .finish()
    }
}

impl<F: ?Sized> Listeners<F> {
    /// Returns an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` after all currently registered listeners.
    pub fn subscribe(&mut self, listener: Box<F>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes the listener with the given identifier.
    ///
    /// Returns `false` if no such listener is registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        // ids are handed out in increasing order, so the list stays sorted by id
        match self.listeners.binary_search_by_key(&id, |&(id, _)| id) {
            Ok(pos) => {
                self.listeners.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Removes all listeners. Identifiers handed out before are not reused.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Passes every listener, in registration order, to `call`.
    pub fn emit(&mut self, mut call: impl FnMut(&mut F)) {
        for (_, listener) in self.listeners.iter_mut() {
            call(listener);
        }
    }
}
