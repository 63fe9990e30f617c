//! [ObservableMap] is a map that preserves the insertion order of its entries and notifies
//! listeners about every change to its contents, so that data-binding layers can react to
//! additions, removals, value replacements and bulk clears without polling.
//!
//! Entries are kept in two index-aligned `Vec`s, one for keys and one for values, supplemented
//! by a hashbrown `HashTable` that maps each key to its current position. Lookups are
//! therefore hash based, while iteration always follows insertion order. Removing an entry
//! compacts both sequences and renumbers the positions after it.
//!
//! Notifications are delivered synchronously through two channels:
//!
//! * entry-level changes ([`MapChange`]), identified by a [`MapEvent`],
//! * property changes ([`Property`]), naming the aggregate that changed (`Count`, `Keys`,
//!   `Values` and `Item[]`).
//!
//! Listeners are plain closures and run while the mutating call is still in progress. As that
//! call holds a mutable borrow of the map, a listener cannot mutate the map it is observing.
//!
//! Whether replacing a value counts as a change is decided by a [`ChangeDetection`] policy.
//! The default, [`ByIdentity`], compares instances rather than contents: storing a different
//! `Rc` holding an equal value is reported, storing a clone of the same `Rc` is not.
//!
//! The map is meant for single-threaded use. Callers sharing one across threads have to
//! synchronize access themselves.

mod index_table;
mod util;

pub mod change;
pub mod error;
pub mod event;
pub mod observable_map;

pub use change::{
    Always, ByIdentity, ByValue, ChangeDetection, Instance, MapChange, MapEvent, Property,
};
pub use error::{MapError, Result};
pub use event::{ListenerId, Listeners};
pub use observable_map::{DefaultBuildHasher, ObservableMap};

#[cfg(test)]
mod test_map;
