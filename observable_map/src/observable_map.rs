//! [ObservableMap] is an insertion-ordered map that notifies listeners about every change.
use crate::{
    change::{ByIdentity, ChangeDetection, MapChange, MapEvent, Property},
    error::{MapError, Result},
    event::{ListenerId, Listeners},
    index_table::{self, IndexTable},
    util::{impl_double_ended_iterator, impl_iterator},
};
use core::hash::Hash;
use std::{
    borrow::Borrow,
    hash::{BuildHasher, BuildHasherDefault},
    marker::PhantomData,
    ops::Index,
};
use zwohash::ZwoHasher;

/// The hasher used by an [`ObservableMap`] unless another one is specified.
pub type DefaultBuildHasher = BuildHasherDefault<ZwoHasher>;

/// Callback type for entry-level change notifications.
pub type ChangeListener<K, V> = dyn FnMut(&MapChange<'_, K, V>);

/// Callback type for property-changed notifications.
pub type PropertyListener = dyn FnMut(Property);

/// A map that remembers the order in which keys were inserted and notifies listeners whenever
/// its contents change.
///
/// Keys and values are stored in two index-aligned sequences, supplemented by a hash table
/// mapping each key to its position. Iteration follows insertion order. Removing an entry
/// shifts all later entries down by one position, so the relative order of the remaining
/// entries is preserved.
///
/// Listeners are notified synchronously, after the mutation has been fully applied:
///
/// * appending an entry reports [`Property::ALL`] and then [`MapEvent::ItemAdded`],
/// * removing an entry reports [`Property::ALL`] and then [`MapEvent::ItemRemoved`],
/// * replacing a value reports [`MapEvent::ItemChanged`] if the policy `C` considers the
///   replacement a change, and no property changes,
/// * clearing reports [`MapEvent::Cleared`] and then [`Property::ALL`].
///
/// With the default [`ByIdentity`] policy a replacement is a change whenever a different
/// instance is stored, even if it compares equal to the previous one.
pub struct ObservableMap<K, V, S = DefaultBuildHasher, C = ByIdentity> {
    index_table: IndexTable,
    keys: Vec<K>,
    values: Vec<V>,
    build_hasher: S,
    changes: Listeners<ChangeListener<K, V>>,
    properties: Listeners<PropertyListener>,
    policy: PhantomData<C>,
}

/// Result of looking up a key for insertion.
enum Slot<K, V> {
    /// The key was absent and has been appended at `index`.
    Appended(usize),
    /// The key is already present at `index`; the rejected key and value are handed back.
    Occupied { index: usize, key: K, value: V },
}

impl<K, V, S: Default, C> Default for ObservableMap<K, V, S, C> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S: Default, C> ObservableMap<K, V, S, C> {
    /// Returns an empty map.
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns an empty map with room for `capacity` entries.
    ///
    /// The capacity is only a hint, the map still starts out empty.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S, C> ObservableMap<K, V, S, C> {
    /// Returns an empty map with the provided BuildHasher.
    pub fn with_hasher(build_hasher: S) -> Self {
        ObservableMap {
            index_table: IndexTable::default(),
            keys: Vec::new(),
            values: Vec::new(),
            build_hasher,
            changes: Listeners::new(),
            properties: Listeners::new(),
            policy: PhantomData,
        }
    }
    /// Returns an empty map with room for `capacity` entries and the provided BuildHasher.
    pub fn with_capacity_and_hasher(capacity: usize, build_hasher: S) -> Self {
        ObservableMap {
            index_table: IndexTable::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            build_hasher,
            changes: Listeners::new(),
            properties: Listeners::new(),
            policy: PhantomData,
        }
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug, S, C> std::fmt::Debug for ObservableMap<K, V, S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, C> ObservableMap<K, V, S, C> {
    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.keys.len()
    }
    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
    /// Returns the number of entries the map can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.keys.capacity().min(self.values.capacity())
    }
    /// Returns all keys in insertion order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }
    /// Returns all values, in the order of their keys.
    pub fn values(&self) -> &[V] {
        &self.values
    }
    /// Returns the key and value at the given position, if it exists.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        Some((self.keys.get(index)?, self.values.get(index)?))
    }
    /// Returns an iterator over all key-value pairs in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.keys.iter().zip(self.values.iter()),
        }
    }
    /// Returns `true` if some entry stores a value equal to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values.contains(value)
    }

    /// Copies all entries, in order, into `destination` starting at `offset`.
    ///
    /// Fails with [`MapError::IndexOutOfRange`] without writing anything if `offset` is past the
    /// end of `destination` or the remaining slots cannot hold every entry.
    pub fn copy_to(&self, destination: &mut [(K, V)], offset: usize) -> Result<()>
    where
        K: Clone,
        V: Clone,
    {
        let available = destination.len().saturating_sub(offset);
        if offset > destination.len() || available < self.len() {
            log::debug!(
                "copy of {} entries to offset {offset} rejected, {available} slots left",
                self.len()
            );
            return Err(MapError::IndexOutOfRange {
                offset,
                required: self.len(),
                available,
            });
        }
        for (slot, (key, value)) in destination[offset..].iter_mut().zip(self.iter()) {
            slot.0.clone_from(key);
            slot.1.clone_from(value);
        }
        Ok(())
    }

    /// Registers a listener for one kind of entry-level change.
    pub fn subscribe(
        &mut self,
        event: MapEvent,
        mut listener: impl FnMut(&MapChange<'_, K, V>) + 'static,
    ) -> ListenerId {
        self.changes.subscribe(boxed_change_listener(move |change: &MapChange<'_, K, V>| {
            if change.kind() == event {
                listener(change)
            }
        }))
    }
    /// Registers a listener for all entry-level changes.
    pub fn subscribe_all(
        &mut self,
        listener: impl FnMut(&MapChange<'_, K, V>) + 'static,
    ) -> ListenerId {
        self.changes.subscribe(boxed_change_listener(listener))
    }
    /// Removes a listener registered with [`subscribe`](Self::subscribe) or
    /// [`subscribe_all`](Self::subscribe_all).
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.changes.unsubscribe(id)
    }
    /// Registers a listener for property-changed notifications.
    pub fn on_property_changed(&mut self, listener: impl FnMut(Property) + 'static) -> ListenerId {
        self.properties.subscribe(Box::new(listener))
    }
    /// Removes a listener registered with [`on_property_changed`](Self::on_property_changed).
    pub fn unsubscribe_property(&mut self, id: ListenerId) -> bool {
        self.properties.unsubscribe(id)
    }

    fn notify(&mut self, change: MapChange<'_, K, V>) {
        self.changes.emit(|listener| listener(&change));
    }

    fn notify_structure(&mut self) {
        for property in Property::ALL {
            self.properties.emit(|listener| listener(property));
        }
    }

    /// Removes all entries from the map, but keeps the allocated memory.
    ///
    /// Reports [`MapEvent::Cleared`] followed by [`Property::ALL`], even if the map was empty.
    pub fn clear(&mut self) {
        log::trace!("clearing {} entries", self.len());
        self.values.clear();
        self.keys.clear();
        self.index_table.clear();
        self.notify(MapChange::Cleared);
        self.notify_structure();
    }
}

fn boxed_change_listener<K, V>(
    listener: impl FnMut(&MapChange<'_, K, V>) + 'static,
) -> Box<ChangeListener<K, V>> {
    Box::new(listener)
}

impl<K: Hash + Eq, V, S: BuildHasher, C> ObservableMap<K, V, S, C> {
    /// Returns the position of the entry with the specified key, if it exists.
    pub fn get_index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let hash = self.build_hasher.hash_one(key);
        self.index_table
            .find(hash, |index| self.keys[index].borrow() == key)
    }
    /// Returns `true` if the map contains an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_index_of(key).is_some()
    }
    /// Returns a reference to the value stored for `key`, if it exists.
    pub fn try_get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.get_index_of(key).map(|index| &self.values[index])
    }
    /// Returns a reference to the value stored for `key`.
    ///
    /// Fails with [`MapError::KeyNotFound`] if there is no such entry.
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.try_get(key).ok_or(MapError::KeyNotFound)
    }
    /// Returns `true` if the map contains an entry for `key` whose value equals `value`.
    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
        V: PartialEq,
    {
        self.try_get(key).is_some_and(|stored| stored == value)
    }

    /// Reserves room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        let Self {
            index_table,
            keys,
            build_hasher,
            ..
        } = self;
        index_table.reserve(additional, |index| build_hasher.hash_one(&keys[index]));
        self.keys.reserve(additional);
        self.values.reserve(additional);
    }

    /// Appends `key` and `value` unless `key` is already present.
    fn append_unique(&mut self, key: K, value: V) -> Slot<K, V> {
        let hash = self.build_hasher.hash_one(&key);
        let Self {
            index_table,
            keys,
            values,
            build_hasher,
            ..
        } = self;
        index_table.grow_for(keys.len(), |index| build_hasher.hash_one(&keys[index]));
        match index_table.entry(
            hash,
            |index| keys[index] == key,
            |index| build_hasher.hash_one(&keys[index]),
        ) {
            index_table::Entry::Occupied(entry) => Slot::Occupied {
                index: entry.get(),
                key,
                value,
            },
            index_table::Entry::Vacant(entry) => {
                let index = keys.len();
                keys.push(key);
                values.push(value);
                entry.insert(index);
                Slot::Appended(index)
            }
        }
    }

    fn notify_appended(&mut self, index: usize) {
        log::trace!("appended entry at position {index}");
        self.notify_structure();
        let Self {
            keys,
            values,
            changes,
            ..
        } = self;
        let change = MapChange::Added {
            key: &keys[index],
            value: &values[index],
        };
        changes.emit(|listener| listener(&change));
    }

    /// Appends a new entry for `key`.
    ///
    /// Fails with [`MapError::DuplicateKey`], leaving the map untouched, if `key` is already
    /// present. Otherwise reports [`Property::ALL`] and then [`MapEvent::ItemAdded`].
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        match self.append_unique(key, value) {
            Slot::Appended(index) => {
                self.notify_appended(index);
                Ok(())
            }
            Slot::Occupied { index, .. } => {
                log::debug!("rejected duplicate key stored at position {index}");
                Err(MapError::DuplicateKey)
            }
        }
    }

    /// Removes the entry for `key` and returns it, if it exists.
    ///
    /// All later entries move down by one position. Reports [`Property::ALL`] and then
    /// [`MapEvent::ItemRemoved`].
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let hash = self.build_hasher.hash_one(key);
        let index = self
            .index_table
            .find_entry(hash, |index| self.keys[index].borrow() == key)?
            .remove();
        self.index_table.close_gap(index);
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        log::trace!("removed entry at position {index}");

        self.notify_structure();
        self.notify(MapChange::Removed {
            key: &key,
            value: &value,
        });
        Some((key, value))
    }

    /// Removes the entry for `key`.
    ///
    /// Returns `false`, without notifying anyone, if there is no such entry.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        self.remove_entry(key).is_some()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher, C: ChangeDetection<V>> ObservableMap<K, V, S, C> {
    /// Stores `new_value` at `index` and reports the replacement if `C` considers it a change.
    fn replace_value(&mut self, index: usize, new_value: V) -> V {
        let old_value = std::mem::replace(&mut self.values[index], new_value);
        let Self {
            keys,
            values,
            changes,
            ..
        } = self;
        if C::is_change(&old_value, &values[index]) {
            log::trace!("replaced value at position {index}");
            let change = MapChange::Changed {
                key: &keys[index],
                old_value: &old_value,
                new_value: &values[index],
            };
            changes.emit(|listener| listener(&change));
        } else {
            log::trace!("stored unchanged value at position {index}");
        }
        old_value
    }

    /// Appends a new entry for `key` or replaces the value of the existing one.
    ///
    /// Returns the replaced value, if any. Appending behaves like [`add`](Self::add).
    /// Replacing keeps the entry's position, reports [`MapEvent::ItemChanged`] if `C` considers
    /// the replacement a change and never reports property changes.
    pub fn add_or_update(&mut self, key: K, value: V) -> Option<V> {
        match self.append_unique(key, value) {
            Slot::Appended(index) => {
                self.notify_appended(index);
                None
            }
            Slot::Occupied { index, value, .. } => Some(self.replace_value(index, value)),
        }
    }

    /// Like [`add_or_update`](Self::add_or_update), but computes the replacement value with
    /// `update(key, old_value)` when `key` is already present.
    ///
    /// `value` is only used when a new entry is appended.
    pub fn add_or_update_with(
        &mut self,
        key: K,
        value: V,
        update: impl FnOnce(&K, &V) -> V,
    ) -> Option<V> {
        match self.append_unique(key, value) {
            Slot::Appended(index) => {
                self.notify_appended(index);
                None
            }
            Slot::Occupied { index, .. } => {
                let new_value = update(&self.keys[index], &self.values[index]);
                Some(self.replace_value(index, new_value))
            }
        }
    }

    /// Stores `value` for `key`, appending a new entry or replacing the existing value.
    ///
    /// This is [`add_or_update`](Self::add_or_update) without returning the replaced value.
    pub fn set(&mut self, key: K, value: V) {
        self.add_or_update(key, value);
    }
}

impl<K, V, S, C, Q> Index<&Q> for ObservableMap<K, V, S, C>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Returns the value stored for `key`.
    ///
    /// # Panics
    ///
    /// Panics if there is no entry for `key`.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<K: PartialEq, V: PartialEq, S, C> PartialEq for ObservableMap<K, V, S, C> {
    /// Maps are equal if they hold equal entries in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys && self.values == other.values
    }
}

impl<K: Eq, V: Eq, S, C> Eq for ObservableMap<K, V, S, C> {}

impl<K, V, S, C> FromIterator<(K, V)> for ObservableMap<K, V, S, C>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    C: ChangeDetection<V>,
{
    /// Later pairs overwrite the values of earlier pairs with the same key.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        map.extend(iter);
        map
    }
}

impl<K, V, S, C> Extend<(K, V)> for ObservableMap<K, V, S, C>
where
    K: Hash + Eq,
    S: BuildHasher,
    C: ChangeDetection<V>,
{
    /// Stores every pair with [`set`](ObservableMap::set), notifying listeners for each one.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

/// An iterator over the entries of an [`ObservableMap`].
///
/// This struct is created by the [`iter`](`ObservableMap::iter`) method on [`ObservableMap`].
pub struct Iter<'a, K, V> {
    inner: std::iter::Zip<std::slice::Iter<'a, K>, std::slice::Iter<'a, V>>,
}
impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    impl_iterator!();
}
impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    impl_double_ended_iterator!();
}
impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

/// An iterator moving entries out of an [`ObservableMap`].
///
/// This struct is created by the `into_iter` method on [`ObservableMap`]. Consuming the map
/// this way does not notify any listeners.
pub struct IntoIter<K, V> {
    inner: std::iter::Zip<std::vec::IntoIter<K>, std::vec::IntoIter<V>>,
}
impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    impl_iterator!();
}
impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    impl_double_ended_iterator!();
}
impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S, C> IntoIterator for ObservableMap<K, V, S, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.keys.into_iter().zip(self.values),
        }
    }
}

impl<'a, K, V, S, C> IntoIterator for &'a ObservableMap<K, V, S, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash, V, S: BuildHasher, C> ObservableMap<K, V, S, C> {
    #[cfg(test)]
    pub(crate) fn check(&self) {
        assert_eq!(self.keys.len(), self.values.len());
        assert_eq!(self.index_table.len(), self.keys.len());
        for (index, key) in self.keys.iter().enumerate() {
            let hash = self.build_hasher.hash_one(key);
            assert_eq!(self.index_table.find(hash, |idx| idx == index), Some(index));
        }
    }
}
