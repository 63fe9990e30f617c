//! Change notifications emitted by [`ObservableMap`](crate::ObservableMap) and the policies
//! deciding when a value replacement counts as a change.
use std::{fmt, rc::Rc, sync::Arc};

/// Identifies one of the four kinds of entry-level change notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapEvent {
    /// A new entry was appended.
    ItemAdded,
    /// An entry was removed.
    ItemRemoved,
    /// The value stored for an existing key was replaced by a different instance.
    ItemChanged,
    /// All entries were removed at once.
    Cleared,
}

/// Payload of an entry-level change notification.
///
/// The references point into the map (or, for removed entries, at the entry that was just
/// taken out of it) and are only valid for the duration of the listener call.
#[derive(Debug)]
pub enum MapChange<'a, K, V> {
    /// `key` was inserted with `value`.
    Added {
        /// The inserted key.
        key: &'a K,
        /// The inserted value.
        value: &'a V,
    },
    /// The entry for `key` holding `value` was removed.
    Removed {
        /// The removed key.
        key: &'a K,
        /// The value that was stored for the key.
        value: &'a V,
    },
    /// The value stored for `key` was replaced.
    Changed {
        /// The key whose value was replaced.
        key: &'a K,
        /// The value stored before the replacement.
        old_value: &'a V,
        /// The value stored now.
        new_value: &'a V,
    },
    /// The map was emptied.
    Cleared,
}

// Manual impls: the payload only holds references, so it is `Copy` whatever `K` and `V` are.
impl<K, V> Clone for MapChange<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<K, V> Copy for MapChange<'_, K, V> {}

impl<'a, K, V> MapChange<'a, K, V> {
    /// Returns which kind of event this payload belongs to.
    pub fn kind(&self) -> MapEvent {
        match self {
            MapChange::Added { .. } => MapEvent::ItemAdded,
            MapChange::Removed { .. } => MapEvent::ItemRemoved,
            MapChange::Changed { .. } => MapEvent::ItemChanged,
            MapChange::Cleared => MapEvent::Cleared,
        }
    }

    /// Returns the affected key, or `None` for [`MapChange::Cleared`].
    pub fn key(&self) -> Option<&'a K> {
        match *self {
            MapChange::Added { key, .. }
            | MapChange::Removed { key, .. }
            | MapChange::Changed { key, .. } => Some(key),
            MapChange::Cleared => None,
        }
    }

    /// Returns the value stored before the change, if there was one.
    pub fn old_value(&self) -> Option<&'a V> {
        match *self {
            MapChange::Removed { value, .. } => Some(value),
            MapChange::Changed { old_value, .. } => Some(old_value),
            MapChange::Added { .. } | MapChange::Cleared => None,
        }
    }

    /// Returns the value stored after the change, if there is one.
    pub fn new_value(&self) -> Option<&'a V> {
        match *self {
            MapChange::Added { value, .. } => Some(value),
            MapChange::Changed { new_value, .. } => Some(new_value),
            MapChange::Removed { .. } | MapChange::Cleared => None,
        }
    }
}

/// Aggregate properties of a map, reported through the property-changed channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// The number of entries.
    Count,
    /// The key collection.
    Keys,
    /// The value collection.
    Values,
    /// The entry collection as a whole.
    Items,
}

impl Property {
    /// All properties, in the order they are reported after a structural change.
    pub const ALL: [Property; 4] = [
        Property::Count,
        Property::Keys,
        Property::Values,
        Property::Items,
    ];

    /// Returns the name data-binding layers use for this property.
    pub fn name(self) -> &'static str {
        match self {
            Property::Count => "Count",
            Property::Keys => "Keys",
            Property::Values => "Values",
            Property::Items => "Item[]",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values that have an identity separate from their contents.
///
/// Shared pointers and references are the same instance when they point at the same
/// allocation. An owned value is only ever the same instance as itself, so replacing a stored
/// owned value always produces a different instance.
///
/// The provided method implements exactly that for owned values, so an owned type only needs
/// an empty impl, or a line in [`impl_owned_instance!`](crate::impl_owned_instance):
///
/// ```
/// use observable_map::{Instance, ObservableMap};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point(i32, i32);
///
/// impl Instance for Point {}
///
/// let mut map: ObservableMap<&str, Point> = ObservableMap::new();
/// map.set("origin", Point(0, 0));
/// assert_eq!(map.add_or_update("origin", Point(1, 1)), Some(Point(0, 0)));
/// ```
pub trait Instance {
    /// Returns `true` if `self` and `other` are the same instance.
    fn same_instance(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// Implements [`Instance`] for owned types, which are never the same instance as a value
/// stored elsewhere.
///
/// ```
/// struct Celsius(f64);
/// struct Label(String);
///
/// observable_map::impl_owned_instance!(Celsius, Label);
/// ```
#[macro_export]
macro_rules! impl_owned_instance {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Instance for $ty {}
        )*
    };
}

impl<T: ?Sized> Instance for Rc<T> {
    fn same_instance(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Instance for Arc<T> {
    fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Instance for &T {
    fn same_instance(&self, other: &Self) -> bool {
        std::ptr::eq(*self, *other)
    }
}

impl<T: Instance> Instance for Option<T> {
    fn same_instance(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_instance(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl_owned_instance!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String, std::ffi::OsString, std::path::PathBuf, std::time::Duration,
);

impl<T: ?Sized> Instance for Box<T> {}
impl<T> Instance for Vec<T> {}
impl<T> Instance for std::collections::VecDeque<T> {}
impl<K, V, S> Instance for std::collections::HashMap<K, V, S> {}
impl<T, S> Instance for std::collections::HashSet<T, S> {}
impl<K, V> Instance for std::collections::BTreeMap<K, V> {}
impl<T> Instance for std::collections::BTreeSet<T> {}
impl<T, const N: usize> Instance for [T; N] {}

// Tuples are owned aggregates, whatever their fields are.
macro_rules! impl_tuple_instance {
    ($($name:ident)+) => {
        impl<$($name),+> Instance for ($($name,)+) {}
    };
}

impl_tuple_instance!(A);
impl_tuple_instance!(A B);
impl_tuple_instance!(A B C);
impl_tuple_instance!(A B C D);
impl_tuple_instance!(A B C D E);
impl_tuple_instance!(A B C D E F);
impl_tuple_instance!(A B C D E F G);
impl_tuple_instance!(A B C D E F G H);

/// Decides whether replacing a stored value with a new one is reported as
/// [`MapEvent::ItemChanged`].
pub trait ChangeDetection<V: ?Sized> {
    /// Returns `true` if storing `new` in place of `old` is a change.
    fn is_change(old: &V, new: &V) -> bool;
}

/// Reports a change whenever the stored instance is replaced by a different instance, even
/// if both compare equal. This is the default policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByIdentity;

/// Reports a change only when the new value differs from the old one by [`PartialEq`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ByValue;

/// Reports every replacement as a change.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl<V: Instance + ?Sized> ChangeDetection<V> for ByIdentity {
    fn is_change(old: &V, new: &V) -> bool {
        !old.same_instance(new)
    }
}

impl<V: PartialEq + ?Sized> ChangeDetection<V> for ByValue {
    fn is_change(old: &V, new: &V) -> bool {
        old != new
    }
}

impl<V: ?Sized> ChangeDetection<V> for Always {
    fn is_change(_old: &V, _new: &V) -> bool {
        true
    }
}
