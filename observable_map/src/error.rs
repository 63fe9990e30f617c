//! Errors returned by the fallible operations of [`ObservableMap`](crate::ObservableMap).

/// Result type for map operations that can fail.
pub type Result<T> = std::result::Result<T, MapError>;

/// Precondition failures of map operations.
///
/// A failing operation never mutates the map and never notifies listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The requested key is not present.
    #[error("key not found")]
    KeyNotFound,
    /// An entry with the same key is already present.
    #[error("an entry with the same key already exists")]
    DuplicateKey,
    /// The destination of a copy cannot hold all entries starting at the given offset.
    #[error(
        "destination has {available} slots after offset {offset}, but {required} are required"
    )]
    IndexOutOfRange {
        /// Offset at which the copy was requested to start.
        offset: usize,
        /// Number of entries that would have been written.
        required: usize,
        /// Number of slots in the destination at and after `offset`.
        available: usize,
    },
}
