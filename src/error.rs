//! Error types for EmbeDB store operations.
//!
//! This module provides:
//! - [`EmbedError`] - The main error enum for Rust code
//! - [`Result<T>`] - A type alias for `std::result::Result<T, EmbedError>`
//! - Error code constants for FFI functions

use std::fmt;

// =============================================================================
// FFI Error Codes
// =============================================================================

/// Operation completed successfully.
pub const ERR_SUCCESS: i32 = 1;

/// Generic/unspecified error.
pub const ERR_GENERIC: i32 = 0;

/// Store not found in the global registry.
/// Call [`open_store()`](crate::open_store) first.
pub const ERR_STORE_NOT_FOUND: i32 = -1;

/// Invalid path (null pointer or invalid UTF-8).
pub const ERR_INVALID_PATH: i32 = -2;

/// I/O error during file operations.
pub const ERR_IO: i32 = -3;

/// File is not an EmbeDB store (bad magic or unsupported version).
pub const ERR_INVALID_FORMAT: i32 = -4;

/// Key not found, or no vector met the similarity threshold.
pub const ERR_KEY_NOT_FOUND: i32 = -5;

/// Vector dimension does not match the store's dimension.
pub const ERR_DIMENSION_MISMATCH: i32 = -6;

/// Operation attempted on a closed store.
pub const ERR_CLOSED: i32 = -7;

/// Internal panic occurred (should not happen in normal operation).
pub const ERR_INTERNAL_PANIC: i32 = -100;

// =============================================================================
// Rust Error Types
// =============================================================================

/// Result type alias for EmbeDB operations.
///
/// This is equivalent to `std::result::Result<T, EmbedError>`.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Where a dimension check failed.
///
/// A [`DimensionMismatch`](EmbedError::DimensionMismatch) raised while
/// opening a file means the on-disk store was built for a different
/// dimension; one raised by `insert` or `find_similar` means the caller
/// supplied a vector of the wrong length. The origin lets callers tell
/// the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionOrigin {
    /// Header dimension vs. the dimension requested at open.
    Open,
    /// Inserted vector length vs. the store dimension.
    Insert,
    /// Similarity query length vs. the store dimension.
    Query,
}

impl fmt::Display for DimensionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionOrigin::Open => write!(f, "open"),
            DimensionOrigin::Insert => write!(f, "insert"),
            DimensionOrigin::Query => write!(f, "query"),
        }
    }
}

/// Comprehensive error types for EmbeDB store operations.
///
/// # Examples
///
/// ```rust,no_run
/// use embedb::{EmbedStore, EmbedError, Result};
///
/// fn example() -> Result<()> {
///     let store = EmbedStore::open("test.edb", 3)?;
///
///     // Missing keys are an ordinary outcome, not a panic
///     match store.get("never inserted") {
///         Err(EmbedError::NotFound) => println!("cache miss"),
///         other => println!("{:?}", other),
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// I/O error during file or mmap operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not an EmbeDB store: bad magic, unsupported version,
    /// or impossible offsets.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Vector dimension mismatch.
    #[error("dimension mismatch at {origin}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which operation detected the mismatch.
        origin: DimensionOrigin,
        /// Expected number of dimensions.
        expected: u32,
        /// Actual number of dimensions encountered.
        got: u32,
    },

    /// Key absent in `get`, or no vector met the threshold in `find_similar`.
    #[error("embedding not found")]
    NotFound,

    /// Store not found in the global registry.
    #[error("store not registered: {0}")]
    StoreNotFound(String),

    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Operation attempted after `close`.
    #[error("store is closed")]
    Closed,
}
