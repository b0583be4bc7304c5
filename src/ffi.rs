//! C-ABI Foreign Function Interface for EmbeDB.
//!
//! This module provides extern "C" functions for cross-language access.
//! All functions use `catch_unwind` to prevent Rust panics from unwinding
//! into foreign code.
//!
//! Stores are addressed by path and resolved through the global registry,
//! so a host language only needs to carry the path string between calls.
//! Vectors returned to the caller are heap allocations owned by the
//! caller; release them with [`embedb_free_vector`]. Stats strings are
//! released with [`embedb_free_string`].

// FFI functions intentionally take raw pointers without being marked unsafe
// because they handle null checks and use catch_unwind for safety
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::error::{
    EmbedError, ERR_CLOSED, ERR_DIMENSION_MISMATCH, ERR_GENERIC, ERR_INTERNAL_PANIC,
    ERR_INVALID_FORMAT, ERR_INVALID_PATH, ERR_IO, ERR_KEY_NOT_FOUND, ERR_STORE_NOT_FOUND,
    ERR_SUCCESS,
};
use crate::store::{close_store, open_store_with_options, with_store, OpenOptions};

/// Maps an [`EmbedError`] to its FFI error code.
fn error_code(err: &EmbedError) -> i32 {
    match err {
        EmbedError::Io(_) => ERR_IO,
        EmbedError::InvalidFormat(_) => ERR_INVALID_FORMAT,
        EmbedError::DimensionMismatch { .. } => ERR_DIMENSION_MISMATCH,
        EmbedError::NotFound => ERR_KEY_NOT_FOUND,
        EmbedError::StoreNotFound(_) => ERR_STORE_NOT_FOUND,
        EmbedError::InvalidPath(_) => ERR_INVALID_PATH,
        EmbedError::Closed => ERR_CLOSED,
    }
}

/// Converts a C string pointer to `&str`, or `None` on null / bad UTF-8.
fn cstr<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Hands a vector to the caller as a malloc-style allocation.
///
/// The caller must release it with [`embedb_free_vector`], passing the
/// same length.
fn export_vector(vector: Vec<f32>, out_vector: *mut *mut f32, out_len: *mut usize) {
    let len = vector.len();
    let ptr = Box::into_raw(vector.into_boxed_slice()) as *mut f32;
    unsafe {
        *out_vector = ptr;
        *out_len = len;
    }
}

/// Opens a store at the given path and registers it in the global registry.
///
/// # Arguments
/// * `path` - Null-terminated C string containing the path to the store file
/// * `dimension` - Vector dimension the store must carry
///
/// # Returns
/// * `1` (ERR_SUCCESS) - Store opened successfully or was already open
/// * `-2` (ERR_INVALID_PATH) - Path is null or invalid UTF-8
/// * `-4` (ERR_INVALID_FORMAT) - File exists but is not an EmbeDB store
/// * `-6` (ERR_DIMENSION_MISMATCH) - File was built for a different dimension
/// * `-3` (ERR_IO) - File or mmap operations failed
/// * `-100` (ERR_INTERNAL_PANIC) - Internal panic occurred
///
/// # Safety
/// * `path` must be a valid null-terminated C string or null
#[no_mangle]
pub extern "C" fn embedb_open(path: *const c_char, dimension: u32) -> i32 {
    embedb_open_with_options(path, dimension, 1, 0)
}

/// Opens a store with explicit options.
///
/// # Arguments
/// * `path` - Null-terminated C string containing the path to the store file
/// * `dimension` - Vector dimension the store must carry
/// * `lazy_load` - Non-zero to load only the index at open (informational)
/// * `cache_size` - LRU capacity; 0 selects the default (100)
///
/// # Returns
/// Same codes as [`embedb_open`].
///
/// # Safety
/// * `path` must be a valid null-terminated C string or null
#[no_mangle]
pub extern "C" fn embedb_open_with_options(
    path: *const c_char,
    dimension: u32,
    lazy_load: i32,
    cache_size: usize,
) -> i32 {
    std::panic::catch_unwind(|| {
        let path_str = match cstr(path) {
            Some(s) => s,
            None => return ERR_INVALID_PATH,
        };

        let options = OpenOptions {
            lazy_load: lazy_load != 0,
            cache_size,
        };

        match open_store_with_options(path_str, dimension, options) {
            Ok(()) => ERR_SUCCESS,
            Err(e) => error_code(&e),
        }
    })
    .unwrap_or(ERR_INTERNAL_PANIC)
}

/// Closes a store and removes it from the global registry.
///
/// # Returns
/// * `1` (ERR_SUCCESS) - Store closed successfully
/// * `-1` (ERR_STORE_NOT_FOUND) - Store not found in registry
/// * `-2` (ERR_INVALID_PATH) - Path is null or invalid UTF-8
/// * `-3` (ERR_IO) - Writing the index section or header failed
/// * `-100` (ERR_INTERNAL_PANIC) - Internal panic occurred
///
/// # Safety
/// * `path` must be a valid null-terminated C string or null
#[no_mangle]
pub extern "C" fn embedb_close(path: *const c_char) -> i32 {
    std::panic::catch_unwind(|| {
        let path_str = match cstr(path) {
            Some(s) => s,
            None => return ERR_INVALID_PATH,
        };

        match close_store(path_str) {
            Ok(()) => ERR_SUCCESS,
            Err(e) => error_code(&e),
        }
    })
    .unwrap_or(ERR_INTERNAL_PANIC)
}

/// Inserts a vector under a key. Inserting an existing key is a no-op
/// that still reports success.
///
/// # Arguments
/// * `path` - Null-terminated C string identifying the registered store
/// * `key` - Null-terminated C string containing the key
/// * `vector` - Pointer to `len` consecutive f32 values
/// * `len` - Number of values; must equal the store dimension
///
/// # Returns
/// * `1` (ERR_SUCCESS) - Vector inserted (or key already present)
/// * `-1` (ERR_STORE_NOT_FOUND) - Store not found in registry
/// * `-2` (ERR_INVALID_PATH) - Path or key is null or invalid UTF-8
/// * `-6` (ERR_DIMENSION_MISMATCH) - `len` differs from the store dimension
/// * `-7` (ERR_CLOSED) - Store has been closed
/// * `-100` (ERR_INTERNAL_PANIC) - Internal panic occurred
///
/// # Safety
/// * `path` and `key` must be valid null-terminated C strings or null
/// * `vector` must point to at least `len` f32 values, or be null
#[no_mangle]
pub extern "C" fn embedb_insert(
    path: *const c_char,
    key: *const c_char,
    vector: *const f32,
    len: usize,
) -> i32 {
    std::panic::catch_unwind(|| {
        let path_str = match cstr(path) {
            Some(s) => s,
            None => return ERR_INVALID_PATH,
        };
        let key_str = match cstr(key) {
            Some(s) => s,
            None => return ERR_INVALID_PATH,
        };
        if vector.is_null() {
            return ERR_GENERIC;
        }

        let values = unsafe { std::slice::from_raw_parts(vector, len) };

        match with_store(path_str, |store| store.insert(key_str, values)) {
            Ok(()) => ERR_SUCCESS,
            Err(e) => error_code(&e),
        }
    })
    .unwrap_or(ERR_INTERNAL_PANIC)
}

/// Retrieves the vector stored under a key.
///
/// On success, `*out_vector` receives a caller-owned allocation of
/// `*out_len` f32 values; release it with [`embedb_free_vector`].
///
/// # Returns
/// * `1` (ERR_SUCCESS) - Vector written to the out parameters
/// * `-1` (ERR_STORE_NOT_FOUND) - Store not found in registry
/// * `-2` (ERR_INVALID_PATH) - Path or key is null or invalid UTF-8
/// * `-5` (ERR_KEY_NOT_FOUND) - No record for this key
/// * `-7` (ERR_CLOSED) - Store has been closed
/// * `-100` (ERR_INTERNAL_PANIC) - Internal panic occurred
///
/// # Safety
/// * `path` and `key` must be valid null-terminated C strings or null
/// * `out_vector` and `out_len` must be valid writable pointers
#[no_mangle]
pub extern "C" fn embedb_get(
    path: *const c_char,
    key: *const c_char,
    out_vector: *mut *mut f32,
    out_len: *mut usize,
) -> i32 {
    std::panic::catch_unwind(|| {
        let path_str = match cstr(path) {
            Some(s) => s,
            None => return ERR_INVALID_PATH,
        };
        let key_str = match cstr(key) {
            Some(s) => s,
            None => return ERR_INVALID_PATH,
        };
        if out_vector.is_null() || out_len.is_null() {
            return ERR_GENERIC;
        }

        match with_store(path_str, |store| store.get(key_str)) {
            Ok(vector) => {
                export_vector(vector, out_vector, out_len);
                ERR_SUCCESS
            }
            Err(e) => error_code(&e),
        }
    })
    .unwrap_or(ERR_INTERNAL_PANIC)
}

/// Finds the stored vector most similar to `query`.
///
/// On success, the best vector is written like [`embedb_get`] and its
/// cosine score to `*out_score`.
///
/// # Returns
/// * `1` (ERR_SUCCESS) - A vector met the threshold
/// * `-1` (ERR_STORE_NOT_FOUND) - Store not found in registry
/// * `-2` (ERR_INVALID_PATH) - Path is null or invalid UTF-8
/// * `-5` (ERR_KEY_NOT_FOUND) - No vector met the threshold
/// * `-6` (ERR_DIMENSION_MISMATCH) - `len` differs from the store dimension
/// * `-7` (ERR_CLOSED) - Store has been closed
/// * `-100` (ERR_INTERNAL_PANIC) - Internal panic occurred
///
/// # Safety
/// * `path` must be a valid null-terminated C string or null
/// * `query` must point to at least `len` f32 values, or be null
/// * `out_vector`, `out_len`, and `out_score` must be valid writable pointers
#[no_mangle]
pub extern "C" fn embedb_find_similar(
    path: *const c_char,
    query: *const f32,
    len: usize,
    threshold: f32,
    out_vector: *mut *mut f32,
    out_len: *mut usize,
    out_score: *mut f32,
) -> i32 {
    std::panic::catch_unwind(|| {
        let path_str = match cstr(path) {
            Some(s) => s,
            None => return ERR_INVALID_PATH,
        };
        if query.is_null() || out_vector.is_null() || out_len.is_null() || out_score.is_null() {
            return ERR_GENERIC;
        }

        let values = unsafe { std::slice::from_raw_parts(query, len) };

        match with_store(path_str, |store| store.find_similar(values, threshold)) {
            Ok((vector, score)) => {
                export_vector(vector, out_vector, out_len);
                unsafe { *out_score = score };
                ERR_SUCCESS
            }
            Err(e) => error_code(&e),
        }
    })
    .unwrap_or(ERR_INTERNAL_PANIC)
}

/// Returns store stats as a JSON object string, or null on error.
///
/// Fields: `records`, `dimension`, `file_size`, `index_size`,
/// `cache_size`, `cache_capacity`. Release the string with
/// [`embedb_free_string`].
///
/// # Safety
/// * `path` must be a valid null-terminated C string or null
#[no_mangle]
pub extern "C" fn embedb_stats(path: *const c_char) -> *mut c_char {
    std::panic::catch_unwind(|| {
        let path_str = match cstr(path) {
            Some(s) => s,
            None => return std::ptr::null_mut(),
        };

        let stats = match with_store(path_str, |store| store.stats()) {
            Ok(stats) => stats,
            Err(_) => return std::ptr::null_mut(),
        };

        match serde_json::to_string(&stats)
            .ok()
            .and_then(|json| CString::new(json).ok())
        {
            Some(cstring) => cstring.into_raw(),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Releases a vector returned by [`embedb_get`] or [`embedb_find_similar`].
///
/// # Safety
/// * `ptr` must come from one of those functions with the matching `len`,
///   or be null. Freeing twice is undefined behavior.
#[no_mangle]
pub extern "C" fn embedb_free_vector(ptr: *mut f32, len: usize) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)));
    }
}

/// Releases a string returned by [`embedb_stats`].
///
/// # Safety
/// * `ptr` must come from [`embedb_stats`] or be null. Freeing twice is
///   undefined behavior.
#[no_mangle]
pub extern "C" fn embedb_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr));
    }
}
