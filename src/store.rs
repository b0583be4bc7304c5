//! The embedding store engine.
//!
//! This module contains the main store implementation:
//!
//! - [`EmbedStore`] - single-file, memory-mapped vector store
//! - [`OpenOptions`] - open-time tuning knobs
//! - [`StoreStats`] - informational counters for logging and tests
//! - Global registry functions: [`open_store`], [`close_store`], [`with_store`]
//!
//! # Usage Patterns
//!
//! ## Direct Instance (Recommended for Rust)
//!
//! ```rust,no_run
//! use embedb::EmbedStore;
//!
//! let store = EmbedStore::open("embeddings.edb", 1536)?;
//! store.insert("what is a monad", &vec![0.1f32; 1536])?;
//! let vector = store.get("what is a monad")?;
//! store.close()?;
//! # Ok::<(), embedb::EmbedError>(())
//! ```
//!
//! ## Global Registry (Used by FFI and warm re-entry)
//!
//! ```rust,no_run
//! use embedb::{open_store, with_store, close_store};
//!
//! open_store("embeddings.edb", 1536)?;
//! with_store("embeddings.edb", |store| store.insert("key", &vec![0.0f32; 1536]))?;
//! close_store("embeddings.edb")?;
//! # Ok::<(), embedb::EmbedError>(())
//! ```
//!
//! The registry keeps at most one live engine per canonical path, which
//! is what serverless hosts want: the first invocation opens the file,
//! warm invocations reuse the handle.
//!
//! # Concurrency
//!
//! One reader-writer lock guards the header, the in-memory index, the
//! data-end watermark, and the mmap handle. `get` and the per-record
//! reads of `find_similar` take it shared; `insert` and `close` take it
//! exclusive. Every read path copies vector bytes out of the mapping
//! before releasing the lock, because `insert` replaces the mapping and
//! a retained view would dangle. The LRU cache carries its own lock and
//! is probed without touching the store lock at all.
//!
//! The store is strictly single-process. Nothing stops a second process
//! from opening the same file, and nothing good comes of it.

use std::collections::HashMap;
use std::fs::{File, OpenOptions as FsOpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::cache::VectorCache;
use crate::error::{DimensionOrigin, EmbedError, Result};
use crate::hash::hash_key;
use crate::similarity::cosine_similarity;
use crate::types::{
    encode_record, record_size, FileHeader, IndexEntry, CURRENT_VERSION, HEADER_SIZE,
    INDEX_ENTRY_SIZE, RECORD_META_SIZE,
};

/// LRU capacity used when [`OpenOptions::cache_size`] is left at 0.
pub const DEFAULT_CACHE_SIZE: usize = 100;

// =============================================================================
// Global Store Registry
// =============================================================================

/// One process-wide table of live engines, keyed by resolved absolute
/// path. Two opens of the same file, however the path is spelled, land
/// on the same entry.
static STORE_REGISTRY: Lazy<Mutex<HashMap<String, EmbedStore>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Registers an engine for `path`, creating or opening the file on
/// first use.
///
/// Calling this again for an already-registered path does nothing and
/// reports success — the point of the registry is that a warm
/// serverless invocation finds the engine its cold predecessor opened.
///
/// # Errors
///
/// Anything [`EmbedStore::open`] can fail with, plus
/// [`EmbedError::InvalidPath`] when the path has no usable file name.
pub fn open_store(path: &str, dimension: u32) -> Result<()> {
    open_store_with_options(path, dimension, OpenOptions::default())
}

/// [`open_store`] with explicit [`OpenOptions`] for the first open.
/// The options are ignored when the path is already registered.
pub fn open_store_with_options(path: &str, dimension: u32, options: OpenOptions) -> Result<()> {
    let key = registry_key(path)?;

    let mut registry = STORE_REGISTRY.lock();

    if registry.contains_key(&key) {
        return Ok(());
    }

    let store = EmbedStore::open_with_options(path, dimension, options)?;
    registry.insert(key, store);

    Ok(())
}

/// Cleanly closes the engine registered for `path` and forgets it: the
/// index section and header are written out before the entry is
/// dropped.
///
/// # Errors
///
/// [`EmbedError::StoreNotFound`] when nothing is registered under the
/// path; otherwise whatever the close itself fails with.
pub fn close_store(path: &str) -> Result<()> {
    let key = registry_key(path)?;

    let mut registry = STORE_REGISTRY.lock();

    let store = registry
        .remove(&key)
        .ok_or_else(|| EmbedError::StoreNotFound(path.to_string()))?;

    store.close()
}

/// Runs `f` against the engine registered for `path`.
///
/// The registry lock is held for the duration of the closure, so keep
/// the work inside it to store calls. The FFI layer funnels every
/// per-call lookup through here.
///
/// # Example
/// ```ignore
/// with_store("embeddings.edb", |store| store.get("key"))?;
/// ```
pub fn with_store<F, R>(path: &str, f: F) -> Result<R>
where
    F: FnOnce(&EmbedStore) -> Result<R>,
{
    let key = registry_key(path)?;

    let registry = STORE_REGISTRY.lock();

    let store = registry
        .get(&key)
        .ok_or_else(|| EmbedError::StoreNotFound(path.to_string()))?;

    f(store)
}

/// Resolves the registry key for a path.
///
/// Keys are absolute so that `cache.edb` and `./cache.edb` address the
/// same engine. A store file that does not exist yet has nothing to
/// canonicalize, so its key is the resolved directory joined with the
/// file name the caller gave.
fn registry_key(path: &str) -> Result<String> {
    match std::fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved.to_string_lossy().into_owned()),
        Err(_) => {
            let raw = Path::new(path);
            let name = raw
                .file_name()
                .ok_or_else(|| EmbedError::InvalidPath(path.to_string()))?;
            let dir = match raw.parent().filter(|p| !p.as_os_str().is_empty()) {
                Some(dir) => std::fs::canonicalize(dir).map_err(|_| {
                    EmbedError::InvalidPath(format!("no such directory: {}", dir.display()))
                })?,
                None => std::env::current_dir()?,
            };
            Ok(dir.join(name).to_string_lossy().into_owned())
        }
    }
}

// =============================================================================
// Options, Stats, and Core Struct
// =============================================================================

/// Open-time options for an [`EmbedStore`].
///
/// # Examples
///
/// ```rust,no_run
/// use embedb::{EmbedStore, OpenOptions};
///
/// let store = EmbedStore::open_with_options(
///     "embeddings.edb",
///     1536,
///     OpenOptions { cache_size: 1000, ..Default::default() },
/// )?;
/// # Ok::<(), embedb::EmbedError>(())
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Load only the index at open, not the vectors. Informational:
    /// vectors are always faulted in lazily through the mmap, so this
    /// flag changes nothing today. Kept for wire-compatibility with
    /// existing callers.
    pub lazy_load: bool,
    /// Number of hot vectors kept in the in-memory LRU. 0 means
    /// [`DEFAULT_CACHE_SIZE`].
    pub cache_size: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            lazy_load: true,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

/// Informational counters, intended for logging and tests.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Number of records in the store.
    pub records: usize,
    /// Vector dimension.
    pub dimension: u32,
    /// Current file size in bytes.
    pub file_size: u64,
    /// Number of entries in the in-memory index.
    pub index_size: usize,
    /// Number of vectors currently in the LRU cache.
    pub cache_size: usize,
    /// LRU cache capacity.
    pub cache_capacity: usize,
}

/// Lock-guarded interior of the store.
///
/// `file == None` means the store is closed; every operation checks that
/// first. The mmap, when present, covers the whole file.
struct StoreInner {
    file: Option<File>,
    mmap: Option<MmapMut>,
    header: FileHeader,
    index: HashMap<u64, i64>,
    data_end_offset: i64,
}

/// Single-file store of fixed-dimension embedding vectors keyed by text.
///
/// The file holds a 256-byte header, an append-only data section of
/// records, and (after a clean close) a trailing index section that
/// makes the next open O(records) in index entries instead of record
/// bytes. Keys are identified by their FNV-1a hash; the key text itself
/// is never stored.
///
/// Records are immutable: inserting an existing key is a no-op, and
/// there is no delete. The design target is caching expensive embedding
/// computations, where a stale-free append-only file is exactly enough.
///
/// # Examples
///
/// ```rust,no_run
/// use embedb::EmbedStore;
///
/// let store = EmbedStore::open("cache.edb", 3)?;
/// store.insert("hello", &[0.1, 0.2, 0.3])?;
///
/// let v = store.get("hello")?;
/// assert_eq!(v, vec![0.1, 0.2, 0.3]);
///
/// let (nearest, score) = store.find_similar(&[0.1, 0.2, 0.3], 0.9)?;
/// assert!(score > 0.99);
/// store.close()?;
/// # Ok::<(), embedb::EmbedError>(())
/// ```
pub struct EmbedStore {
    path: PathBuf,
    dimension: u32,
    cache: VectorCache,
    inner: RwLock<StoreInner>,
}

impl EmbedStore {
    /// Opens the store at `path`, creating the file if it does not exist.
    ///
    /// # Errors
    ///
    /// * [`EmbedError::InvalidFormat`] - existing file is not an EmbeDB store
    /// * [`EmbedError::DimensionMismatch`] - existing file was built for a
    ///   different dimension (origin `open`)
    /// * [`EmbedError::Io`] - file or mmap operations failed
    pub fn open<P: AsRef<Path>>(path: P, dimension: u32) -> Result<Self> {
        Self::open_with_options(path, dimension, OpenOptions::default())
    }

    /// Opens the store with explicit [`OpenOptions`].
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        dimension: u32,
        options: OpenOptions,
    ) -> Result<Self> {
        let cache_size = if options.cache_size == 0 {
            DEFAULT_CACHE_SIZE
        } else {
            options.cache_size
        };

        let path = path.as_ref().to_path_buf();
        if path.exists() {
            Self::open_existing(path, dimension, cache_size)
        } else {
            Self::create(path, dimension, cache_size)
        }
    }

    fn create(path: PathBuf, dimension: u32, cache_size: usize) -> Result<Self> {
        let mut file = FsOpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        let header = FileHeader::new(dimension);
        file.write_all(&header.encode())?;

        Ok(Self {
            path,
            dimension,
            cache: VectorCache::new(cache_size),
            inner: RwLock::new(StoreInner {
                file: Some(file),
                mmap: None,
                header,
                index: HashMap::new(),
                data_end_offset: HEADER_SIZE as i64,
            }),
        })
    }

    fn open_existing(path: PathBuf, dimension: u32, cache_size: usize) -> Result<Self> {
        let mut file = FsOpenOptions::new().read(true).write(true).open(&path)?;

        let mut buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;
        let header = FileHeader::decode(&buf)?;

        if header.dimension != dimension {
            return Err(EmbedError::DimensionMismatch {
                origin: DimensionOrigin::Open,
                expected: dimension,
                got: header.dimension,
            });
        }

        let file_len = file.metadata()?.len();

        let mut inner = StoreInner {
            file: Some(file),
            mmap: None,
            header,
            index: HashMap::new(),
            data_end_offset: HEADER_SIZE as i64,
        };

        if file_len > HEADER_SIZE as u64 {
            // The mapping covers the whole file; dropping the File on an
            // error path below also tears the mapping down.
            let file_ref = inner.file.as_ref().ok_or(EmbedError::Closed)?;
            inner.mmap = Some(unsafe { MmapMut::map_mut(file_ref)? });

            inner.build_index();

            inner.data_end_offset = if inner.header.version >= CURRENT_VERSION
                && inner.header.index_offset > 0
                && inner.header.index_offset <= file_len
            {
                inner.header.index_offset as i64
            } else {
                file_len as i64
            };
        }

        Ok(Self {
            path,
            dimension,
            cache: VectorCache::new(cache_size),
            inner: RwLock::new(inner),
        })
    }

    /// Retrieves the vector stored under `key`.
    ///
    /// Probes the LRU first; on a miss, reads the record through the
    /// mmap and fills the cache. The returned vector is always an owned
    /// copy, never a view into the mapping.
    ///
    /// # Errors
    ///
    /// * [`EmbedError::NotFound`] - no record for this key
    /// * [`EmbedError::Closed`] - the store has been closed
    pub fn get(&self, key: &str) -> Result<Vec<f32>> {
        let hash = hash_key(key);

        // Cache hit: no store lock taken at all.
        if let Some(vector) = self.cache.get(hash) {
            return Ok(vector);
        }

        let vector = {
            let inner = self.inner.read();
            if inner.file.is_none() {
                return Err(EmbedError::Closed);
            }
            let offset = *inner.index.get(&hash).ok_or(EmbedError::NotFound)?;
            // Decode while the shared hold pins the mapping.
            inner.read_vector(offset)?
        };

        self.cache.put(hash, vector.clone());
        Ok(vector)
    }

    /// Inserts `vector` under `key`. Inserting a key that is already
    /// present is a no-op and returns success.
    ///
    /// The record is appended at the end of the data section with a
    /// positional write, overwriting any index section a previous clean
    /// close left there; the index is rewritten on the next close.
    ///
    /// # Errors
    ///
    /// * [`EmbedError::DimensionMismatch`] - `vector.len()` differs from
    ///   the store dimension (origin `insert`)
    /// * [`EmbedError::Closed`] - the store has been closed
    /// * [`EmbedError::Io`] - write or remap failed
    pub fn insert(&self, key: &str, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension as usize {
            return Err(EmbedError::DimensionMismatch {
                origin: DimensionOrigin::Insert,
                expected: self.dimension,
                got: vector.len() as u32,
            });
        }

        let hash = hash_key(key);

        let mut inner = self.inner.write();
        if inner.file.is_none() {
            return Err(EmbedError::Closed);
        }
        if inner.index.contains_key(&hash) {
            return Ok(());
        }

        let buf = encode_record(hash, vector);
        let offset = inner.data_end_offset;

        {
            let file = inner.file.as_mut().ok_or(EmbedError::Closed)?;
            file.seek(SeekFrom::Start(offset as u64))?;
            file.write_all(&buf)?;
        }

        inner.index.insert(hash, offset);
        inner.header.record_count += 1;
        inner.data_end_offset = offset + buf.len() as i64;

        inner.remap()
    }

    /// Returns the cached vector for `key`, or computes it, inserts it,
    /// and returns it.
    ///
    /// This is the one-call form of the cache pattern: on a miss the
    /// closure runs exactly once and its result is persisted before
    /// being handed back. Errors from the closure and from the insert
    /// both propagate.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use embedb::EmbedStore;
    /// # let store = EmbedStore::open("cache.edb", 3)?;
    /// let vector = store.get_or_compute("some prompt", || {
    ///     // expensive embedding call goes here
    ///     Ok(vec![0.1, 0.2, 0.3])
    /// })?;
    /// # Ok::<(), embedb::EmbedError>(())
    /// ```
    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> Result<Vec<f32>>
    where
        F: FnOnce() -> Result<Vec<f32>>,
    {
        match self.get(key) {
            Ok(vector) => Ok(vector),
            Err(EmbedError::NotFound) => {
                let vector = compute()?;
                self.insert(key, &vector)?;
                Ok(vector)
            }
            Err(e) => Err(e),
        }
    }

    /// Linear scan for the stored vector most similar to `query`.
    ///
    /// Offsets are snapshotted under a shared hold and sorted, then each
    /// record is read under its own shared hold so inserts can interleave
    /// with a long scan. Records that fail to decode are skipped.
    ///
    /// Returns the best vector and its cosine score when the score is at
    /// least `threshold`.
    ///
    /// # Errors
    ///
    /// * [`EmbedError::DimensionMismatch`] - query length differs from
    ///   the store dimension (origin `query`)
    /// * [`EmbedError::NotFound`] - no vector met the threshold
    /// * [`EmbedError::Closed`] - the store has been closed
    pub fn find_similar(&self, query: &[f32], threshold: f32) -> Result<(Vec<f32>, f32)> {
        if query.len() != self.dimension as usize {
            return Err(EmbedError::DimensionMismatch {
                origin: DimensionOrigin::Query,
                expected: self.dimension,
                got: query.len() as u32,
            });
        }

        let offsets: Vec<i64> = {
            let inner = self.inner.read();
            if inner.file.is_none() {
                return Err(EmbedError::Closed);
            }
            let mut offsets: Vec<i64> = inner.index.values().copied().collect();
            // Map iteration order is arbitrary; sorting makes ties
            // reproducible across runs.
            offsets.sort_unstable();
            offsets
        };

        let mut best_vector: Option<Vec<f32>> = None;
        let mut best_score = -1.0f32;

        for offset in offsets {
            let vector = {
                let inner = self.inner.read();
                if inner.file.is_none() {
                    return Err(EmbedError::Closed);
                }
                match inner.read_vector(offset) {
                    Ok(v) => v,
                    Err(_) => continue,
                }
            };

            let score = cosine_similarity(query, &vector);
            if score > best_score {
                best_score = score;
                best_vector = Some(vector);
            }
        }

        match best_vector {
            Some(vector) if best_score >= threshold => Ok((vector, best_score)),
            _ => Err(EmbedError::NotFound),
        }
    }

    /// Informational counters for logging and tests.
    pub fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.read();
        let file = inner.file.as_ref().ok_or(EmbedError::Closed)?;
        let file_size = file.metadata()?.len();

        Ok(StoreStats {
            records: inner.index.len(),
            dimension: self.dimension,
            file_size,
            index_size: inner.index.len(),
            cache_size: self.cache.len(),
            cache_capacity: self.cache.capacity(),
        })
    }

    /// Path this store was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Vector dimension every record carries.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Closes the store: writes the index section, rewrites the header,
    /// unmaps, and releases the file. Close is once-only; this and every
    /// other operation afterwards fails with [`EmbedError::Closed`].
    ///
    /// A file that never sees a clean close is still readable: the next
    /// open falls back to scanning the data section.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.file.is_none() {
            return Err(EmbedError::Closed);
        }

        // Unmap before truncating; some platforms refuse to shrink a
        // file that still has a mapped view.
        inner.mmap = None;

        if !inner.index.is_empty() && inner.header.version >= CURRENT_VERSION {
            inner.write_index_section()?;
        }

        inner.header.record_count = inner.index.len() as u64;
        let header_bytes = inner.header.encode();

        {
            let file = inner.file.as_mut().ok_or(EmbedError::Closed)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&header_bytes)?;
            file.sync_all()?;
        }

        inner.file = None;
        Ok(())
    }
}

impl Drop for EmbedStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            if !matches!(e, EmbedError::Closed) {
                eprintln!("warning: failed to close embedding store on drop: {}", e);
            }
        }
    }
}

impl StoreInner {
    /// Rebuilds the in-memory hash → offset map from the mapped file.
    ///
    /// Files closed cleanly under the current version carry a trailing
    /// index section and take the fast path; everything else (version 1
    /// files, files that crashed before a close, files closed while
    /// empty) is reconstructed by walking the records.
    fn build_index(&mut self) {
        let mmap = match &self.mmap {
            Some(m) => m,
            None => return,
        };

        let use_section = self.header.version >= CURRENT_VERSION
            && self.header.index_offset > 0
            && (self.header.index_offset as usize) < mmap.len();

        if use_section {
            self.build_index_from_section();
        } else {
            self.build_index_legacy();
        }
    }

    /// Fast path: decode the index section written by the last clean
    /// close. On a 10k-record file of 1536-dim vectors this touches
    /// ~160 kB instead of ~60 MB of records.
    fn build_index_from_section(&mut self) {
        let mmap = match &self.mmap {
            Some(m) => m,
            None => return,
        };

        let file_size = mmap.len();
        let index_offset = self.header.index_offset as usize;
        let data_end = self.header.index_offset as i64;
        let num_entries = (file_size - index_offset) / INDEX_ENTRY_SIZE;

        for i in 0..num_entries {
            let start = index_offset + i * INDEX_ENTRY_SIZE;
            let entry = IndexEntry::from_bytes(
                mmap[start..start + INDEX_ENTRY_SIZE].try_into().unwrap(),
            );

            // An entry must point into the data section proper.
            if entry.offset < HEADER_SIZE as i64 || entry.offset >= data_end {
                continue;
            }

            // First occurrence wins: inserts for an existing key are
            // no-ops, so the earliest record is authoritative.
            self.index.entry(entry.hash).or_insert(entry.offset);
        }
    }

    /// Slow path: walk the data section record by record. A partial
    /// record at the tail (crashed insert) is silently truncated.
    fn build_index_legacy(&mut self) {
        let mmap = match &self.mmap {
            Some(m) => m,
            None => return,
        };

        let file_size = mmap.len() as i64;
        let mut offset = HEADER_SIZE as i64;

        while offset + RECORD_META_SIZE as i64 <= file_size {
            let pos = offset as usize;
            let hash = u64::from_le_bytes(mmap[pos..pos + 8].try_into().unwrap());
            let dimension = u32::from_le_bytes(mmap[pos + 8..pos + 12].try_into().unwrap());

            // A record with a foreign dimension means we walked off the
            // end of well-formed data; stop here.
            if dimension != self.header.dimension {
                break;
            }

            let size = record_size(dimension) as i64;
            if offset + size > file_size {
                break;
            }

            self.index.entry(hash).or_insert(offset);
            offset += size;
        }
    }

    /// Decodes the record at `offset` into an owned vector.
    ///
    /// Callers hold the store lock (shared is enough), which pins the
    /// mapping for the duration of the copy.
    fn read_vector(&self, offset: i64) -> Result<Vec<f32>> {
        let mmap = self.mmap.as_ref().ok_or(EmbedError::NotFound)?;
        let pos = offset as usize;

        if offset < HEADER_SIZE as i64 || pos + RECORD_META_SIZE > mmap.len() {
            return Err(EmbedError::InvalidFormat(format!(
                "record offset {} out of bounds",
                offset
            )));
        }

        let dimension =
            u32::from_le_bytes(mmap[pos + 8..pos + 12].try_into().unwrap()) as usize;
        let start = pos + RECORD_META_SIZE;
        let end = start + dimension * 4;

        if end > mmap.len() {
            return Err(EmbedError::InvalidFormat(format!(
                "record payload at offset {} exceeds file size",
                offset
            )));
        }

        let mut vector = Vec::with_capacity(dimension);
        for chunk in mmap[start..end].chunks_exact(4) {
            vector.push(f32::from_le_bytes(chunk.try_into().unwrap()));
        }

        Ok(vector)
    }

    /// Replaces the mapping after the file grew. The old mapping is
    /// dropped first so the new one covers the whole file.
    fn remap(&mut self) -> Result<()> {
        self.mmap = None;

        let file = self.file.as_ref().ok_or(EmbedError::Closed)?;
        let len = file.metadata()?.len();

        if len > HEADER_SIZE as u64 {
            self.mmap = Some(unsafe { MmapMut::map_mut(file)? });
        }

        Ok(())
    }

    /// Serializes the in-memory index to the tail of the file and
    /// truncates away any stale bytes beyond it.
    fn write_index_section(&mut self) -> Result<()> {
        let index_offset = self.data_end_offset;

        let mut entries: Vec<IndexEntry> = self
            .index
            .iter()
            .map(|(&hash, &offset)| IndexEntry { hash, offset })
            .collect();
        // Entry order is unspecified by the format; sorting by offset
        // keeps the bytes deterministic for a given logical state.
        entries.sort_unstable_by_key(|e| e.offset);

        let mut buf = Vec::with_capacity(entries.len() * INDEX_ENTRY_SIZE);
        for entry in &entries {
            buf.extend_from_slice(&entry.to_bytes());
        }

        let file = self.file.as_mut().ok_or(EmbedError::Closed)?;
        file.seek(SeekFrom::Start(index_offset as u64))?;
        file.write_all(&buf)?;
        file.set_len(index_offset as u64 + buf.len() as u64)?;

        self.header.index_offset = index_offset as u64;
        // data_offset stays at HEADER_SIZE.

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_insert_get() {
        let dir = tempdir().unwrap();
        let store = EmbedStore::open(dir.path().join("t.edb"), 3).unwrap();

        store.insert("hello", &[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(store.get("hello").unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = EmbedStore::open(dir.path().join("t.edb"), 3).unwrap();

        assert!(matches!(store.get("missing"), Err(EmbedError::NotFound)));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = EmbedStore::open(dir.path().join("t.edb"), 2).unwrap();

        store.insert("k", &[1.0, 2.0]).unwrap();
        let size_after_first = store.stats().unwrap().file_size;

        store.insert("k", &[9.0, 9.0]).unwrap();
        let stats = store.stats().unwrap();

        assert_eq!(stats.records, 1);
        assert_eq!(stats.file_size, size_after_first);
        // The original vector wins.
        assert_eq!(store.get("k").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_operations_after_close_fail() {
        let dir = tempdir().unwrap();
        let store = EmbedStore::open(dir.path().join("t.edb"), 2).unwrap();
        store.insert("k", &[1.0, 2.0]).unwrap();
        store.close().unwrap();

        assert!(matches!(store.get("k"), Err(EmbedError::Closed)));
        assert!(matches!(
            store.insert("k2", &[1.0, 2.0]),
            Err(EmbedError::Closed)
        ));
        assert!(matches!(
            store.find_similar(&[1.0, 2.0], 0.5),
            Err(EmbedError::Closed)
        ));
        assert!(matches!(store.stats(), Err(EmbedError::Closed)));
        // Close is once-only.
        assert!(matches!(store.close(), Err(EmbedError::Closed)));
    }

    #[test]
    fn test_get_or_compute_runs_closure_once() {
        let dir = tempdir().unwrap();
        let store = EmbedStore::open(dir.path().join("t.edb"), 2).unwrap();

        let v = store.get_or_compute("k", || Ok(vec![1.0, 2.0])).unwrap();
        assert_eq!(v, vec![1.0, 2.0]);

        // Second call must serve from the store, not the closure.
        let v = store
            .get_or_compute("k", || panic!("closure must not run on a hit"))
            .unwrap();
        assert_eq!(v, vec![1.0, 2.0]);
    }

    #[test]
    fn test_registry_open_reuse_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reg.edb");
        let path_str = path.to_str().unwrap();

        open_store(path_str, 2).unwrap();
        // Second open of the same path is a no-op.
        open_store(path_str, 2).unwrap();

        with_store(path_str, |store| store.insert("k", &[1.0, 2.0])).unwrap();
        let v = with_store(path_str, |store| store.get("k")).unwrap();
        assert_eq!(v, vec![1.0, 2.0]);

        close_store(path_str).unwrap();
        assert!(matches!(
            with_store(path_str, |store| store.stats()),
            Err(EmbedError::StoreNotFound(_))
        ));
        assert!(matches!(
            close_store(path_str),
            Err(EmbedError::StoreNotFound(_))
        ));
    }
}
