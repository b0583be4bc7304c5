// Copyright (c) 2025 EmbeDB Contributors
// Licensed under the EmbeDB License. See LICENSE file for details.

//! # EmbeDB
//!
//! An embedded single-file cache for embedding vectors, written in Rust.
//!
//! EmbeDB stores dense float32 vectors keyed by arbitrary text in one
//! memory-mapped file. It exists for the gap where a networked vector
//! database is overkill: caching the output of expensive embedding
//! calls in latency-sensitive, short-lived, or serverless processes.
//! Opening a populated file costs milliseconds because only the index
//! section is decoded, not the vectors.
//!
//! ## Features
//!
//! - **Single file, no server** - one `.edb` file per cache, no sidecar
//!   files, no lock files, no daemon
//! - **Memory-mapped reads** - vectors are faulted in on demand and
//!   copied out under a shared lock
//! - **Append-only writes** - inserting is one positional write plus a
//!   remap; records never move
//! - **Constant-time reopen** - a clean close writes a trailing index
//!   section so the next open skips the data section entirely
//! - **LRU of hot vectors** - repeated gets of the same key bypass the
//!   store lock and the mmap
//! - **Cosine similarity search** - linear scan with a score threshold
//! - **C-ABI** - [`ffi`] exposes the store to Python, Node.js, or any
//!   FFI-capable language via a `cdylib`
//!
//! ## Architecture
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`store::EmbedStore`] | The engine: file, mmap, index, locks |
//! | [`types`] | On-disk header, record, and index-entry codecs |
//! | [`hash`] | Stable FNV-1a key hashing |
//! | [`cache::VectorCache`] | Bounded LRU of owned hot vectors |
//! | [`similarity`] | Cosine kernel for the search path |
//! | [`ffi`] | C-ABI shim over the global registry |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use embedb::{EmbedStore, Result};
//!
//! fn main() -> Result<()> {
//!     let store = EmbedStore::open("embeddings.edb", 1536)?;
//!
//!     // Cache an embedding
//!     let embedding = vec![0.1f32; 1536];
//!     store.insert("what is the capital of France", &embedding)?;
//!
//!     // Exact-match lookup
//!     let vector = store.get("what is the capital of France")?;
//!     assert_eq!(vector.len(), 1536);
//!
//!     // Semantic near-match
//!     if let Ok((cached, score)) = store.find_similar(&embedding, 0.95) {
//!         println!("reusing cached vector with score {:.4}", score);
//!         assert_eq!(cached.len(), 1536);
//!     }
//!
//!     store.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Compute-or-cache
//!
//! ```rust,no_run
//! use embedb::EmbedStore;
//!
//! # fn embed(_: &str) -> Vec<f32> { vec![0.0; 1536] }
//! let store = EmbedStore::open("embeddings.edb", 1536)?;
//! let vector = store.get_or_compute("some prompt", || {
//!     Ok(embed("some prompt")) // only runs on a miss
//! })?;
//! # Ok::<(), embedb::EmbedError>(())
//! ```
//!
//! ## Storage Architecture
//!
//! A store file is a 256-byte header, a data section of fixed-layout
//! records (`hash`, `dimension`, reserved word, f32 payload), and an
//! optional index section of `(hash, offset)` pairs written on clean
//! close. Everything is little-endian; files are portable across
//! platforms. Version 1 files predate the index section and are still
//! readable: the open path falls back to scanning the records.
//!
//! The store is strictly single-process. Within a process it is safe to
//! share across threads; see [`store`] for the locking discipline.

pub mod cache;
pub mod error;
pub mod ffi;
pub mod hash;
pub mod similarity;
pub mod store;
pub mod types;

pub use error::{DimensionOrigin, EmbedError, Result};
pub use store::{
    close_store, open_store, open_store_with_options, with_store, EmbedStore, OpenOptions,
    StoreStats, DEFAULT_CACHE_SIZE,
};
