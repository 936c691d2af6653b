//! Key-value persistence for storefront carts.
//!
//! A [`KvStore`] moves bytes; [`Cache`] adds JSON serialization on top, and
//! [`SnapshotStore`] keeps one versioned value under a key. Two backends are
//! provided: [`MemoryStore`] for tests and previews, [`FileStore`] for
//! anything that should survive a restart.
//!
//! # Example
//!
//! ```rust
//! use storefront_cache::{MemoryStore, SessionId, SnapshotStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Cart {
//!     items: Vec<String>,
//! }
//!
//! let session = SessionId::generate();
//! let carts = SnapshotStore::<Cart, _>::for_session(MemoryStore::new(), "cart", &session);
//!
//! carts.save(&Cart { items: vec!["tee".into()] }).unwrap();
//! let cart = carts.load().unwrap().unwrap_or_default();
//! assert_eq!(cart.items, vec!["tee"]);
//! ```

mod error;
mod file;
mod kv;
mod memory;
mod snapshot;

pub use error::CacheError;
pub use file::FileStore;
pub use kv::{Cache, KvStore};
pub use memory::MemoryStore;
pub use snapshot::{SessionId, SnapshotStore, Versioned};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Cache, CacheError, FileStore, KvStore, MemoryStore, SessionId, SnapshotStore, Versioned,
    };
}
