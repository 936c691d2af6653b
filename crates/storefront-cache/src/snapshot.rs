//! Versioned snapshot records and visitor session ids.

use crate::{cache_key, Cache, CacheError, KvStore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// A unique visitor session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A stored value with its write count and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Starts at 1 and increases on every save.
    pub version: u64,
    /// Unix timestamp (seconds) of the last save.
    pub saved_at: u64,
    pub data: T,
}

/// One versioned value under a fixed key.
///
/// # Example
///
/// ```rust
/// use storefront_cache::{MemoryStore, SnapshotStore};
///
/// let snapshots = SnapshotStore::<Vec<String>, _>::new(MemoryStore::new(), "cart");
/// assert_eq!(snapshots.save(&vec!["tee".to_string()]).unwrap(), 1);
/// assert_eq!(snapshots.save(&vec![]).unwrap(), 2);
/// assert_eq!(snapshots.load().unwrap(), Some(vec![]));
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore<T, S> {
    cache: Cache<S>,
    key: String,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, S> SnapshotStore<T, S>
where
    T: Serialize + DeserializeOwned,
    S: KvStore,
{
    /// Snapshots stored under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            cache: Cache::new(store),
            key: key.into(),
            _phantom: PhantomData,
        }
    }

    /// Snapshots for one visitor session, under `namespace:session`.
    pub fn for_session(store: S, namespace: &str, session: &SessionId) -> Self {
        Self::new(store, cache_key!(namespace, session))
    }

    /// Key the snapshot is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored value, if any.
    pub fn load(&self) -> Result<Option<T>, CacheError> {
        Ok(self.load_versioned()?.map(|record| record.data))
    }

    /// Load the stored value with its version.
    pub fn load_versioned(&self) -> Result<Option<Versioned<T>>, CacheError> {
        self.cache.get(&self.key)
    }

    /// Save a value, returning its new version.
    pub fn save(&self, data: &T) -> Result<u64, CacheError> {
        let version = match self.cache.store().get(&self.key)? {
            Some(bytes) => serde_json::from_slice::<VersionOnly>(&bytes)
                .map(|v| v.version.saturating_add(1))
                .unwrap_or(1),
            None => 1,
        };
        let record = VersionedRef {
            version,
            saved_at: unix_now(),
            data,
        };
        self.cache.set(&self.key, &record)?;
        debug!(key = %self.key, version, "snapshot_saved");
        Ok(version)
    }

    /// Delete the stored value.
    pub fn delete(&self) -> Result<(), CacheError> {
        self.cache.delete(&self.key)
    }

    pub fn exists(&self) -> Result<bool, CacheError> {
        self.cache.exists(&self.key)
    }
}

// Reads only the version so a record whose data no longer parses can still
// be overwritten with a higher version.
#[derive(Deserialize)]
struct VersionOnly {
    version: u64,
}

#[derive(Serialize)]
struct VersionedRef<'a, T> {
    version: u64,
    saved_at: u64,
    data: &'a T,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStore, MemoryStore};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Draft {
        items: Vec<String>,
    }

    fn draft(items: &[&str]) -> Draft {
        Draft {
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_session_id_generate_format() {
        let id = SessionId::generate();
        assert!(id.as_str().starts_with("sess_"));
        // 18 bytes encode to 24 base64 characters.
        assert_eq!(id.as_str().len(), 29);
        assert_ne!(id, SessionId::generate());
    }

    #[test]
    fn test_session_id_serialization() {
        let id = SessionId::new("sess_abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""sess_abc""#);
        assert_eq!(serde_json::from_str::<SessionId>(&json).unwrap(), id);
    }

    #[test]
    fn test_save_increments_version() {
        let snapshots = SnapshotStore::<Draft, _>::new(MemoryStore::new(), "cart");
        assert_eq!(snapshots.load().unwrap(), None);

        assert_eq!(snapshots.save(&draft(&["a"])).unwrap(), 1);
        assert_eq!(snapshots.save(&draft(&["a", "b"])).unwrap(), 2);

        let record = snapshots.load_versioned().unwrap().unwrap();
        assert_eq!(record.version, 2);
        assert_eq!(record.data, draft(&["a", "b"]));
        assert!(record.saved_at > 0);
    }

    #[test]
    fn test_delete() {
        let snapshots = SnapshotStore::<Draft, _>::new(MemoryStore::new(), "cart");
        snapshots.save(&draft(&["a"])).unwrap();
        assert!(snapshots.exists().unwrap());
        snapshots.delete().unwrap();
        assert_eq!(snapshots.load().unwrap(), None);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = Arc::new(MemoryStore::new());
        let alice = SnapshotStore::<Draft, _>::for_session(
            Arc::clone(&store),
            "cart",
            &SessionId::new("sess_alice"),
        );
        let bob = SnapshotStore::<Draft, _>::for_session(
            Arc::clone(&store),
            "cart",
            &SessionId::new("sess_bob"),
        );

        alice.save(&draft(&["mug"])).unwrap();
        assert_eq!(alice.key(), "cart:sess_alice");
        assert_eq!(bob.load().unwrap(), None);
        assert_eq!(store.keys().unwrap(), vec!["cart:sess_alice"]);
    }

    #[test]
    fn test_corrupt_record_is_overwritten() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("cart", br#"{"version": 4, "saved_at": 1, "data": 17}"#)
            .unwrap();
        let snapshots = SnapshotStore::<Draft, _>::new(Arc::clone(&store), "cart");

        assert!(snapshots.load().is_err());
        assert_eq!(snapshots.save(&draft(&["a"])).unwrap(), 5);
        assert_eq!(snapshots.load().unwrap(), Some(draft(&["a"])));
    }

    #[test]
    fn test_file_backed_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots =
            SnapshotStore::<Draft, _>::new(FileStore::open(dir.path()).unwrap(), "cart");
        snapshots.save(&draft(&["a"])).unwrap();

        let reopened =
            SnapshotStore::<Draft, _>::new(FileStore::open(dir.path()).unwrap(), "cart");
        assert_eq!(reopened.load().unwrap(), Some(draft(&["a"])));
    }
}
