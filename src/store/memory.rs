//! In-memory storage implementation

use bytes::Bytes;
use parking_lot::RwLock;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

type SipBuildHasher = BuildHasherDefault<SipHasher13>;

/// Scalar keyspace: key -> value
type StringMap = HashMap<Bytes, Bytes, SipBuildHasher>;

/// Fields of a single hash: field -> value
type FieldMap = HashMap<Bytes, Bytes, SipBuildHasher>;

/// Hash keyspace: hash name -> fields
type HashMapStore = HashMap<Bytes, FieldMap, SipBuildHasher>;

/// In-memory key-value store
///
/// Strings and hashes live in two disjoint keyspaces, each guarded by its own
/// reader/writer lock. No operation holds both locks, so nothing here is
/// atomic across the two.
pub struct MemoryStore {
    strings: RwLock<StringMap>,
    hashes: RwLock<HashMapStore>,
}

impl MemoryStore {
    /// Create a new memory store with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new memory store with specified initial capacity per keyspace
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStore {
            strings: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                SipBuildHasher::default(),
            )),
            hashes: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                SipBuildHasher::default(),
            )),
        }
    }

    /// Set a string key, returns true if the key is new
    pub fn set(&self, key: Bytes, value: Bytes) -> bool {
        self.strings.write().insert(key, value).is_none()
    }

    /// Get a string value
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.strings.read().get(key).cloned()
    }

    /// Set a field in a hash, creating the hash on first write.
    /// Returns true if the field is new.
    pub fn hset(&self, hash: Bytes, field: Bytes, value: Bytes) -> bool {
        let mut hashes = self.hashes.write();
        hashes
            .entry(hash)
            .or_default()
            .insert(field, value)
            .is_none()
    }

    /// Get a single hash field
    pub fn hget(&self, hash: &[u8], field: &[u8]) -> Option<Bytes> {
        self.hashes.read().get(hash)?.get(field).cloned()
    }

    /// Copy out every field/value pair of a hash
    ///
    /// The copy is taken under the read lock; callers build their reply after
    /// it is released, so the result is a point-in-time snapshot of this hash
    /// only. Pair order is unspecified.
    pub fn hgetall(&self, hash: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        let hashes = self.hashes.read();
        let fields = hashes.get(hash)?;
        Some(
            fields
                .iter()
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
        )
    }

    /// Get statistics about the store
    pub fn stats(&self) -> StoreStats {
        let string_keys = self.strings.read().len();
        let (hash_keys, hash_fields) = {
            let hashes = self.hashes.read();
            (hashes.len(), hashes.values().map(|h| h.len()).sum())
        };

        StoreStats {
            string_keys,
            hash_keys,
            hash_fields,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the memory store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub string_keys: usize,
    pub hash_keys: usize,
    pub hash_fields: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_basic_set_get() {
        let store = MemoryStore::new();
        assert!(store.set(Bytes::from("key1"), Bytes::from("value1")));
        assert!(!store.set(Bytes::from("key1"), Bytes::from("value2")));

        assert_eq!(store.get(b"key1"), Some(Bytes::from("value2")));
        assert_eq!(store.get(b"key2"), None);
    }

    #[test]
    fn test_hash_created_on_first_write() {
        let store = MemoryStore::new();
        assert_eq!(store.hgetall(b"h"), None);

        store.hset(Bytes::from("h"), Bytes::from("f1"), Bytes::from("v1"));
        store.hset(Bytes::from("h"), Bytes::from("f2"), Bytes::from("v2"));

        assert_eq!(store.hget(b"h", b"f1"), Some(Bytes::from("v1")));
        assert_eq!(store.hget(b"h", b"missing"), None);
        assert_eq!(store.hget(b"nope", b"f1"), None);

        let mut pairs = store.hgetall(b"h").unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                (Bytes::from("f1"), Bytes::from("v1")),
                (Bytes::from("f2"), Bytes::from("v2")),
            ]
        );
    }

    #[test]
    fn test_keyspaces_are_disjoint() {
        let store = MemoryStore::new();
        store.set(Bytes::from("k"), Bytes::from("string"));
        store.hset(Bytes::from("k"), Bytes::from("f"), Bytes::from("hash"));

        assert_eq!(store.get(b"k"), Some(Bytes::from("string")));
        assert_eq!(store.hget(b"k", b"f"), Some(Bytes::from("hash")));
        assert_eq!(
            store.stats(),
            StoreStats { string_keys: 1, hash_keys: 1, hash_fields: 1 }
        );
    }

    #[test]
    fn test_concurrent_writers_never_tear_values() {
        let store = Arc::new(MemoryStore::new());
        let a = Bytes::from(vec![b'a'; 4096]);
        let b = Bytes::from(vec![b'b'; 4096]);

        let handles: Vec<_> = [a.clone(), b.clone()]
            .into_iter()
            .map(|value| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        store.set(Bytes::from("key"), value.clone());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let value = store.get(b"key").unwrap();
        assert!(value == a || value == b);
    }
}
