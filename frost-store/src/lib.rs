use std::collections::HashMap;
use std::sync::Mutex;

use frost_types::{error::Result, FrostError};

/// Keyed get/set/pop/delete contract shared by the DKG session, key package
/// and nonce stores (C2).
///
/// `pop` MUST be atomic with respect to concurrent callers — it is the
/// mechanism that prevents a nonce from ever being used to sign twice.
/// `&self` (not `&mut self`) so a single store can be shared behind an
/// `Arc` across concurrently-handled HTTP requests.
pub trait Repository<V>: Send + Sync {
    fn get(&self, key: &str) -> Result<V>;
    fn set(&self, key: &str, value: V) -> Result<()>;
    fn pop(&self, key: &str) -> Result<V>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory `Repository` backed by a single mutex-guarded map.
///
/// The mutex both protects the map and, as a side effect, makes `pop`
/// atomic: a lock is held for the whole remove-and-return.
pub struct MemoryRepository<V> {
    not_found: fn() -> FrostError,
    data: Mutex<HashMap<String, V>>,
}

impl<V: Clone> MemoryRepository<V> {
    pub fn new(not_found: fn() -> FrostError) -> Self {
        Self {
            not_found,
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone + Send> Repository<V> for MemoryRepository<V> {
    fn get(&self, key: &str) -> Result<V> {
        let data = self.data.lock().expect("repository mutex poisoned");
        data.get(key).cloned().ok_or_else(self.not_found)
    }

    fn set(&self, key: &str, value: V) -> Result<()> {
        let mut data = self.data.lock().expect("repository mutex poisoned");
        data.insert(key.to_string(), value);
        Ok(())
    }

    fn pop(&self, key: &str) -> Result<V> {
        let mut data = self.data.lock().expect("repository mutex poisoned");
        data.remove(key).ok_or_else(self.not_found)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.data.lock().expect("repository mutex poisoned");
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips() {
        let repo: MemoryRepository<u32> = MemoryRepository::new(|| FrostError::NonceNotFound);
        repo.set("a", 42).unwrap();
        assert_eq!(repo.get("a").unwrap(), 42);
    }

    #[test]
    fn pop_is_get_and_remove() {
        let repo: MemoryRepository<u32> = MemoryRepository::new(|| FrostError::NonceNotFound);
        repo.set("a", 7).unwrap();
        assert_eq!(repo.pop("a").unwrap(), 7);
        assert!(repo.get("a").is_err());
    }

    #[test]
    fn missing_key_is_not_found() {
        let repo: MemoryRepository<u32> = MemoryRepository::new(|| FrostError::NonceNotFound);
        match repo.get("missing") {
            Err(FrostError::NonceNotFound) => {}
            other => panic!("expected NonceNotFound, got {other:?}"),
        }
    }

    /// Property 5: two concurrent callers popping the same nonce key must
    /// never both succeed — the mutex that guards `pop` makes removal and
    /// read atomic, so exactly one caller observes the value.
    #[test]
    fn concurrent_pop_on_same_key_yields_exactly_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let repo: Arc<MemoryRepository<u32>> = Arc::new(MemoryRepository::new(|| FrostError::NonceNotFound));
        repo.set("nonce", 99).unwrap();

        let a = Arc::clone(&repo);
        let b = Arc::clone(&repo);
        let t1 = thread::spawn(move || a.pop("nonce"));
        let t2 = thread::spawn(move || b.pop("nonce"));

        let r1 = t1.join().unwrap();
        let r2 = t2.join().unwrap();

        let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
        let not_founds = [&r1, &r2]
            .iter()
            .filter(|r| matches!(r, Err(FrostError::NonceNotFound)))
            .count();
        assert_eq!(successes, 1, "exactly one caller should win the pop");
        assert_eq!(not_founds, 1, "the loser should see NonceNotFound");
    }

    #[test]
    fn delete_is_idempotent() {
        let repo: MemoryRepository<u32> = MemoryRepository::new(|| FrostError::NonceNotFound);
        repo.set("a", 1).unwrap();
        repo.delete("a").unwrap();
        repo.delete("a").unwrap();
    }
}
