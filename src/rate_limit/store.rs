use crate::error::StoreError;
use dashmap::DashMap;

use super::window::Millis;

// Key -> chronological request timestamps. Each call holds the key's lock,
// so two admissions for one key never interleave.
pub trait RateLimitStore: Send + Sync {
    // An emptied list deletes the key
    fn update(&self, key: &str, f: &mut dyn FnMut(&mut Vec<Millis>)) -> Result<(), StoreError>;

    // Returns how many keys were deleted
    fn retain(&self, f: &mut dyn FnMut(&str, &mut Vec<Millis>)) -> Result<usize, StoreError>;

    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<Millis>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn snapshot(&self, key: &str) -> Option<Vec<Millis>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }
}

impl RateLimitStore for MemoryStore {
    fn update(&self, key: &str, f: &mut dyn FnMut(&mut Vec<Millis>)) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        let now_empty = {
            let mut entry = self.entries.entry(key.to_string()).or_default();
            f(entry.value_mut());
            entry.is_empty()
        };

        if now_empty {
            self.entries.remove_if(key, |_, timestamps| timestamps.is_empty());
        }
        Ok(())
    }

    fn retain(&self, f: &mut dyn FnMut(&str, &mut Vec<Millis>)) -> Result<usize, StoreError> {
        let mut removed = 0;
        self.entries.retain(|key, timestamps| {
            f(key.as_str(), timestamps);
            let keep = !timestamps.is_empty();
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_creates_and_deletes_keys() {
        let store = MemoryStore::new();
        store.update("feedback:1.2.3.4", &mut |ts| ts.push(5)).unwrap();
        assert_eq!(store.snapshot("feedback:1.2.3.4"), Some(vec![5]));
        assert_eq!(store.len(), 1);

        store.update("feedback:1.2.3.4", &mut |ts| ts.clear()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn reading_an_absent_key_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let mut seen = None;
        store.update("admin:5.6.7.8", &mut |ts| seen = Some(ts.len())).unwrap();
        assert_eq!(seen, Some(0));
        assert!(store.is_empty());
    }

    #[test]
    fn retain_counts_removed_keys() {
        let store = MemoryStore::new();
        store.update("a:1", &mut |ts| ts.push(1)).unwrap();
        store.update("b:1", &mut |ts| ts.push(100)).unwrap();

        let removed = store.retain(&mut |_, ts| ts.retain(|&t| t > 50)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.snapshot("b:1"), Some(vec![100]));
        assert_eq!(store.snapshot("a:1"), None);
    }

    #[test]
    fn empty_key_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update("", &mut |_| {}),
            Err(StoreError::InvalidKey(_))
        ));
    }
}
