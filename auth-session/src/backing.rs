// Pluggable record backing
//
// Both tables in this crate store their records through this interface so a
// deployment can back them with an external cache. The default backing is an
// in-memory map and never fails.

use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// Keyed record storage with the minimal surface the tables need
#[async_trait]
pub trait RecordBacking<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<T>>;

    async fn put(&self, key: &str, record: T) -> Result<()>;

    /// Remove a record; returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Snapshot of all records
    async fn scan(&self) -> Result<Vec<(String, T)>>;
}

/// In-memory backing over a concurrent map
pub struct InMemoryBacking<T> {
    entries: DashMap<String, T>,
}

impl<T> InMemoryBacking<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T> Default for InMemoryBacking<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> RecordBacking<T> for InMemoryBacking<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<T>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, record: T) -> Result<()> {
        self.entries.insert(key.to_string(), record);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn scan(&self) -> Result<Vec<(String, T)>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let backing: InMemoryBacking<u32> = InMemoryBacking::new();

        assert_eq!(backing.get("a").await.unwrap(), None);
        backing.put("a", 1).await.unwrap();
        backing.put("b", 2).await.unwrap();
        assert_eq!(backing.get("a").await.unwrap(), Some(1));

        let mut scanned = backing.scan().await.unwrap();
        scanned.sort();
        assert_eq!(scanned, vec![("a".to_string(), 1), ("b".to_string(), 2)]);

        assert!(backing.delete("a").await.unwrap());
        assert!(!backing.delete("a").await.unwrap());
        assert_eq!(backing.get("a").await.unwrap(), None);
    }
}
