//! Subscriber store capability.

use async_trait::async_trait;

use crate::error::StoreResult;

/// Durable set of subscriber ids.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Record a subscriber if the id is not already stored.
    ///
    /// Returns `true` when a new record was created. Saving a known id
    /// is a no-op and never an error.
    async fn save(&self, id: u64, name: Option<&str>) -> StoreResult<bool>;

    /// All stored subscriber ids.
    async fn list_ids(&self) -> StoreResult<Vec<u64>>;

    /// Number of distinct subscribers.
    async fn count(&self) -> StoreResult<u64>;
}

/// In-memory store for handler tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    ids: std::sync::Mutex<Vec<u64>>,
    fail_reads: bool,
    fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_ids(ids: &[u64]) -> Self {
        Self {
            ids: std::sync::Mutex::new(ids.to_vec()),
            ..Default::default()
        }
    }

    /// A store whose `list_ids` and `count` always fail.
    pub fn unreadable() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    /// A store whose `save` always fails.
    pub fn unwritable() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn ids(&self) -> Vec<u64> {
        self.ids.lock().unwrap().clone()
    }

    fn offline() -> crate::error::StoreError {
        std::io::Error::new(std::io::ErrorKind::NotConnected, "store offline").into()
    }
}

#[cfg(test)]
#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn save(&self, id: u64, _name: Option<&str>) -> StoreResult<bool> {
        if self.fail_writes {
            return Err(Self::offline());
        }
        let mut ids = self.ids.lock().unwrap();
        if ids.contains(&id) {
            return Ok(false);
        }
        ids.push(id);
        Ok(true)
    }

    async fn list_ids(&self) -> StoreResult<Vec<u64>> {
        if self.fail_reads {
            return Err(Self::offline());
        }
        Ok(self.ids())
    }

    async fn count(&self) -> StoreResult<u64> {
        if self.fail_reads {
            return Err(Self::offline());
        }
        Ok(self.ids.lock().unwrap().len() as u64)
    }
}
