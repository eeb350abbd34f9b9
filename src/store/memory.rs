use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{StoreError, WaitlistStore};
use crate::models::WaitlistEntry;

/// Key-value waitlist kept in process memory: email -> created_at.
///
/// Useful for local runs and tests. Entries are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn get(&self, email: &str) -> Option<WaitlistEntry> {
        self.entries.get(email).map(|created_at| WaitlistEntry {
            email: email.to_string(),
            created_at: *created_at,
        })
    }

    pub fn contains(&self, email: &str) -> bool {
        self.entries.contains_key(email)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl WaitlistStore for MemoryStore {
    async fn insert(&self, email: &str) -> Result<WaitlistEntry, StoreError> {
        // existence check and put happen under the same shard lock
        match self.entries.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let created_at = Utc::now();
                slot.insert(created_at);
                Ok(WaitlistEntry {
                    email: email.to_string(),
                    created_at,
                })
            }
        }
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.entries.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
