use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{most_recent, StoreError, TaskStore};
use crate::planner::history::TaskRecord;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<TaskRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn load_recent(&self, n: usize) -> Result<Vec<TaskRecord>, StoreError> {
        Ok(most_recent(self.records.lock().await.clone(), n))
    }

    async fn append(&self, record: &TaskRecord) -> Result<(), StoreError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.records.lock().await.clear();
        Ok(())
    }
}
