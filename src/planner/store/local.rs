use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{most_recent, StoreError, TaskStore};
use crate::planner::history::{TaskRecord, HISTORY_LIMIT};

/// History kept as a JSON array in a single file, capped like the in-memory list.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<TaskRecord>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, records: &[TaskRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for LocalStore {
    async fn load_recent(&self, n: usize) -> Result<Vec<TaskRecord>, StoreError> {
        Ok(most_recent(self.read_all().await?, n))
    }

    async fn append(&self, record: &TaskRecord) -> Result<(), StoreError> {
        // An unreadable file is replaced rather than blocking new history.
        let mut records = self.read_all().await.unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable history file");
            Vec::new()
        });
        records.push(record.clone());
        let records = most_recent(records, HISTORY_LIMIT);
        self.write_all(&records).await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> LocalStore {
        let dir = std::env::temp_dir().join(format!("planwise-local-{}", Uuid::new_v4()));
        LocalStore::new(dir.join("history.json"))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let store = temp_store();
        assert!(store.load_recent(5).await.expect("load").is_empty());
        store.clear_all().await.expect("clear missing file");
    }

    #[tokio::test]
    async fn append_persists_and_caps_records() {
        let store = temp_store();
        for n in 0..7 {
            store
                .append(&TaskRecord::with_timestamp(
                    format!("task {n}"),
                    "• step",
                    format!("2026-10-19T10:00:0{n}.000Z"),
                ))
                .await
                .expect("append");
        }

        let reopened = LocalStore::new(store.path());
        let records = reopened.load_recent(10).await.expect("load");
        let tasks: Vec<&str> = records.iter().map(TaskRecord::task).collect();
        assert_eq!(tasks, ["task 2", "task 3", "task 4", "task 5", "task 6"]);

        let last_two = reopened.load_recent(2).await.expect("load");
        assert_eq!(last_two[0].task(), "task 5");
        assert_eq!(last_two[1].task(), "task 6");
    }

    #[tokio::test]
    async fn clear_then_reload_is_empty() {
        let store = temp_store();
        store
            .append(&TaskRecord::new("Water plants", "• Fill can"))
            .await
            .expect("append");
        store.clear_all().await.expect("clear");
        assert!(store.load_recent(5).await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_load_error_but_not_an_append_error() {
        let store = temp_store();
        fs::create_dir_all(store.path().parent().expect("parent"))
            .await
            .expect("mkdir");
        fs::write(store.path(), b"{not json").await.expect("write");

        assert!(matches!(
            store.load_recent(5).await,
            Err(StoreError::Serialization(_))
        ));
        store
            .append(&TaskRecord::new("Fix bike", "• Patch tube"))
            .await
            .expect("append");
        assert_eq!(store.load_recent(5).await.expect("load").len(), 1);
    }
}
