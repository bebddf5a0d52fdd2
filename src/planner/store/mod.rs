//! Task history persistence. One async contract with interchangeable backends:
//! a local JSON file, a remote REST document store, and an in-process store.

pub mod local;
pub mod memory;
pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

use super::history::TaskRecord;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store error ({status}): {body}")]
    Remote { status: u16, body: String },
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Up to `n` most recent records, oldest first.
    async fn load_recent(&self, n: usize) -> Result<Vec<TaskRecord>, StoreError>;

    async fn append(&self, record: &TaskRecord) -> Result<(), StoreError>;

    async fn clear_all(&self) -> Result<(), StoreError>;
}

fn most_recent(mut records: Vec<TaskRecord>, n: usize) -> Vec<TaskRecord> {
    let skip = records.len().saturating_sub(n);
    records.drain(..skip);
    records
}
