use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const HISTORY_LIMIT: usize = 5;

/// One task and the suggestion it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    task: String,
    suggestion: String,
    timestamp: String,
}

impl TaskRecord {
    pub fn new(task: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::with_timestamp(
            task,
            suggestion,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }

    pub fn with_timestamp(
        task: impl Into<String>,
        suggestion: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            suggestion: suggestion.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Most recent records in insertion order, oldest first.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: VecDeque<TaskRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the last `HISTORY_LIMIT` of `records`.
    pub fn from_records(records: Vec<TaskRecord>) -> Self {
        let mut history = Self::new();
        for record in records {
            history.push(record);
        }
        history
    }

    /// Appends `record`, returning the evicted oldest record on overflow.
    pub fn push(&mut self, record: TaskRecord) -> Option<TaskRecord> {
        self.records.push_back(record);
        if self.records.len() > HISTORY_LIMIT {
            self.records.pop_front()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter()
    }
}
