pub mod client;
pub mod history;
pub mod store;

use std::sync::Arc;
use thiserror::Error;

pub use client::{ProxyClient, SuggestionFailure, SuggestionSource};
pub use history::{History, TaskRecord, HISTORY_LIMIT};
pub use store::{LocalStore, MemoryStore, RemoteStore, StoreError, TaskStore};

pub const EMPTY_TASK_MESSAGE: &str = "Please enter a task first";
pub const RETRY_MESSAGE: &str = "Failed to get suggestion. Please try again.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Task is empty")]
    EmptyTask,

    #[error(transparent)]
    Failed(#[from] SuggestionFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    pub fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

/// Client-side planner state. The suggestion source and the history store are injected.
pub struct Planner {
    source: Arc<dyn SuggestionSource>,
    store: Arc<dyn TaskStore>,
    history: History,
    draft: String,
    suggestion: Option<String>,
    message: Option<String>,
    // Read only by tests; `&mut self` already serializes submits.
    #[cfg_attr(not(test), allow(dead_code))]
    loading: bool,
}

// Clears the loading flag even when the submit future is dropped mid-request.
struct LoadingFlag<'a>(&'a mut bool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl Planner {
    pub fn new(source: Arc<dyn SuggestionSource>, store: Arc<dyn TaskStore>) -> Self {
        Self {
            source,
            store,
            history: History::new(),
            draft: String::new(),
            suggestion: None,
            message: None,
            loading: false,
        }
    }

    /// Populates history from the store. A failing store leaves history empty.
    pub async fn load(&mut self) {
        self.history = match self.store.load_recent(HISTORY_LIMIT).await {
            Ok(records) => History::from_records(records),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load task history");
                History::new()
            }
        };
        tracing::debug!(records = self.history.len(), "Task history loaded");
    }

    pub async fn submit(&mut self, task: &str) -> Result<TaskRecord, SubmitError> {
        if task.trim().is_empty() {
            self.message = Some(EMPTY_TASK_MESSAGE.to_string());
            return Err(SubmitError::EmptyTask);
        }
        self.message = None;

        let outcome = {
            let _loading = LoadingFlag::raise(&mut self.loading);
            self.source.suggest(task).await
        };

        let envelope = match outcome {
            Ok(envelope) => envelope,
            Err(failure) => {
                tracing::warn!(error = %failure, "Suggestion request failed");
                self.message = Some(
                    failure
                        .user_message()
                        .unwrap_or(RETRY_MESSAGE)
                        .to_string(),
                );
                return Err(failure.into());
            }
        };

        let record = TaskRecord::new(task, envelope.suggestion);
        self.suggestion = Some(record.suggestion().to_string());
        if let Some(evicted) = self.history.push(record.clone()) {
            tracing::debug!(task = evicted.task(), "Evicted oldest history entry");
        }
        if let Err(e) = self.store.append(&record).await {
            tracing::warn!(error = %e, "Failed to persist task record");
        }
        Ok(record)
    }

    /// Empties history in memory and in the store. Memory is cleared even if the store fails.
    pub async fn clear_history(&mut self) -> Result<(), StoreError> {
        self.history.clear();
        self.store.clear_all().await
    }

    /// Ctrl+Enter submits the draft; other keys edit it.
    pub async fn handle_key(&mut self, press: KeyPress) -> Option<Result<TaskRecord, SubmitError>> {
        match (press.key, press.ctrl) {
            (Key::Enter, true) => {
                let draft = self.draft.clone();
                Some(self.submit(&draft).await)
            }
            (Key::Enter, false) => {
                self.draft.push('\n');
                None
            }
            (Key::Backspace, _) => {
                self.draft.pop();
                None
            }
            (Key::Char(c), false) => {
                self.draft.push(c);
                None
            }
            (Key::Char(_), true) => None,
        }
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    /// Validation or retry message to show the user.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
