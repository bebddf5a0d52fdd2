use async_trait::async_trait;
use chrono::DateTime;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use super::{most_recent, StoreError, TaskStore};
use crate::planner::history::{TaskRecord, HISTORY_LIMIT};

const COLLECTION: &str = "tasks";

/// REST document store addressed with Firebase-style `{base}/tasks/{id}.json` paths.
///
/// Ids are UUID v7, so sorting by id follows insertion order within a timestamp.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    auth: Option<String>,
}

impl RemoteStore {
    pub fn new(base_url: &str, auth: Option<&str>, timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: auth.map(str::to_string),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    fn document_url(&self, id: &str) -> String {
        self.url(&format!("{}/{}", COLLECTION, id))
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = self.with_auth(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// All documents, oldest first: by timestamp, then by id.
    async fn documents(&self) -> Result<Vec<(String, TaskRecord)>, StoreError> {
        let response = self.send(self.client.get(self.url(COLLECTION))).await?;
        // An empty collection comes back as `null`.
        let documents: Option<HashMap<String, TaskRecord>> = response.json().await?;
        let mut documents: Vec<(String, TaskRecord)> =
            documents.unwrap_or_default().into_iter().collect();
        documents.sort_by(|(id_a, a), (id_b, b)| {
            let parsed_a = DateTime::parse_from_rfc3339(a.timestamp()).ok();
            let parsed_b = DateTime::parse_from_rfc3339(b.timestamp()).ok();
            parsed_a
                .cmp(&parsed_b)
                .then_with(|| a.timestamp().cmp(b.timestamp()))
                .then_with(|| id_a.cmp(id_b))
        });
        Ok(documents)
    }

    /// Deletes all but the newest `keep` documents.
    async fn prune(&self, keep: usize) -> Result<usize, StoreError> {
        let documents = self.documents().await?;
        let excess = documents.len().saturating_sub(keep);
        for (id, _) in &documents[..excess] {
            self.send(self.client.delete(self.document_url(id))).await?;
        }
        Ok(excess)
    }
}

#[async_trait]
impl TaskStore for RemoteStore {
    async fn load_recent(&self, n: usize) -> Result<Vec<TaskRecord>, StoreError> {
        let records = self
            .documents()
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .collect();
        Ok(most_recent(records, n))
    }

    async fn append(&self, record: &TaskRecord) -> Result<(), StoreError> {
        let id = Uuid::now_v7();
        self.send(self.client.put(self.document_url(&id.to_string())).json(record))
            .await?;
        tracing::debug!(%id, "Stored task record remotely");

        match self.prune(HISTORY_LIMIT).await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Pruned old remote task records"),
            Err(e) => tracing::warn!(error = %e, "Failed to prune remote task records"),
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.send(self.client.delete(self.url(COLLECTION))).await?;
        Ok(())
    }
}
