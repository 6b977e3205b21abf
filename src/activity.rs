use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::config::ACTIVITY_BUFFER_SIZE;

/// One user-visible event in the workbench (run finished, comparison failed, ...).
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: ActivitySource,
    pub level: ActivityLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySource {
    Workbench,
    Run,
    Comparison,
    Datasets,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Info,
    Warn,
    Error,
}

/// Bounded history plus a live broadcast for SSE subscribers.
pub struct ActivityLog {
    buffer: RwLock<VecDeque<ActivityEntry>>,
    sender: broadcast::Sender<ActivityEntry>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(ACTIVITY_BUFFER_SIZE)),
            sender,
        }
    }

    pub async fn push(&self, entry: ActivityEntry) {
        let mut buf = self.buffer.write().await;
        if buf.len() >= ACTIVITY_BUFFER_SIZE {
            buf.pop_front();
        }
        buf.push_back(entry.clone());
        drop(buf);

        let _ = self.sender.send(entry);
    }

    pub async fn history(&self) -> Vec<ActivityEntry> {
        self.buffer.read().await.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEntry> {
        self.sender.subscribe()
    }

    pub async fn emit(
        &self,
        source: ActivitySource,
        level: ActivityLevel,
        message: impl Into<String>,
    ) {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source,
            level,
            message: message.into(),
        };
        self.push(entry).await;
    }
}
