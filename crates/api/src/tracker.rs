//! In-memory registry of video operations.
//!
//! Each entry maps a service-issued operation id to the provider's
//! operation name, the owning user and the last known state. The map is
//! behind an `RwLock`; each entry has its own `Mutex`, so polls of
//! different operations never wait on each other while concurrent polls of
//! the same operation are serialized (and only one of them contacts the
//! provider at a time).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mediagen_core::error::CoreError;
use mediagen_core::operation::{OperationSnapshot, OperationState};
use mediagen_core::types::{Timestamp, UserId};
use mediagen_provider::{ProviderError, VideoGateway, VideoPoll};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug)]
struct TrackedOperation {
    owner: UserId,
    provider_name: String,
    state: OperationState,
    created_at: Timestamp,
    finished_at: Option<Timestamp>,
}

impl TrackedOperation {
    fn is_expired(&self, now: Timestamp, retention: Duration, max_age: Duration) -> bool {
        let older_than = |since: Timestamp, limit: Duration| {
            (now - since).to_std().is_ok_and(|age| age >= limit)
        };
        match self.finished_at {
            Some(finished) => older_than(finished, retention),
            None => older_than(self.created_at, max_age),
        }
    }
}

pub struct OperationTracker {
    entries: RwLock<HashMap<String, Arc<Mutex<TrackedOperation>>>>,
    retention: Duration,
    max_age: Duration,
}

impl OperationTracker {
    /// * `retention` - how long a finished operation stays pollable.
    /// * `max_age`   - how long an unfinished operation is kept at all.
    pub fn new(retention: Duration, max_age: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            retention,
            max_age,
        }
    }

    /// Record a freshly submitted provider operation for `owner`.
    pub async fn register(&self, owner: &str, provider_name: String) -> OperationSnapshot {
        let operation_id = Uuid::new_v4().to_string();
        let entry = TrackedOperation {
            owner: owner.to_string(),
            provider_name,
            state: OperationState::Processing,
            created_at: Utc::now(),
            finished_at: None,
        };
        let snapshot = entry.state.snapshot(&operation_id);

        self.entries
            .write()
            .await
            .insert(operation_id.clone(), Arc::new(Mutex::new(entry)));

        tracing::info!(%operation_id, user_id = %owner, "Registered video operation");
        snapshot
    }

    /// Current status of `operation_id` as seen by `owner`.
    ///
    /// Finished operations are answered from memory. Unfinished ones are
    /// re-queried through `gateway`. A provider rejection (4xx) is final and
    /// fails the operation; transport failures and timeouts are returned as
    /// errors and leave the entry unchanged.
    pub async fn status(
        &self,
        owner: &str,
        operation_id: &str,
        gateway: &dyn VideoGateway,
    ) -> Result<OperationSnapshot, AppError> {
        let not_found = || {
            AppError::Core(CoreError::NotFound {
                entity: "Operation",
                id: operation_id.to_string(),
            })
        };

        let entry = self
            .entries
            .read()
            .await
            .get(operation_id)
            .cloned()
            .ok_or_else(not_found)?;

        let mut op = entry.lock().await;
        if op.owner != owner {
            return Err(not_found());
        }
        if op.state.is_terminal() {
            return Ok(op.state.snapshot(operation_id));
        }

        let next = match gateway.poll(&op.provider_name).await {
            Ok(VideoPoll::Pending) => None,
            Ok(VideoPoll::Completed(payload)) => Some(OperationState::Completed(payload.into())),
            Ok(VideoPoll::Failed(message)) => Some(OperationState::Failed(message)),
            // A refused poll is answered the same way on every retry.
            Err(ProviderError::Rejected { status, message }) => {
                tracing::warn!(
                    %operation_id,
                    provider_status = status,
                    error = %message,
                    "Provider rejected operation poll",
                );
                Some(OperationState::Failed(message))
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(next) = next {
            if op.state.transition(next) {
                op.finished_at = Some(Utc::now());
                tracing::info!(
                    %operation_id,
                    status = ?op.state.status(),
                    "Video operation finished",
                );
            }
        }

        Ok(op.state.snapshot(operation_id))
    }

    /// Drop finished entries past their retention and unfinished entries
    /// past the maximum age. Entries currently being polled are skipped.
    /// Returns the number removed.
    pub async fn evict_expired(&self, now: Timestamp) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| match entry.try_lock() {
            Ok(op) => !op.is_expired(now, self.retention, self.max_age),
            Err(_) => true,
        });
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
