//! Async access to vibe resolution and metrics.
//!
//! [`VibeDB`] is synchronous, like any embedded database. Services running on
//! a tokio runtime talk to it through [`VibeProvider`], whose default
//! implementation [`DbVibeProvider`] moves each call onto the blocking pool.
//!
//! Dropping a provider future does not cancel the blocking call behind it.
//! Each storage write is one transaction, so an abandoned request leaves
//! either the whole vibe or metric row, or nothing.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::db::VibeDB;
use crate::error::{Result, VibeDBError};
use crate::metric::MetricsByOption;
use crate::types::CallerId;
use crate::vibe_check::OptionRecord;

/// Async surface over vibe resolution and metric collection.
///
/// Payloads cross this boundary as raw bytes inside [`OptionRecord`];
/// decode them with the database's [`PayloadCodec`](crate::PayloadCodec).
#[async_trait]
pub trait VibeProvider: Send + Sync {
    /// Resolves the caller's option for the active vibe check `vibe_name`.
    ///
    /// See [`VibeDB::resolve`].
    async fn resolve(&self, vibe_name: &str, caller: CallerId) -> Result<Option<OptionRecord>>;

    /// Records a metric against the caller's vibe.
    ///
    /// See [`VibeDB::record_metric`].
    async fn record_metric(
        &self,
        metric_name: &str,
        value: Decimal,
        vibe_name: &str,
        caller: CallerId,
    ) -> Result<()>;

    /// Metrics of the active vibe check grouped by option.
    ///
    /// See [`VibeDB::metrics_by_option`].
    async fn metrics_by_option(&self, vibe_name: &str) -> Result<Option<MetricsByOption>>;

    /// Whether a vibe check named `vibe_name` is active.
    async fn vibe_check_exists(&self, vibe_name: &str) -> Result<bool>;
}

/// [`VibeProvider`] backed by a shared [`VibeDB`].
///
/// Requires a tokio runtime.
#[derive(Clone, Debug)]
pub struct DbVibeProvider {
    db: Arc<VibeDB>,
}

impl DbVibeProvider {
    /// Wraps a shared database handle.
    pub fn new(db: Arc<VibeDB>) -> Self {
        Self { db }
    }

    /// Returns the wrapped database.
    pub fn db(&self) -> &Arc<VibeDB> {
        &self.db
    }

    /// Resolves the caller's vibe and decodes its payload to `V`.
    ///
    /// # Errors
    ///
    /// Returns [`VibeDBError::Payload`] if the payload is not a valid `V`.
    pub async fn feel_vibe<V: DeserializeOwned>(
        &self,
        vibe_name: &str,
        caller: CallerId,
    ) -> Result<Option<V>> {
        let codec = self.db.config().payload_codec;
        match self.resolve(vibe_name, caller).await? {
            Some(option) => Ok(Some(codec.decode(&option.payload)?)),
            None => Ok(None),
        }
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&VibeDB) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| VibeDBError::runtime(format!("blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl VibeProvider for DbVibeProvider {
    async fn resolve(&self, vibe_name: &str, caller: CallerId) -> Result<Option<OptionRecord>> {
        let vibe_name = vibe_name.to_owned();
        self.run_blocking(move |db| db.resolve(&vibe_name, caller))
            .await
    }

    async fn record_metric(
        &self,
        metric_name: &str,
        value: Decimal,
        vibe_name: &str,
        caller: CallerId,
    ) -> Result<()> {
        let metric_name = metric_name.to_owned();
        let vibe_name = vibe_name.to_owned();
        self.run_blocking(move |db| db.record_metric(&metric_name, value, &vibe_name, caller))
            .await
    }

    async fn metrics_by_option(&self, vibe_name: &str) -> Result<Option<MetricsByOption>> {
        let vibe_name = vibe_name.to_owned();
        self.run_blocking(move |db| db.metrics_by_option(&vibe_name))
            .await
    }

    async fn vibe_check_exists(&self, vibe_name: &str) -> Result<bool> {
        let vibe_name = vibe_name.to_owned();
        self.run_blocking(move |db| db.vibe_check_exists(&vibe_name))
            .await
    }
}
