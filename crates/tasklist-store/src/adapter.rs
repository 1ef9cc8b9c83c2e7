//! Typed interface the task repository consumes.

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::StoreError;
use crate::path::StorePath;

/// Async tree store: subscribe, write, push, update, remove, read-once.
///
/// Each call resolves once the store acknowledged it. No ordering is promised
/// between a subscription delivering the effect of one call and the issuing of
/// the next.
pub trait TreeStore: Send + Sync {
    /// Subscribe to full snapshots of the subtree at `path`.
    ///
    /// # Errors
    /// Returns a store error when the subscription cannot be registered.
    fn subscribe(
        &self,
        path: &StorePath,
    ) -> impl Future<Output = Result<Subscription, StoreError>> + Send;

    /// Replace the value at `path`. Writing `null` removes the node.
    ///
    /// # Errors
    /// Returns a store error on connectivity or permission failure.
    fn write(
        &self,
        path: &StorePath,
        value: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Write `value` at `path` only if nothing exists there yet.
    ///
    /// Returns false, leaving the existing node untouched, when `path` is
    /// already occupied. The check and the write are one atomic step.
    ///
    /// # Errors
    /// Returns a store error on connectivity or permission failure.
    fn create(
        &self,
        path: &StorePath,
        value: Value,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Create a child of `path` under a store-generated key and return the key.
    ///
    /// Keys sort lexicographically in creation order.
    ///
    /// # Errors
    /// Returns a store error on connectivity or permission failure.
    fn push(
        &self,
        path: &StorePath,
        value: Value,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Merge `fields` into the existing object at `path`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if nothing exists at `path`, or a store
    /// error on connectivity or permission failure.
    fn update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete the node at `path`. Removing an absent node succeeds.
    ///
    /// # Errors
    /// Returns a store error on connectivity or permission failure.
    fn remove(&self, path: &StorePath) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read the current value at `path` once.
    ///
    /// # Errors
    /// Returns a store error on connectivity or permission failure.
    fn read_once(
        &self,
        path: &StorePath,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;
}

impl<S> TreeStore for Arc<S>
where
    S: TreeStore,
{
    async fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError> {
        (**self).subscribe(path).await
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        (**self).write(path, value).await
    }

    async fn create(&self, path: &StorePath, value: Value) -> Result<bool, StoreError> {
        (**self).create(path, value).await
    }

    async fn push(&self, path: &StorePath, value: Value) -> Result<String, StoreError> {
        (**self).push(path, value).await
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError> {
        (**self).update(path, fields).await
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        (**self).remove(path).await
    }

    async fn read_once(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        (**self).read_once(path).await
    }
}

/// Live feed of full snapshots for one path.
///
/// The first [`next`](Self::next) yields the value present at registration;
/// every later call waits for the value to change.
#[derive(Debug)]
pub struct Subscription {
    path: StorePath,
    rx: watch::Receiver<Option<Value>>,
    delivered_initial: bool,
}

impl Subscription {
    /// Wrap a watch receiver whose current value is the registration snapshot.
    #[must_use]
    pub const fn new(path: StorePath, rx: watch::Receiver<Option<Value>>) -> Self {
        Self {
            path,
            rx,
            delivered_initial: false,
        }
    }

    /// Subscribed path.
    #[must_use]
    pub const fn path(&self) -> &StorePath {
        &self.path
    }

    /// Wait for the next snapshot.
    ///
    /// # Errors
    /// Returns [`StoreError::Closed`] once the store side has gone away.
    pub async fn next(&mut self) -> Result<Option<Value>, StoreError> {
        if self.delivered_initial {
            self.rx.changed().await.map_err(|_| StoreError::Closed)?;
        } else {
            self.delivered_initial = true;
        }
        Ok(self.rx.borrow_and_update().clone())
    }
}
