//! Remote status store subsystem.
//!
//! # Data Flow
//! ```text
//! Reachable probe result
//!     → upsert(): UpsertStatus::update
//!         → NotFound? → UpsertStatus::create
//!
//! Garbage collection
//!     → ListStatuses::list
//!     → DeleteStatus::delete for stale addresses
//! ```
//!
//! # Design Decisions
//! - One narrow trait per capability so doubles implement only what they need
//! - The store is external and not idempotent; upsert is built on top here
//! - No locks or transactions; safety rests on one active cycle at a time

pub mod http;
pub mod types;

pub use http::HttpStatusStore;
pub use types::{RemoteStatusRecord, StoreError, StoreResult, STATUS_SCHEMA_VERSION};

use std::sync::Arc;

use async_trait::async_trait;

/// Update-or-create capability.
#[async_trait]
pub trait UpsertStatus: Send + Sync {
    /// Update an existing record. Must return [`StoreError::NotFound`]
    /// when no record exists for `address`.
    async fn update(&self, address: &str, latency_us: i64, name: &str, state: &str) -> StoreResult<()>;

    /// Create a new record.
    async fn create(&self, address: &str, latency_us: i64, name: &str, state: &str) -> StoreResult<()>;
}

/// List capability.
#[async_trait]
pub trait ListStatuses: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<RemoteStatusRecord>>;
}

/// Delete capability.
#[async_trait]
pub trait DeleteStatus: Send + Sync {
    async fn delete(&self, address: &str) -> StoreResult<()>;
}

/// A store offering every capability.
pub trait StatusStore: UpsertStatus + ListStatuses + DeleteStatus {}

impl<T: UpsertStatus + ListStatuses + DeleteStatus> StatusStore for T {}

/// Per-capability handles used by the reconciler.
#[derive(Clone)]
pub struct StoreHandles {
    pub upsert: Arc<dyn UpsertStatus>,
    pub list: Arc<dyn ListStatuses>,
    pub delete: Arc<dyn DeleteStatus>,
}

impl StoreHandles {
    /// Use one store for every capability.
    pub fn shared<S: StatusStore + 'static>(store: Arc<S>) -> Self {
        Self {
            upsert: store.clone(),
            list: store.clone(),
            delete: store,
        }
    }
}

/// Which branch an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Updated,
    Created,
}

impl UpsertAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertAction::Updated => "updated",
            UpsertAction::Created => "created",
        }
    }
}

/// Update the record for `address`, creating it if the store has none.
///
/// Only a not-found answer falls through to create; any other update
/// failure is returned as is.
pub async fn upsert(
    store: &dyn UpsertStatus,
    address: &str,
    latency_us: i64,
    name: &str,
    state: &str,
) -> StoreResult<UpsertAction> {
    match store.update(address, latency_us, name, state).await {
        Ok(()) => Ok(UpsertAction::Updated),
        Err(e) if e.is_not_found() => {
            tracing::debug!(address, "No status record yet, creating");
            store.create(address, latency_us, name, state).await?;
            Ok(UpsertAction::Created)
        }
        Err(e) => Err(e),
    }
}
