//! Shared doubles for integration testing.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

use container_pinger::discovery::{Discover, DiscoveryError, Target};
use container_pinger::probe::{ProbeError, ProbeResult, Prober};
use container_pinger::store::{
    DeleteStatus, ListStatuses, RemoteStatusRecord, StoreError, StoreResult, UpsertStatus,
};

pub const API_KEY: &str = "test-key";

// ============================================================================
// Discovery
// ============================================================================

/// Returns a fixed target list, optionally failing or stalling.
#[derive(Default)]
pub struct StaticDiscovery {
    pub targets: Mutex<Vec<Target>>,
    pub fail: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
    pub calls: AtomicUsize,
}

impl StaticDiscovery {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets: Mutex::new(targets),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let discovery = Self::default();
        discovery.fail.store(true, Ordering::SeqCst);
        discovery
    }
}

#[async_trait]
impl Discover for StaticDiscovery {
    async fn list(&self) -> Result<Vec<Target>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(DiscoveryError::Request("runtime offline".into()));
        }
        Ok(self.targets.lock().unwrap().clone())
    }
}

// ============================================================================
// Prober
// ============================================================================

/// Latency per address: `Some(us)` reachable, `None` unreachable.
/// Unknown addresses fail to initialize.
#[derive(Default)]
pub struct ScriptedProber {
    pub latencies: HashMap<String, Option<i64>>,
    pub probed: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn new(entries: &[(&str, Option<i64>)]) -> Self {
        Self {
            latencies: entries
                .iter()
                .map(|(address, latency)| (address.to_string(), *latency))
                .collect(),
            probed: Mutex::default(),
        }
    }

    pub fn probed(&self) -> Vec<String> {
        let mut probed = self.probed.lock().unwrap().clone();
        probed.sort();
        probed
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &Target) -> Result<ProbeResult, ProbeError> {
        self.probed.lock().unwrap().push(target.address.clone());
        match self.latencies.get(&target.address) {
            Some(Some(latency)) => Ok(ProbeResult::reachable(target.clone(), *latency)),
            Some(None) => Ok(ProbeResult::unreachable(target.clone())),
            None => Err(ProbeError::Init {
                address: target.address.clone(),
                reason: "unknown host".into(),
            }),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Update { address: String, latency_us: i64, name: String, state: String },
    Create { address: String, latency_us: i64, name: String, state: String },
    List,
    Delete(String),
}

/// Behaves like the remote store: update of a missing record is not found.
#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<BTreeMap<String, RemoteStatusRecord>>,
    pub calls: Mutex<Vec<StoreCall>>,
    pub failing_updates: Mutex<HashSet<String>>,
    pub failing_deletes: Mutex<HashSet<String>>,
    pub list_fails: AtomicBool,
    next_id: AtomicUsize,
}

impl MemoryStore {
    pub fn with_addresses(addresses: &[&str]) -> Self {
        let store = Self::default();
        for address in addresses {
            store.insert(address, 100, "old", "running");
        }
        store
    }

    pub fn insert(&self, address: &str, latency_us: i64, name: &str, state: &str) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        // Records without an address must not collide with one another.
        let key = if address.is_empty() {
            format!("#{}", id)
        } else {
            address.to_string()
        };
        self.records.lock().unwrap().insert(
            key,
            RemoteStatusRecord {
                id,
                name: name.to_string(),
                address: address.to_string(),
                state: state.to_string(),
                latency_us,
                last_successful_ping: Some(chrono::Utc::now()),
                created_at: Some(chrono::Utc::now()),
                updated_at: Some(chrono::Utc::now()),
            },
        );
    }

    pub fn addresses(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .values()
            .map(|r| r.address.clone())
            .collect()
    }

    pub fn record(&self, address: &str) -> Option<RemoteStatusRecord> {
        self.records.lock().unwrap().get(address).cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, StoreCall::List))
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        let mut deletes: Vec<String> = self
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Delete(address) => Some(address),
                _ => None,
            })
            .collect();
        deletes.sort();
        deletes
    }
}

#[async_trait]
impl UpsertStatus for MemoryStore {
    async fn update(&self, address: &str, latency_us: i64, name: &str, state: &str) -> StoreResult<()> {
        self.calls.lock().unwrap().push(StoreCall::Update {
            address: address.into(),
            latency_us,
            name: name.into(),
            state: state.into(),
        });
        if self.failing_updates.lock().unwrap().contains(address) {
            return Err(StoreError::Status { status: 500, body: "update failed".into() });
        }

        let mut records = self.records.lock().unwrap();
        match records.get_mut(address) {
            Some(record) => {
                record.latency_us = latency_us;
                record.name = name.to_string();
                record.state = state.to_string();
                Ok(())
            }
            None => Err(StoreError::NotFound(address.to_string())),
        }
    }

    async fn create(&self, address: &str, latency_us: i64, name: &str, state: &str) -> StoreResult<()> {
        self.calls.lock().unwrap().push(StoreCall::Create {
            address: address.into(),
            latency_us,
            name: name.into(),
            state: state.into(),
        });
        if self.records.lock().unwrap().contains_key(address) {
            return Err(StoreError::Status { status: 409, body: "duplicate".into() });
        }
        self.insert(address, latency_us, name, state);
        Ok(())
    }
}

#[async_trait]
impl ListStatuses for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<RemoteStatusRecord>> {
        self.calls.lock().unwrap().push(StoreCall::List);
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(StoreError::Status { status: 503, body: "unavailable".into() });
        }
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }
}

#[async_trait]
impl DeleteStatus for MemoryStore {
    async fn delete(&self, address: &str) -> StoreResult<()> {
        self.calls.lock().unwrap().push(StoreCall::Delete(address.to_string()));
        if self.failing_deletes.lock().unwrap().contains(address) {
            return Err(StoreError::Status { status: 500, body: "delete failed".into() });
        }
        self.records.lock().unwrap().remove(address);
        Ok(())
    }
}

// ============================================================================
// HTTP status store
// ============================================================================

/// Requests seen by [`start_status_server`], as "METHOD /path".
pub type RequestLog = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Default)]
struct ServerState {
    records: Arc<Mutex<BTreeMap<String, Value>>>,
    log: RequestLog,
    next_id: Arc<AtomicUsize>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

async fn list_statuses(State(state): State<ServerState>, headers: HeaderMap) -> Result<Json<Vec<Value>>, StatusCode> {
    state.log.lock().unwrap().push("GET /container_status".into());
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(state.records.lock().unwrap().values().cloned().collect()))
}

async fn create_status(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state.log.lock().unwrap().push("POST /container_status".into());
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let Some(ip) = body["ip_address"].as_str().map(str::to_string) else {
        return StatusCode::BAD_REQUEST;
    };

    let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let now = chrono::Utc::now().to_rfc3339();
    let record = serde_json::json!({
        "id": id,
        "name": body["name"],
        "ip_address": ip,
        "status": body["status"],
        "ping_time": body["ping_time"],
        "last_successful_ping": body["last_successful_ping"],
        "created_at": now,
        "updated_at": now,
    });
    state.records.lock().unwrap().insert(ip, record);
    StatusCode::CREATED
}

async fn update_status(
    State(state): State<ServerState>,
    Path(ip): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state.log.lock().unwrap().push(format!("PATCH /container_status/{}", ip));
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }

    let mut records = state.records.lock().unwrap();
    let Some(record) = records.get_mut(&ip) else {
        return StatusCode::NOT_FOUND;
    };
    for field in ["ping_time", "last_successful_ping", "name", "status"] {
        if let Some(value) = body.get(field) {
            record[field] = value.clone();
        }
    }
    record["updated_at"] = Value::String(chrono::Utc::now().to_rfc3339());
    StatusCode::NO_CONTENT
}

async fn delete_status(State(state): State<ServerState>, Path(ip): Path<String>, headers: HeaderMap) -> StatusCode {
    state.log.lock().unwrap().push(format!("DELETE /container_status/{}", ip));
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    match state.records.lock().unwrap().remove(&ip) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// A running in-process status store.
pub struct StatusServer {
    pub addr: SocketAddr,
    pub log: RequestLog,
    records: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl StatusServer {
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<Value> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    /// Seed a record with the given address.
    pub fn seed(&self, ip: &str, name: &str) {
        let now = chrono::Utc::now().to_rfc3339();
        let id = self.records.lock().unwrap().len() + 1000;
        self.records.lock().unwrap().insert(
            ip.to_string(),
            serde_json::json!({
                "id": id,
                "name": name,
                "ip_address": ip,
                "status": "running",
                "ping_time": 100,
                "last_successful_ping": now,
                "created_at": now,
                "updated_at": now,
            }),
        );
    }
}

/// Start a status store speaking the container_status REST API on an
/// ephemeral port.
pub async fn start_status_server() -> StatusServer {
    let state = ServerState::default();
    let records = state.records.clone();
    let log = state.log.clone();

    let app = Router::new()
        .route("/api/v1/container_status", get(list_statuses).post(create_status))
        .route(
            "/api/v1/container_status/{ip}",
            patch(update_status).delete(delete_status),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    StatusServer { addr, log, records }
}
