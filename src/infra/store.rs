//! Key-value store backends: in-memory for tests and tooling, JSON files
//! on disk for deployments.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::info;

use crate::application::store::{KeyValueStore, StoreError};

use super::error::InfraError;

type NamespaceMap = HashMap<String, BTreeMap<String, Value>>;

/// Volatile store; contents live and die with the process.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<NamespaceMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn scan(&self, namespace: &str) -> Result<Vec<Value>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .get(namespace)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, namespace: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .get(namespace)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn put(&self, namespace: &str, id: &str, record: Value) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        data.entry(namespace.to_string())
            .or_default()
            .insert(id.to_string(), record);
        Ok(())
    }
}

/// Durable store: one JSON document per namespace under `data_dir`, loaded
/// at open and written through on every put.
///
/// Writes land in a temporary file first and rename into place, so a crash
/// mid-write leaves the previous document intact.
pub struct JsonFileStore {
    data_dir: PathBuf,
    data: RwLock<NamespaceMap>,
}

impl JsonFileStore {
    /// Open the store at `data_dir`, creating the directory if needed and
    /// loading every `<namespace>.json` document found there.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, InfraError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await?;

        let mut data = NamespaceMap::new();
        let mut entries = fs::read_dir(&data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(namespace) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let contents = fs::read(&path).await?;
            let records: BTreeMap<String, Value> =
                serde_json::from_slice(&contents).map_err(|err| {
                    InfraError::storage(format!(
                        "namespace document `{}` failed to parse: {err}",
                        path.display()
                    ))
                })?;
            data.insert(namespace.to_string(), records);
        }

        info!(data_dir = %data_dir.display(), namespaces = data.len(), "opened json file store");
        Ok(Self {
            data_dir,
            data: RwLock::new(data),
        })
    }

    async fn persist(&self, namespace: &str, records: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(records).map_err(StoreError::backend)?;

        let path = self.data_dir.join(format!("{namespace}.json"));
        let staged = self.data_dir.join(format!("{namespace}.json.tmp"));
        fs::write(&staged, encoded).await.map_err(StoreError::backend)?;
        fs::rename(&staged, &path).await.map_err(StoreError::backend)
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn scan(&self, namespace: &str) -> Result<Vec<Value>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .get(namespace)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, namespace: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .get(namespace)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn put(&self, namespace: &str, id: &str, record: Value) -> Result<(), StoreError> {
        // The write lock spans the file write, serializing puts per store.
        let mut data = self.data.write().await;
        let records = data.entry(namespace.to_string()).or_default();
        records.insert(id.to_string(), record);
        self.persist(namespace, records).await
    }
}
