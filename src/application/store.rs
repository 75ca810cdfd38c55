//! Store adapter boundary: namespaced scan/get/put over JSON records.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::entities::{EpisodeRecord, GameRecord};

/// Namespace holding episode records.
pub const EPISODES: &str = "episodes";
/// Namespace holding game records.
pub const GAMES: &str = "games";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("record `{namespace}/{id}` failed to decode: {reason}")]
    Decode {
        namespace: &'static str,
        id: String,
        reason: String,
    },
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Minimal key-value contract the directory core consumes.
///
/// Implementations provide a full scan over one namespace and point get/put
/// by id within it. No transactional semantics are assumed across calls, and
/// scan order carries no guarantee; callers apply their own sort keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn scan(&self, namespace: &str) -> Result<Vec<Value>, StoreError>;

    async fn get(&self, namespace: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn put(&self, namespace: &str, id: &str, record: Value) -> Result<(), StoreError>;
}

/// Typed facade over the raw store.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn KeyValueStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Every episode record, in whatever order the backend scans them.
    pub async fn episodes(&self) -> Result<Vec<EpisodeRecord>, StoreError> {
        let raw = self.store.scan(EPISODES).await?;
        raw.into_iter()
            .map(|value| decode(EPISODES, value))
            .collect()
    }

    /// Every game record, in whatever order the backend scans them.
    pub async fn games(&self) -> Result<Vec<GameRecord>, StoreError> {
        let raw = self.store.scan(GAMES).await?;
        raw.into_iter().map(|value| decode(GAMES, value)).collect()
    }

    pub async fn game(&self, id: &str) -> Result<Option<GameRecord>, StoreError> {
        match self.store.get(GAMES, id).await? {
            Some(value) => Ok(Some(decode(GAMES, value)?)),
            None => Ok(None),
        }
    }

    /// Concurrent batch point-get, deduplicated.
    ///
    /// Ids with no matching record are absent from the result; resolving a
    /// dangling reference is the caller's concern.
    pub async fn games_by_id(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, GameRecord>, StoreError> {
        let mut unique: Vec<&String> = Vec::new();
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        let fetches = unique.iter().map(|id| self.game(id));
        let results = future::try_join_all(fetches).await?;

        Ok(results
            .into_iter()
            .flatten()
            .map(|game| (game.id.clone(), game))
            .collect())
    }

    pub async fn put_episode(&self, episode: &EpisodeRecord) -> Result<(), StoreError> {
        self.store
            .put(EPISODES, &episode.id, encode(EPISODES, &episode.id, episode)?)
            .await
    }

    pub async fn put_game(&self, game: &GameRecord) -> Result<(), StoreError> {
        self.store
            .put(GAMES, &game.id, encode(GAMES, &game.id, game)?)
            .await
    }
}

fn decode<T: DeserializeOwned>(namespace: &'static str, value: Value) -> Result<T, StoreError> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string();
    serde_json::from_value(value).map_err(|err| StoreError::Decode {
        namespace,
        id,
        reason: err.to_string(),
    })
}

fn encode<T: Serialize>(namespace: &'static str, id: &str, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|err| StoreError::Decode {
        namespace,
        id: id.to_string(),
        reason: err.to_string(),
    })
}
