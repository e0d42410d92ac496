use radar_core::RadarError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::str::FromStr;
use tracing::warn;

/// Blob keys used by the agent
pub const META_KEY: &str = "meta";
pub const SNAPSHOT_KEY: &str = "snapshot";
pub const STATE_KEY: &str = "state";

/// Named-blob store over SQLite.
///
/// One key-value table, whole-value upsert per save. The upsert runs as a
/// single statement, so a crash mid-write leaves either the old or the new
/// blob, never a torn one.
pub struct StateStore {
    pool: SqlitePool,
}

impl StateStore {
    /// Open (creating the file if missing) and initialize the store.
    pub async fn connect(database_url: &str) -> Result<Self, RadarError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| RadarError::Storage(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| RadarError::Storage(e.to_string()))?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), RadarError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS radar_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RadarError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Save a blob under a key, replacing any previous value whole.
    pub async fn save_blob(&self, key: &str, value: &str) -> Result<(), RadarError> {
        sqlx::query(
            "INSERT INTO radar_state (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RadarError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load a blob by key.
    pub async fn load_blob(&self, key: &str) -> Result<Option<String>, RadarError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM radar_state WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RadarError::Storage(e.to_string()))?;

        Ok(row.map(|(value,)| value))
    }

    /// Save a typed record as JSON.
    pub async fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), RadarError> {
        let json = serde_json::to_string(value)
            .map_err(|e| RadarError::Serialization(e.to_string()))?;
        self.save_blob(key, &json).await
    }

    /// Load a typed record. A missing blob is `None`; a corrupt blob is
    /// logged and also treated as `None`, so the caller restarts from its
    /// default state instead of failing every future run.
    pub async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RadarError> {
        let Some(json) = self.load_blob(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("corrupt blob under key '{}', resetting to default: {}", key, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::{MarketState, MetaState, StateRecord};

    async fn memory_store() -> StateStore {
        StateStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = memory_store().await;
        assert_eq!(store.load_blob("meta").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let store = memory_store().await;

        let record = StateRecord {
            state: MarketState::DeepFear,
        };
        store.save_json(STATE_KEY, &record).await.unwrap();

        let loaded: StateRecord = store.load_json(STATE_KEY).await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_second_save_replaces_whole_value() {
        let store = memory_store().await;

        store.save_blob("state", "{\"state\":\"Neutral\"}").await.unwrap();
        store.save_blob("state", "{\"state\":\"Euphoria\"}").await.unwrap();

        let loaded = store.load_blob("state").await.unwrap().unwrap();
        assert_eq!(loaded, "{\"state\":\"Euphoria\"}");
    }

    #[tokio::test]
    async fn test_corrupt_blob_resets_to_none() {
        let store = memory_store().await;

        store.save_blob(META_KEY, "{not json").await.unwrap();
        let loaded: Option<MetaState> = store.load_json(META_KEY).await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_meta_state_round_trip_is_lossless() {
        let store = memory_store().await;

        let mut meta = MetaState::default();
        meta.capitulation_recent = true;
        store.save_json(META_KEY, &meta).await.unwrap();

        let loaded: MetaState = store.load_json(META_KEY).await.unwrap().unwrap();
        assert_eq!(loaded, meta);
    }
}
