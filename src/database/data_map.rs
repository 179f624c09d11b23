//! Named key/value stores of JSON documents, all sharing the `data_maps` table.
use crate::database::DbPool;
use crate::dispatch::descriptor::is_valid_id;
use crate::error::DataMapError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::types::Json;
use std::marker::PhantomData;
use tracing::instrument;

/// A typed view over the rows of `data_maps` whose `name` matches this map.
pub struct DataMap<T> {
    pool: DbPool,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for DataMap<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> DataMap<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Map names follow the command id grammar.
    pub fn new(pool: DbPool, name: impl Into<String>) -> Result<Self, DataMapError> {
        let name = name.into();
        if !is_valid_id(&name) {
            return Err(DataMapError::InvalidName(name));
        }
        Ok(Self {
            pool,
            name,
            _marker: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "debug", skip(self), fields(map = %self.name))]
    pub async fn get(&self, key: &str) -> Result<Option<T>, DataMapError> {
        let row: Option<(Json<serde_json::Value>,)> =
            sqlx::query_as("SELECT value FROM data_maps WHERE name = $1 AND key = $2")
                .bind(&self.name)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((Json(value),)) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Inserts or replaces the document stored under `key`.
    #[instrument(level = "debug", skip(self, value), fields(map = %self.name))]
    pub async fn update(&self, key: &str, value: &T) -> Result<(), DataMapError> {
        let value = serde_json::to_value(value)?;
        sqlx::query(
            "INSERT INTO data_maps (name, key, value) VALUES ($1, $2, $3)
             ON CONFLICT (name, key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(&self.name)
        .bind(key)
        .bind(Json(value))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns whether a document was removed.
    #[instrument(level = "debug", skip(self), fields(map = %self.name))]
    pub async fn remove(&self, key: &str) -> Result<bool, DataMapError> {
        let result = sqlx::query("DELETE FROM data_maps WHERE name = $1 AND key = $2")
            .bind(&self.name)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
