//! The host state handed to every command as `ctx.state`.
//! An `Arc<AppState>` is also stored in Serenity's global TypeMap so event handlers can reach it.

use crate::config::Config;
use crate::database::DbPool;
use serenity::gateway::ShardManager;
use serenity::prelude::TypeMapKey;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    /// `None` when no database is configured; data maps are then unavailable.
    pub db: Option<DbPool>,
    /// Gateway shards, used for latency reporting.
    pub shard_manager: Option<Arc<ShardManager>>,
}

impl AppState {
    pub fn new(config: Config, db: Option<DbPool>, shard_manager: Option<Arc<ShardManager>>) -> Self {
        Self {
            config,
            db,
            shard_manager,
        }
    }

    pub async fn from_ctx(ctx: &serenity::prelude::Context) -> Option<Arc<Self>> {
        ctx.data.read().await.get::<AppState>().cloned()
    }
}

impl TypeMapKey for AppState {
    type Value = Arc<AppState>;
}
