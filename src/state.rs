use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::{AppConfig, StorageBackend};
use crate::memory::MemoryStore;
use crate::movies::repo::{MovieRepo, PgMovieRepo};
use crate::reviews::repo::{PgReviewRepo, ReviewRepo};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub movies: Arc<dyn MovieRepo>,
    pub reviews: Arc<dyn ReviewRepo>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        match config.storage.clone() {
            StorageBackend::Postgres {
                url,
                max_connections,
            } => {
                let db = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(&url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;

                Ok(Self {
                    users: Arc::new(PgUserRepo::new(db.clone())),
                    movies: Arc::new(PgMovieRepo::new(db.clone())),
                    reviews: Arc::new(PgReviewRepo::new(db)),
                    config,
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage; data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    /// State backed by a fresh `MemoryStore` for all three repositories.
    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let store = MemoryStore::new();
        Self {
            config,
            users: Arc::new(store.clone()),
            movies: Arc::new(store.clone()),
            reviews: Arc::new(store),
        }
    }
}
