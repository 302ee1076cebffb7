use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_pool, orm_from_pool},
    storage::{ImageStore, LocalImageStore},
    token::JwtKeys,
};

/// Shared handles. `pool` and `orm` sit on the same connections.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig, images: Arc<dyn ImageStore>) -> Self {
        let orm = orm_from_pool(&pool);
        let jwt = JwtKeys::from_config(&config.jwt);
        Self {
            pool,
            orm,
            config: Arc::new(config),
            jwt,
            images,
        }
    }

    /// State backed by the local media directory from the config.
    pub fn with_local_media(pool: DbPool, config: AppConfig) -> Self {
        let images = Arc::new(LocalImageStore::new(
            &config.media_root,
            &config.public_base_url,
        )) as Arc<dyn ImageStore>;
        Self::new(pool, config, images)
    }

    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database_url).await?;
        Ok(Self::with_local_media(pool, config))
    }
}
