use std::sync::Arc;

use anyhow::Context;
use sqlx::SqlitePool;

use crate::auth::{jwt::TokenKeys, password::CredentialHasher};
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub keys: Arc<TokenKeys>,
    pub hasher: CredentialHasher,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let private_pem = std::fs::read(&config.token.private_key_path)
            .with_context(|| format!("read {}", config.token.private_key_path))?;
        let public_pem = std::fs::read(&config.token.public_key_path)
            .with_context(|| format!("read {}", config.token.public_key_path))?;
        let keys = TokenKeys::from_rsa_pem(&private_pem, &public_pem, config.token.lifetime_secs)?;

        let db = db::connect(&config.database_url).await?;
        let hasher = CredentialHasher::v1()?;

        Ok(Self::from_parts(db, Arc::new(config), Arc::new(keys), hasher))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        keys: Arc<TokenKeys>,
        hasher: CredentialHasher,
    ) -> Self {
        Self {
            db,
            config,
            keys,
            hasher,
        }
    }

    #[cfg(test)]
    pub async fn fake() -> Self {
        use crate::config::TokenConfig;

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            token: TokenConfig {
                private_key_path: "auth/testdata/private.pem".into(),
                public_key_path: "auth/testdata/public.pem".into(),
                lifetime_secs: 3600,
            },
            allowed_origins: vec!["http://localhost:3000".into()],
            service_api_key: "test-service-key".into(),
            admin_email: "admin@admin.com".into(),
            cookie_secure: false,
        });
        let keys = Arc::new(crate::auth::jwt::tests::make_keys(config.token.lifetime_secs));
        let hasher = CredentialHasher::new(64, 1, 1).expect("cheap test params");

        Self::from_parts(db::memory_pool().await, config, keys, hasher)
    }
}
