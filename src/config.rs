use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub private_key_path: String,
    pub public_key_path: String,
    pub lifetime_secs: i64,
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub token: TokenConfig,
    pub allowed_origins: Vec<String>,
    pub service_api_key: String,
    pub admin_email: String,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/accounts.db".into());
        let token = TokenConfig {
            private_key_path: std::env::var("JWT_PRIVATE_KEY_PATH")
                .context("JWT_PRIVATE_KEY_PATH must be set")?,
            public_key_path: std::env::var("JWT_PUBLIC_KEY_PATH")
                .context("JWT_PUBLIC_KEY_PATH must be set")?,
            lifetime_secs: std::env::var("TOKEN_LIFETIME_SECS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60 * 60 * 24),
        };
        let service_api_key =
            std::env::var("SERVICE_API_KEY").context("SERVICE_API_KEY must be set")?;
        anyhow::ensure!(!service_api_key.is_empty(), "SERVICE_API_KEY must not be empty");

        Ok(Self {
            database_url,
            token,
            allowed_origins: parse_origins(&std::env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            service_api_key,
            admin_email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@admin.com".into()),
            cookie_secure: parse_flag(std::env::var("COOKIE_SECURE").ok().as_deref(), true),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
