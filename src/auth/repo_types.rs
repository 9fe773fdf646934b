use serde::Serialize;
use sqlx::FromRow;

/// Account record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub email: String,         // primary key, case-sensitive
    pub password_hash: String, // hex of the derived digest
    pub salt: String,          // hex, fixed at creation
    pub usage_count: i64,
    pub created_at: i64,
}

/// Per-account usage as reported by `/usage` and `/myusage`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AccountUsage {
    pub email: String,
    #[sqlx(rename = "usage_count")]
    pub usage: i64,
}
