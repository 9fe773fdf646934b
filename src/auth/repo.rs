use anyhow::Context;
use sqlx::SqlitePool;

use crate::auth::repo_types::{Account, AccountUsage};
use crate::db::is_unique_violation;

impl Account {
    /// Find an account by its exact email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT email, password_hash, salt, usage_count, created_at
            FROM accounts
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find account by email")?;
        Ok(account)
    }

    /// Insert a new account. Returns `None` when the email is already taken.
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        password_hash: &str,
        salt: &str,
        created_at: i64,
    ) -> anyhow::Result<Option<Account>> {
        let inserted = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, password_hash, salt, usage_count, created_at)
            VALUES (?1, ?2, ?3, 0, ?4)
            RETURNING email, password_hash, salt, usage_count, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(salt)
        .bind(created_at)
        .fetch_one(db)
        .await;

        match inserted {
            Ok(account) => Ok(Some(account)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e).context("insert account"),
        }
    }

    /// Add one to the usage counter. Returns the new value, or `None` for an unknown email.
    pub async fn increment_usage(db: &SqlitePool, email: &str) -> anyhow::Result<Option<i64>> {
        let usage = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE accounts
            SET usage_count = usage_count + 1
            WHERE email = ?1
            RETURNING usage_count
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("increment usage")?;
        Ok(usage)
    }

    pub async fn usage_of(db: &SqlitePool, email: &str) -> anyhow::Result<Option<AccountUsage>> {
        let row = sqlx::query_as::<_, AccountUsage>(
            r#"SELECT email, usage_count FROM accounts WHERE email = ?1"#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("usage of account")?;
        Ok(row)
    }

    pub async fn list_usage(db: &SqlitePool) -> anyhow::Result<Vec<AccountUsage>> {
        let rows = sqlx::query_as::<_, AccountUsage>(
            r#"SELECT email, usage_count FROM accounts ORDER BY email ASC"#,
        )
        .fetch_all(db)
        .await
        .context("list account usage")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn duplicate_email_is_reported_not_raised() {
        let db = memory_pool().await;
        let first = Account::create(&db, "alice@example.com", "aa", "bb", 1).await.unwrap();
        assert!(first.is_some());
        let second = Account::create(&db, "alice@example.com", "cc", "dd", 2).await.unwrap();
        assert!(second.is_none());

        let stored = Account::find_by_email(&db, "alice@example.com").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "aa");
        assert_eq!(stored.usage_count, 0);
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let db = memory_pool().await;
        Account::create(&db, "Alice@example.com", "aa", "bb", 1).await.unwrap();
        assert!(Account::find_by_email(&db, "alice@example.com").await.unwrap().is_none());
        assert!(Account::create(&db, "alice@example.com", "aa", "bb", 1)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn usage_counts_up_per_account() {
        let db = memory_pool().await;
        Account::create(&db, "b@example.com", "h", "s", 1).await.unwrap();
        Account::create(&db, "a@example.com", "h", "s", 1).await.unwrap();

        assert_eq!(Account::increment_usage(&db, "b@example.com").await.unwrap(), Some(1));
        assert_eq!(Account::increment_usage(&db, "b@example.com").await.unwrap(), Some(2));
        assert_eq!(Account::increment_usage(&db, "nobody@example.com").await.unwrap(), None);

        let mine = Account::usage_of(&db, "b@example.com").await.unwrap().unwrap();
        assert_eq!(mine.usage, 2);

        let all = Account::list_usage(&db).await.unwrap();
        let emails: Vec<_> = all.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["a@example.com", "b@example.com"]);
    }
}
