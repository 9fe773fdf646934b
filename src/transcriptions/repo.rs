use anyhow::Context;
use sqlx::SqlitePool;

use crate::db::is_unique_violation;
use crate::transcriptions::repo_types::{AddOutcome, Transcription};

// Every query except the service insert filters on owner_email, so a caller can
// only ever see or touch its own rows.
impl Transcription {
    /// Charge one usage unit to the owner and insert the job in a single transaction.
    ///
    /// The charge runs first so the transaction takes the write lock up front and
    /// waits on the busy timeout instead of failing when another writer commits.
    /// A duplicate job id drops the transaction, which rolls the charge back.
    pub async fn add_and_charge(
        db: &SqlitePool,
        job_id: &str,
        owner_email: &str,
        filename: &str,
        created_at: i64,
    ) -> anyhow::Result<AddOutcome> {
        let mut tx = db.begin().await.context("begin tx")?;

        let charged = sqlx::query_scalar::<_, i64>(
            r#"UPDATE accounts SET usage_count = usage_count + 1 WHERE email = ?1 RETURNING usage_count"#,
        )
        .bind(owner_email)
        .fetch_optional(&mut *tx)
        .await
        .context("charge usage")?;
        if charged.is_none() {
            return Ok(AddOutcome::UnknownOwner);
        }

        let inserted = sqlx::query_as::<_, Transcription>(
            r#"
            INSERT INTO transcriptions (job_id, owner_email, created_at, filename)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING job_id, owner_email, created_at, filename
            "#,
        )
        .bind(job_id)
        .bind(owner_email)
        .bind(created_at)
        .bind(filename)
        .fetch_one(&mut *tx)
        .await;
        let record = match inserted {
            Ok(record) => record,
            Err(e) if is_unique_violation(&e) => return Ok(AddOutcome::DuplicateJob),
            Err(e) => return Err(e).context("insert transcription"),
        };

        tx.commit().await.context("commit tx")?;
        Ok(AddOutcome::Added(record))
    }

    /// Newest first; same-second inserts fall back to insertion order.
    pub async fn list_by_owner(
        db: &SqlitePool,
        owner_email: &str,
    ) -> anyhow::Result<Vec<Transcription>> {
        let rows = sqlx::query_as::<_, Transcription>(
            r#"
            SELECT job_id, owner_email, created_at, filename
              FROM transcriptions
             WHERE owner_email = ?1
             ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner_email)
        .fetch_all(db)
        .await
        .context("list transcriptions by owner")?;
        Ok(rows)
    }

    /// Returns false when no row with this id belongs to `owner_email`.
    pub async fn rename_owned(
        db: &SqlitePool,
        job_id: &str,
        owner_email: &str,
        filename: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transcriptions
               SET filename = ?1
             WHERE job_id = ?2 AND owner_email = ?3
            "#,
        )
        .bind(filename)
        .bind(job_id)
        .bind(owner_email)
        .execute(db)
        .await
        .context("rename transcription")?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns false when no row with this id belongs to `owner_email`.
    pub async fn delete_owned(
        db: &SqlitePool,
        job_id: &str,
        owner_email: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"DELETE FROM transcriptions WHERE job_id = ?1 AND owner_email = ?2"#,
        )
        .bind(job_id)
        .bind(owner_email)
        .execute(db)
        .await
        .context("delete transcription")?;
        Ok(result.rows_affected() > 0)
    }
}
