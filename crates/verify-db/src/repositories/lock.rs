//! Per-key transaction-scoped advisory locks

use sqlx::{PgConnection, Postgres, Transaction};
use verify_core::value_objects::Snowflake;
use verify_core::RepoResult;

use super::error::map_db_error;

/// Start a transaction and take the advisory lock for `(table, subject, server)`
///
/// The lock is released when the transaction commits or rolls back, so
/// concurrent replacements for one key run one after another while other keys
/// proceed independently.
pub async fn begin_locked<'a>(
    pool: &'a sqlx::PgPool,
    table: &str,
    subject_id: Snowflake,
    server_id: Snowflake,
) -> RepoResult<Transaction<'a, Postgres>> {
    let mut tx = pool.begin().await.map_err(map_db_error)?;
    lock_key(&mut tx, table, subject_id, server_id).await?;
    Ok(tx)
}

async fn lock_key(
    conn: &mut PgConnection,
    table: &str,
    subject_id: Snowflake,
    server_id: Snowflake,
) -> RepoResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(lock_name(table, subject_id, server_id))
        .execute(conn)
        .await
        .map_err(map_db_error)?;
    Ok(())
}

fn lock_name(table: &str, subject_id: Snowflake, server_id: Snowflake) -> String {
    format!("{table}:{server_id}:{subject_id}")
}
