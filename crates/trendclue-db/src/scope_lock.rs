//! Per-scope run serialization with a Postgres session advisory lock.

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use trendclue_core::Scope;

use crate::DbError;

/// Held for the duration of one run. The lock lives on a dedicated pooled
/// connection; that connection is closed rather than returned to the pool
/// when the guard is dropped, so the session (and its lock) always ends.
pub struct ScopeLock {
    conn: PoolConnection<Postgres>,
    key: String,
}

impl ScopeLock {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release the lock explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the unlock statement fails. The session
    /// is closed regardless, which also releases the lock.
    pub async fn release(mut self) -> Result<(), DbError> {
        sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock(hashtext($1))")
            .bind(&self.key)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(())
    }
}

/// The advisory-lock key text for a scope.
#[must_use]
pub fn scope_lock_key(scope: &Scope) -> String {
    format!("trendclue:{}/{}", scope.country, scope.category)
}

/// Try to take the scope's run lock without waiting.
///
/// Returns `None` when another session already holds it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if no connection can be acquired or the lock
/// query fails.
pub async fn try_lock_scope(pool: &PgPool, scope: &Scope) -> Result<Option<ScopeLock>, DbError> {
    let mut conn = pool.acquire().await?;
    conn.close_on_drop();

    let key = scope_lock_key(scope);
    let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_lock(hashtext($1))")
        .bind(&key)
        .fetch_one(&mut *conn)
        .await?;

    Ok(acquired.then_some(ScopeLock { conn, key }))
}
