//! Shared `PostgreSQL` plumbing for Diesel-backed adapters.
//!
//! Diesel connections are synchronous, so every adapter funnels its work
//! through [`run_with_connection`], which checks a connection out of the
//! r2d2 pool on Tokio's blocking thread pool.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// `PostgreSQL` connection pool type shared by all adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Failures that happen before an adapter's query runs.
#[derive(Debug, Error)]
pub enum PgAccessError {
    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Builds a connection pool for the given database URL.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connections cannot be opened.
pub fn build_pool(database_url: &str, max_size: u32) -> Result<PgPool, PoolError> {
    Pool::builder()
        .max_size(max_size)
        .build(ConnectionManager::<PgConnection>::new(database_url))
}

/// Runs `f` with a pooled connection on the blocking thread pool.
///
/// `wrap` converts pool and join failures into the caller's error type.
pub(crate) async fn run_with_connection<F, T, E>(
    pool: &PgPool,
    wrap: fn(PgAccessError) -> E,
    f: F,
) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(|err| wrap(PgAccessError::from(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| wrap(PgAccessError::from(err)))?
}
