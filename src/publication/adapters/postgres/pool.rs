//! Connection pool and blocking-call plumbing shared by the adapters.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

use crate::publication::ports::{LookupError, OutboxError, TaskRepositoryError};

/// `PostgreSQL` connection pool type used by publication adapters.
pub type PublicationPgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns [`PoolError`] when no initial connection can be established.
pub fn build_pool(database_url: &str) -> Result<PublicationPgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().build(manager)
}

/// Failure acquiring a connection or joining the blocking task.
#[derive(Debug, Error)]
pub enum BlockingCallError {
    /// No connection could be checked out.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<BlockingCallError> for TaskRepositoryError {
    fn from(err: BlockingCallError) -> Self {
        Self::persistence(err)
    }
}

impl From<BlockingCallError> for LookupError {
    fn from(err: BlockingCallError) -> Self {
        Self::persistence(err)
    }
}

impl From<BlockingCallError> for OutboxError {
    fn from(err: BlockingCallError) -> Self {
        Self::persistence(err)
    }
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub(super) async fn run_blocking<F, T, E>(pool: &PublicationPgPool, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<BlockingCallError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool
            .get()
            .map_err(|err| E::from(BlockingCallError::Pool(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| E::from(BlockingCallError::Join(err)))?
}
