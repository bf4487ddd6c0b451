//! `PostgreSQL` adapters for Whippet entity persistence.

mod application;
mod job;
mod models;
mod schema;
mod setting;
mod tenant;

pub use application::PostgresApplicationRepository;
pub use job::PostgresJobRepository;
pub use setting::PostgresSettingRepository;
pub use tenant::PostgresTenantRepository;

use crate::postgres::{PgAccessError, PgPool, run_with_connection};
use crate::whippet::ports::{WhippetRepositoryError, WhippetRepositoryResult};
use diesel::PgConnection;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Runs a blocking Diesel operation with Whippet error mapping.
async fn run_blocking<F, T>(pool: &PgPool, f: F) -> WhippetRepositoryResult<T>
where
    F: FnOnce(&mut PgConnection) -> WhippetRepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    run_with_connection(pool, access_error, f).await
}

fn access_error(err: PgAccessError) -> WhippetRepositoryError {
    WhippetRepositoryError::persistence(err)
}

/// Maps insert failures, turning unique violations into `Duplicate`.
fn map_insert_error(
    entity: &'static str,
    key: String,
) -> impl FnOnce(DieselError) -> WhippetRepositoryError {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
            let constraint = info.constraint_name().unwrap_or(entity);
            WhippetRepositoryError::duplicate(entity, format!("{key} ({constraint})"))
        }
        other => WhippetRepositoryError::persistence(other),
    }
}

/// Converts the affected-row count of an update into `NotFound` when zero.
fn ensure_updated(
    affected: usize,
    entity: &'static str,
    key: impl ToString,
) -> WhippetRepositoryResult<()> {
    if affected == 0 {
        return Err(WhippetRepositoryError::not_found(entity, key));
    }
    Ok(())
}
