//! Schema migrations for the partition store.
//!
//! Applied versions are recorded in `schema_version`; each pending batch runs
//! in its own transaction together with its version row.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// (version, SQL), ascending.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_partitions.sql"))];

/// Highest version this build knows about.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

fn applied_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
    )?;
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Bring the schema up to [`latest_version`].
///
/// # Errors
///
/// `MigrationFailed` names the version whose batch was rejected; earlier
/// versions stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let applied = applied_version(conn)?;
        if applied > latest_version() {
            return Err(Error::MigrationFailed(format!(
                "store is at schema version {applied}, newer than supported {}",
                latest_version()
            )));
        }

        for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            tx.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::debug!(version, "applied schema migration");
        }
        Ok(())
    })
    .await
    .map_err(Error::from)
}
