//! Partition lifecycle: create, enumerate, delete.
//!
//! Partitions are only ever addressed by name. A [`Partition`] is a thin
//! handle (name plus a shared connection) and holds no cached data itself, so
//! a handle to a partition that was deleted afterwards simply sees it empty.

use std::collections::BTreeSet;

use super::connection::CacheDb;
use crate::{Error, Request, Response};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Per-partition usage, for inspection tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionStats {
    pub name: String,
    pub entries: u64,
    pub body_bytes: u64,
    pub created_at: String,
}

/// Handle to a named partition.
#[derive(Clone, Debug)]
pub struct Partition {
    db: CacheDb,
    name: String,
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a copy of `response` under `request`.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.db.put(&self.name, request, response).await
    }

    /// Look up a stored response for `request`.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.db.match_request(&self.name, request).await
    }

    /// Delete this partition and all of its entries.
    pub async fn delete(self) -> Result<bool, Error> {
        self.db.delete_partition(&self.name).await
    }
}

impl CacheDb {
    /// Open a partition by name, creating it if it does not exist.
    ///
    /// Idempotent: opening an existing partition keeps its entries and its
    /// original creation time.
    pub async fn open_partition(&self, name: &str) -> Result<Partition, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("partition name cannot be empty".into()));
        }

        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Partition { db: self.clone(), name: name.to_string() })
    }

    /// Names of every partition currently in the store.
    pub async fn list_partition_names(&self) -> Result<BTreeSet<String>, Error> {
        self.conn
            .call(|conn| -> Result<BTreeSet<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and, by cascade, all of its entries.
    ///
    /// Returns false if no partition had that name.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition regardless of name or version.
    ///
    /// Returns the number of deleted partitions.
    pub async fn delete_all_partitions(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM partitions", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry count and stored body size for each partition, by name.
    pub async fn partition_stats(&self) -> Result<Vec<PartitionStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, p.created_at, COUNT(e.key_hash), COALESCE(SUM(LENGTH(e.body)), 0)
                     FROM partitions p
                     LEFT JOIN entries e ON e.partition = p.name
                     GROUP BY p.name, p.created_at
                     ORDER BY p.name",
                )?;
                let stats = stmt
                    .query_map([], |row| {
                        Ok(PartitionStats {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                            body_bytes: row.get::<_, i64>(3)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
