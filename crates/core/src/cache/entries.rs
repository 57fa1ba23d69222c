//! Response storage and lookup within partitions.

use super::connection::CacheDb;
use super::hash::{compute_request_key, normalize_url};
use crate::{Error, Request, Response};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Raw row as read from `entries`, decoded outside the connection thread.
type EntryRow = (u16, String, String, Vec<u8>);

impl CacheDb {
    /// Store a copy of `response` for `request` in `partition`.
    ///
    /// Only GET requests can be stored. A missing partition is created, so a
    /// runtime partition comes into existence on its first successful fetch.
    /// Replaces any previous entry for the same request.
    pub async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<(), Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!(
                "only GET requests can be cached, got {}",
                request.method
            )));
        }

        let url = normalize_url(&request.url)?;
        let key_hash = compute_request_key("GET", &url);
        let headers_json = serde_json::to_string(&response.headers)?;
        let partition = partition.to_string();
        let status = response.status;
        let status_text = response.status_text.clone();
        let body = response.body.to_vec();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![&partition, &now],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                        partition, key_hash, method, url, status, status_text,
                        headers_json, body, stored_at
                    ) VALUES (?1, ?2, 'GET', ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![&partition, &key_hash, &url, status, &status_text, &headers_json, &body, &now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the stored response for `request` in `partition`.
    ///
    /// Returns None for non-GET requests, unknown partitions and misses.
    pub async fn match_request(&self, partition: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let url = normalize_url(&request.url)?;
        let key_hash = compute_request_key("GET", &url);
        let partition = partition.to_string();

        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, status_text, headers_json, body
                         FROM entries WHERE partition = ?1 AND key_hash = ?2",
                        params![partition, key_hash],
                        read_entry,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(decode_entry).transpose()
    }

    /// Look up `request` across every partition, oldest partition first.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let url = normalize_url(&request.url)?;
        let key_hash = compute_request_key("GET", &url);

        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.status_text, e.headers_json, e.body
                         FROM entries e
                         JOIN partitions p ON p.name = e.partition
                         WHERE e.key_hash = ?1
                         ORDER BY p.rowid ASC
                         LIMIT 1",
                        params![key_hash],
                        read_entry,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(decode_entry).transpose()
    }
}

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_entry((status, status_text, headers_json, body): EntryRow) -> Result<Response, Error> {
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(Response { status, status_text, headers, body: Bytes::from(body) })
}
