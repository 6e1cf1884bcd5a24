use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::storage::sqlite::schema::TokenCountRow;

pub fn list_token_counts(conn: &Connection) -> Result<Vec<TokenCountRow>> {
    let mut stmt = conn
        .prepare("SELECT digest, token_count FROM token_cache")
        .context("Failed to prepare list_token_counts")?;

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(TokenCountRow {
            digest: row.get(0)?,
            token_count: row.get::<_, i64>(1)?.max(0) as u64,
        });
    }
    Ok(out)
}

/// Insert a row unless the digest is already present. Returns the number of
/// rows written, so `0` means another writer got there first.
pub fn insert_token_count(conn: &Connection, digest: &str, token_count: u64) -> Result<usize> {
    let mut stmt = conn.prepare_cached(
        r#"
INSERT INTO token_cache(digest, token_count)
VALUES (?1, ?2)
ON CONFLICT(digest) DO NOTHING
"#,
    )?;

    stmt.execute(params![digest, token_count as i64])
        .with_context(|| format!("Failed to insert token count for {digest}"))
}

pub fn count_entries(conn: &Connection) -> Result<u64> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM token_cache", [], |row| row.get(0))
        .context("Failed to count token cache entries")?;
    Ok(n.max(0) as u64)
}
