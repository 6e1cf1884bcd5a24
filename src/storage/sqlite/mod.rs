pub mod operations;
pub mod queries;
pub mod schema;

use anyhow::Result;
use std::collections::HashMap;

use crate::digest::ContentDigest;
use crate::storage::{InsertOutcome, TokenStore};

pub use operations::SqliteStore;
pub use schema::*;

impl SqliteStore {
    pub fn list_token_counts(&self) -> Result<Vec<TokenCountRow>> {
        queries::cache::list_token_counts(&self.conn)
    }

    pub fn insert_token_count(&self, digest: &str, token_count: u64) -> Result<InsertOutcome> {
        let written = queries::cache::insert_token_count(&self.conn, digest, token_count)?;
        Ok(if written == 0 {
            InsertOutcome::AlreadyExists
        } else {
            InsertOutcome::Inserted
        })
    }

    pub fn count_entries(&self) -> Result<u64> {
        queries::cache::count_entries(&self.conn)
    }
}

impl TokenStore for SqliteStore {
    fn load_all(&self) -> Result<HashMap<ContentDigest, u64>> {
        let rows = self.list_token_counts()?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            match ContentDigest::from_hex(&row.digest) {
                Some(digest) => {
                    out.insert(digest, row.token_count);
                }
                None => {
                    tracing::warn!(digest = %row.digest, "Ignoring malformed digest in token cache");
                }
            }
        }
        Ok(out)
    }

    fn insert_if_absent(&self, digest: &ContentDigest, token_count: u64) -> Result<InsertOutcome> {
        self.insert_token_count(&digest.to_hex(), token_count)
    }
}
