pub mod cache;
pub mod sqlite;

use anyhow::Result;
use std::collections::HashMap;

use crate::digest::ContentDigest;

/// Result of a persist attempt. A duplicate digest is an expected outcome of
/// two workers racing on the same miss, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Durable digest -> token count table owned by [`cache::TokenCache`].
///
/// `insert_if_absent` must be durable when it returns `Ok`. Any `Err` is a
/// real storage failure; uniqueness conflicts are reported as
/// [`InsertOutcome::AlreadyExists`].
pub trait TokenStore: Send {
    fn load_all(&self) -> Result<HashMap<ContentDigest, u64>>;
    fn insert_if_absent(&self, digest: &ContentDigest, token_count: u64) -> Result<InsertOutcome>;
}
