use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCountRow {
    pub digest: String,
    pub token_count: u64,
}

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS token_cache (
  digest TEXT NOT NULL,
  token_count INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_token_cache_digest ON token_cache(digest);
"#;
