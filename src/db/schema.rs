//! SQL DDL for initializing the record store (SQLite).

/// Schema includes:
/// - `pages` table (one generated page per row, id assigned by the store)
/// - `idx_pages_created_at` index backing the newest-first listing
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    id TEXT PRIMARY KEY NOT NULL,
    prompt TEXT NOT NULL,
    html_version TEXT NOT NULL,
    nextjs_version TEXT NOT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_pages_created_at ON pages(created_at);
"#;
