
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the document catalog: one per distinct uploaded filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentEntry {
    pub id: i64,
    pub filename: String,
    /// Extraction format tag, e.g. `pdf` or `xlsx`
    pub format: String,
    pub size_bytes: i64,
    /// Chunks produced by the most recent upload
    pub chunk_count: i64,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub filename: String,
    pub format: String,
    pub size_bytes: i64,
    pub chunk_count: i64,
}

impl DocumentEntry {
    /// Size rendered for humans, e.g. `12.4 KB`
    #[inline]
    pub fn display_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

        let mut size = self.size_bytes.max(0) as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            format!("{} {}", self.size_bytes, UNITS[0])
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}
