//! Storage statistics: per-category file counts and byte totals.
//!
//! Snapshots are computed on demand from the live filesystem and never
//! cached. Unreadable entries are skipped and logged; a broken entry must not
//! abort the whole scan.

use crate::category::Category;
use crate::service::StorageService;
use std::fs;
use std::io;

/// Usage of a single category directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CategoryStats {
    pub category: Category,
    pub files: u64,
    pub bytes: u64,
}

/// Usage across every registered category, plus grand totals.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    pub categories: Vec<CategoryStats>,
    pub total_files: u64,
    pub total_bytes: u64,
}

impl StorageService {
    /// Walk every registered category and aggregate file counts and sizes.
    ///
    /// Absent category directories count as empty. Entries that cannot be
    /// read are logged and skipped.
    pub fn stats(&self) -> StorageStats {
        let mut categories = Vec::with_capacity(Category::ALL.len());
        let mut total_files = 0;
        let mut total_bytes = 0;

        for category in Category::ALL {
            let (files, bytes) = self.scan_category(category);
            total_files += files;
            total_bytes += bytes;
            categories.push(CategoryStats {
                category,
                files,
                bytes,
            });
        }

        StorageStats {
            categories,
            total_files,
            total_bytes,
        }
    }

    fn scan_category(&self, category: Category) -> (u64, u64) {
        let dir = self.config().base_dir().join(category.dir());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return (0, 0),
            Err(err) => {
                tracing::warn!(category = %category, error = %err, "could not scan category directory");
                return (0, 0);
            }
        };

        let mut files = 0;
        let mut bytes = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(category = %category, error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            match entry.metadata() {
                Ok(metadata) if metadata.is_file() => {
                    files += 1;
                    bytes += metadata.len();
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(category = %category, error = %err, "skipping unreadable entry");
                }
            }
        }

        (files, bytes)
    }
}

/// Format a byte count as a human-readable size.
///
/// Binary (1024-based) units with two decimals: Bytes, KB, MB, GB, TB.
/// Zero formats as `"0 Bytes"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}
