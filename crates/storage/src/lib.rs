//! Tendra Upload Storage
//!
//! This crate provides the categorized upload/storage subsystem for the Tendra
//! platform: directory and URL resolution, per-category validation, a batch
//! upload pipeline with all-or-nothing semantics, file lifecycle operations,
//! and storage statistics.
//!
//! ## Design Principles
//!
//! - Every upload belongs to exactly one registered [`Category`]; unknown
//!   category ids are rejected rather than mapped onto the filesystem
//! - Stored files are never overwritten; every write generates a fresh,
//!   collision-resistant filename
//! - A batch of uploads either produces a [`FileRecord`] per file with the
//!   matching bytes on disk, or nothing at all
//! - Configuration is resolved once at startup and passed into the service;
//!   no environment variables are read during request handling
//! - File metadata is returned to the caller; this crate persists nothing
//!   beyond the bytes themselves
//!
//! ## Storage Layout
//!
//! ```text
//! <base_dir>/                # UPLOAD_BASE_DIR, default "uploads"
//! ├── avatars/
//! ├── cv/
//! ├── tender/
//! │   └── documents/
//! └── …                      # one directory per registered category
//! ```
//!
//! Callers receive three addresses for each stored file: the absolute storage
//! path, a deployment-independent relative path (`uploads/<dir>/<filename>`),
//! and an environment-aware public URL (`<origin>/uploads/<dir>/<filename>`).
//!
//! ## Example Usage
//!
//! ```no_run
//! use tendra_storage::{Category, IncomingFile, StorageConfig, StorageService};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::from_env()?;
//! let service = StorageService::new(config);
//!
//! let file = IncomingFile::from_bytes("me.png", "image/png", vec![0u8; 1024]);
//! let records = service.store_batch(Category::Avatars, vec![file])?;
//! println!("stored at {}", records[0].url);
//! # Ok(())
//! # }
//! ```

mod category;
mod config;
mod constants;
mod filename;
mod preflight;
mod service;
mod stats;

pub use category::{Category, ValidationPolicy, MB};
pub use config::{Environment, StorageConfig};
pub use filename::{generate_filename, sanitize_basename};
pub use preflight::PreflightReport;
pub use service::{FileRecord, IncomingFile, StorageService};
pub use stats::{format_size, CategoryStats, StorageStats};

/// Errors that can occur during storage operations.
///
/// Validation variants carry enough typed detail for an HTTP collaborator to
/// map them to status codes without inspecting message text. User-visible
/// messages are single sentences and never contain filesystem paths.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The claimed MIME type is not allowed for the target category.
    #[error("Unsupported file type: {mimetype}.")]
    UnsupportedType { mimetype: String },

    /// The file exceeds the category's per-file size limit.
    #[error("File too large. Maximum size is {}MB.", max_bytes / (1024 * 1024))]
    FileTooLarge { max_bytes: u64 },

    /// The batch contains more files than the category allows.
    #[error("Too many files. Maximum is {max} per upload.")]
    TooManyFiles { max: usize },

    /// A file arrived under a field name the category does not accept.
    #[error("Unexpected upload field: {field}.")]
    UnexpectedField { field: String },

    /// The category id is not in the registry.
    #[error("Unknown upload category: {0}.")]
    UnknownCategory(String),

    /// A caller-supplied filename was empty or contained path separators.
    #[error("Invalid filename.")]
    InvalidFilename,

    /// Writing uploaded bytes to disk failed.
    #[error("Failed to write uploaded file.")]
    Write(#[source] std::io::Error),

    /// A non-write I/O operation failed.
    #[error("Storage I/O error.")]
    Io(#[from] std::io::Error),

    /// The storage configuration is unusable.
    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

impl StorageError {
    /// Whether the error is client-correctable (wrong type, size, count or
    /// field) as opposed to a server-side failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StorageError::UnsupportedType { .. }
                | StorageError::FileTooLarge { .. }
                | StorageError::TooManyFiles { .. }
                | StorageError::UnexpectedField { .. }
                | StorageError::UnknownCategory(_)
                | StorageError::InvalidFilename
        )
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
