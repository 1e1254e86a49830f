//! The storage service: path resolution, the upload pipeline, and file
//! lifecycle operations.
//!
//! # Batch Semantics
//!
//! [`StorageService::store_batch`] is all-or-nothing: the first rejected or
//! failed file aborts the batch, every file written earlier in the batch is
//! deleted, and the caller gets the typed error. On success the returned
//! records match the input order.
//!
//! # Concurrency
//!
//! The service holds no mutable state; the filesystem is the only thing
//! shared between requests. Directory creation tolerates concurrent first
//! use, and filename uniqueness comes from timestamp plus random suffix, so
//! concurrent batches need no coordination.

use crate::category::{Category, ValidationPolicy};
use crate::config::{Environment, StorageConfig};
use crate::constants::{DEFAULT_ENCODING, SNIFF_LEN, UPLOADS_SEGMENT};
use crate::filename::{ensure_safe_filename, generate_filename};
use crate::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Metadata describing one successfully stored file, returned to the caller.
///
/// Created only after the bytes are on disk; never mutated. Serialises with
/// the camelCase field names callers persist (`storagePath`, `uploadedAt`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Environment-aware public URL.
    pub url: String,

    /// Deployment-independent relative path: `uploads/<dir>/<filename>`.
    pub path: String,

    /// Absolute path of the bytes on disk.
    pub storage_path: PathBuf,

    /// Generated filename, unique per write.
    pub filename: String,

    /// Filename as claimed by the uploader.
    pub originalname: String,

    /// MIME type as claimed by the uploader.
    pub mimetype: String,

    /// Size of the stored file in bytes.
    pub size: u64,

    /// Transfer encoding reported by the caller.
    pub encoding: String,

    /// Category the file was stored under.
    pub category: Category,

    /// UTC timestamp of the write.
    pub uploaded_at: DateTime<Utc>,

    /// Environment tag active when the file was stored.
    pub environment: Environment,
}

/// One incoming file in an upload batch: claimed metadata plus a byte source.
///
/// Request-scoped and never persisted. The source is read at most once, while
/// streaming to disk under the category's size cap.
pub struct IncomingFile {
    originalname: String,
    mimetype: String,
    field: Option<String>,
    encoding: Option<String>,
    source: Box<dyn Read>,
}

impl IncomingFile {
    /// Wrap a byte stream with its claimed name and MIME type.
    pub fn from_reader(
        originalname: impl Into<String>,
        mimetype: impl Into<String>,
        source: impl Read + 'static,
    ) -> Self {
        Self {
            originalname: originalname.into(),
            mimetype: mimetype.into(),
            field: None,
            encoding: None,
            source: Box::new(source),
        }
    }

    /// Wrap an in-memory buffer; convenient for tests and small payloads.
    pub fn from_bytes(
        originalname: impl Into<String>,
        mimetype: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self::from_reader(originalname, mimetype, io::Cursor::new(bytes))
    }

    /// Label the file with the multipart field name it arrived under.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Record the transfer encoding reported by the transport.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

impl std::fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingFile")
            .field("originalname", &self.originalname)
            .field("mimetype", &self.mimetype)
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

/// Service for categorized upload storage.
///
/// Owns the startup-resolved [`StorageConfig`] and exposes the upload
/// pipeline, lifecycle operations, statistics and the startup preflight
/// check. Cheap to clone; hosts typically build one per process.
#[derive(Debug, Clone)]
pub struct StorageService {
    config: StorageConfig,
}

impl StorageService {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Directory for a category, created if missing.
    ///
    /// Idempotent and safe under concurrent first use: `create_dir_all`
    /// treats an already-existing directory as success.
    pub fn absolute_dir(&self, category: Category) -> StorageResult<PathBuf> {
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir).map_err(StorageError::Write)?;
        Ok(dir)
    }

    /// Deployment-independent path callers persist: `uploads/<dir>/<filename>`.
    pub fn relative_path(&self, filename: &str, category: Category) -> String {
        format!("{}/{}/{}", UPLOADS_SEGMENT, category.dir(), filename)
    }

    /// Environment-aware public URL: `<origin>/uploads/<dir>/<filename>`.
    pub fn public_url(&self, filename: &str, category: Category) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.origin(),
            UPLOADS_SEGMENT,
            category.dir(),
            filename
        )
    }

    fn category_dir(&self, category: Category) -> PathBuf {
        self.config.base_dir().join(category.dir())
    }

    fn stored_path(&self, filename: &str, category: Category) -> PathBuf {
        self.category_dir(category).join(filename)
    }

    /// Store an ordered batch of files under one category.
    ///
    /// Files are validated and written in input order. The first rejection or
    /// write failure aborts the batch: nothing further is accepted, files
    /// already written in this batch are deleted, and the error is returned.
    /// On success, one [`FileRecord`] per input file, in input order.
    pub fn store_batch(
        &self,
        category: Category,
        files: Vec<IncomingFile>,
    ) -> StorageResult<Vec<FileRecord>> {
        let policy = category.policy();
        let dir = self.absolute_dir(category)?;

        let mut written: Vec<FileRecord> = Vec::with_capacity(files.len());
        for (position, file) in files.into_iter().enumerate() {
            match self.store_one(&dir, category, &policy, position, file) {
                Ok(record) => written.push(record),
                Err(err) => {
                    tracing::error!(
                        category = %category,
                        position,
                        error = %err,
                        "upload batch aborted, rolling back earlier files"
                    );
                    self.rollback(&written);
                    return Err(err);
                }
            }
        }

        Ok(written)
    }

    /// Remove the on-disk files behind a set of records.
    ///
    /// Used internally when a batch aborts; also the entry point for callers
    /// that abandon a batch after `store_batch` returned. Best-effort: a file
    /// that is already gone is fine, other failures are logged and skipped.
    pub fn rollback(&self, records: &[FileRecord]) {
        for record in records {
            if let Err(err) = fs::remove_file(&record.storage_path) {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        filename = %record.filename,
                        error = %err,
                        "could not remove file during rollback"
                    );
                }
            }
        }
    }

    /// Store a replacement file and retire the one it supersedes.
    ///
    /// The new file is written first; the superseded file is only deleted
    /// afterwards, so a failed write never loses the old data. Deleting the
    /// old file is best-effort: a failure is logged and the new upload is
    /// still reported successful, since a stale file is acceptable and data
    /// loss is not. Callers that persist records externally should update
    /// their record between `store_batch` and `delete` instead.
    pub fn replace(
        &self,
        category: Category,
        file: IncomingFile,
        superseded: Option<&str>,
    ) -> StorageResult<FileRecord> {
        let policy = category.policy();
        let dir = self.absolute_dir(category)?;
        let record = self.store_one(&dir, category, &policy, 0, file)?;

        if let Some(old) = superseded {
            if old != record.filename {
                match self.delete(old, category) {
                    Ok(true) => {
                        tracing::debug!(category = %category, "superseded file removed")
                    }
                    Ok(false) => {
                        tracing::warn!(
                            category = %category,
                            "superseded file was already gone or could not be removed"
                        )
                    }
                    Err(err) => {
                        tracing::warn!(
                            category = %category,
                            error = %err,
                            "superseded filename rejected, leaving it in place"
                        )
                    }
                }
            }
        }

        Ok(record)
    }

    /// Whether a stored file exists in the category directory.
    pub fn exists(&self, filename: &str, category: Category) -> StorageResult<bool> {
        ensure_safe_filename(filename)?;
        Ok(self.stored_path(filename, category).is_file())
    }

    /// Delete a stored file. Returns `false` when the file was already gone.
    ///
    /// Idempotent and best-effort: a real I/O failure is logged and also
    /// reported as `false` rather than raised, matching delete's role as a
    /// cleanup operation. Only an unsafe filename is an error.
    pub fn delete(&self, filename: &str, category: Category) -> StorageResult<bool> {
        ensure_safe_filename(filename)?;
        let path = self.stored_path(filename, category);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                tracing::warn!(category = %category, error = %err, "failed to delete stored file");
                Ok(false)
            }
        }
    }

    /// List filenames stored in a category, sorted.
    ///
    /// An absent category directory is an empty listing, not an error.
    pub fn list(&self, category: Category) -> StorageResult<Vec<String>> {
        let dir = self.category_dir(category);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::Io(err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Validate, name and write a single file, building its record.
    ///
    /// A failed write cleans up its own partial output, so the caller only
    /// has to roll back files from earlier positions.
    fn store_one(
        &self,
        dir: &Path,
        category: Category,
        policy: &ValidationPolicy,
        position: usize,
        file: IncomingFile,
    ) -> StorageResult<FileRecord> {
        policy.check_field(file.field.as_deref())?;
        policy.check_position(position)?;
        policy.check_type(&file.mimetype)?;

        let filename = generate_filename(&file.originalname, category.prefix());
        let dest = dir.join(&filename);
        let size = write_capped(&dest, file.source, policy.max_file_size, &file.mimetype)?;

        tracing::debug!(category = %category, size, "stored uploaded file");

        Ok(FileRecord {
            url: self.public_url(&filename, category),
            path: self.relative_path(&filename, category),
            storage_path: dest,
            filename,
            originalname: file.originalname,
            mimetype: file.mimetype,
            size,
            encoding: file.encoding.unwrap_or_else(|| DEFAULT_ENCODING.to_owned()),
            category,
            uploaded_at: Utc::now(),
            environment: self.config.environment(),
        })
    }
}

/// Stream a source to `dest`, enforcing the size cap as bytes arrive.
///
/// Reads at most one byte past the cap, so memory and disk stay bounded for
/// oversized input. The destination is created exclusively (never silently
/// overwritten) and removed again on any failure. The leading bytes are
/// sniffed with `infer`; a mismatch against the claimed MIME type is logged
/// but the claimed type still governs validation.
fn write_capped(
    dest: &Path,
    mut source: Box<dyn Read>,
    max_bytes: u64,
    claimed_mime: &str,
) -> StorageResult<u64> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut source)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(StorageError::Write)?;

    if let Some(kind) = infer::get(&head) {
        if kind.mime_type() != claimed_mime {
            tracing::warn!(
                claimed = claimed_mime,
                detected = kind.mime_type(),
                "claimed MIME type does not match file content"
            );
        }
    }

    let out = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(StorageError::Write)?;
    let mut writer = io::BufWriter::new(out);

    let outcome = (|| -> Result<u64, io::Error> {
        writer.write_all(&head)?;
        let budget = (max_bytes + 1).saturating_sub(head.len() as u64);
        let copied = io::copy(&mut (&mut source).take(budget), &mut writer)?;
        writer.flush()?;
        Ok(head.len() as u64 + copied)
    })();

    match outcome {
        Ok(total) if total > max_bytes => {
            let _ = fs::remove_file(dest);
            Err(StorageError::FileTooLarge { max_bytes })
        }
        Ok(total) => Ok(total),
        Err(err) => {
            let _ = fs::remove_file(dest);
            Err(StorageError::Write(err))
        }
    }
}
