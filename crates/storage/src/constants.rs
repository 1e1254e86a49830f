//! Crate-wide constants.

/// Leading segment of every relative path and public URL.
pub(crate) const UPLOADS_SEGMENT: &str = "uploads";

/// Base directory used when `UPLOAD_BASE_DIR` is unset.
pub(crate) const DEFAULT_BASE_DIR: &str = "uploads";

/// Public origin used outside production when `PUBLIC_ORIGIN` is unset.
pub(crate) const DEFAULT_DEV_ORIGIN: &str = "http://localhost:5000";

/// Fixed public origin in production.
pub(crate) const PRODUCTION_ORIGIN: &str = "https://tendra.app";

/// Transfer encoding recorded when the caller does not supply one.
pub(crate) const DEFAULT_ENCODING: &str = "7bit";

/// Name of the temporary file used by the writability probe.
pub(crate) const WRITE_PROBE_NAME: &str = ".tendra-write-probe";

/// How many leading bytes are buffered for content-type sniffing.
pub(crate) const SNIFF_LEN: usize = 512;
