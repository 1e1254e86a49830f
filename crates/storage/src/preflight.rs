//! Startup preflight check for the storage configuration.
//!
//! Run once when the host constructs the service, before serving traffic.
//! The report never terminates the process; whether `valid == false` is fatal
//! is the host's decision. Issue texts name categories, never filesystem
//! paths.

use crate::category::Category;
use crate::constants::WRITE_PROBE_NAME;
use crate::service::StorageService;
use std::fs;

/// Outcome of [`StorageService::preflight`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PreflightReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl StorageService {
    /// Self-check of the storage configuration.
    ///
    /// Verifies that the base directory exists, that it is writable (by
    /// writing and removing a probe file; the probe is removed even when the
    /// write fails partway), and that every registered category directory is
    /// present, creating missing ones the same way first use would.
    pub fn preflight(&self) -> PreflightReport {
        let mut issues = Vec::new();
        let base = self.config().base_dir();

        if !base.is_dir() {
            issues.push("Base storage directory does not exist.".to_owned());
            return PreflightReport {
                valid: false,
                issues,
            };
        }

        let probe = base.join(WRITE_PROBE_NAME);
        let write = fs::write(&probe, b"probe");
        // Cleanup is unconditional; a partially written probe must not linger.
        let _ = fs::remove_file(&probe);
        if let Err(err) = write {
            tracing::warn!(error = %err, "base directory write probe failed");
            issues.push("Base storage directory is not writable.".to_owned());
        }

        for category in Category::ALL {
            let dir = base.join(category.dir());
            if let Err(err) = fs::create_dir_all(&dir) {
                tracing::warn!(category = %category, error = %err, "could not create category directory");
                issues.push(format!(
                    "Directory for category '{category}' is missing and could not be created."
                ));
            }
        }

        PreflightReport {
            valid: issues.is_empty(),
            issues,
        }
    }
}
