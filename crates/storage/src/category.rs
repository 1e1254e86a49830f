//! The upload category registry and per-category validation policies.
//!
//! Categories form a closed table fixed at compile time. Each category maps to
//! a relative directory under the base storage directory and carries the
//! validation policy applied to every file uploaded into it. Unknown category
//! ids are rejected outright; raw ids are never used as directory names, so
//! untrusted input can never select a path.

use crate::{StorageError, StorageResult};
use std::str::FromStr;

/// One megabyte, for policy size limits.
pub const MB: u64 = 1024 * 1024;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const IMAGE_AND_PDF_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

const PORTFOLIO_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "video/mp4",
    "video/webm",
];

const CV_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const POST_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/webm",
];

const ATTACHMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
    "image/webp",
];

/// Field names accepted for application uploads (CV plus supporting documents).
const APPLICATION_FIELDS: &[&str] = &["cv", "documents"];

/// Validation rules applied to every file uploaded into a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// MIME types accepted for this category.
    pub allowed_types: &'static [&'static str],
    /// Per-file size limit in bytes. Limits are never aggregated per batch.
    pub max_file_size: u64,
    /// Maximum number of files accepted in a single batch.
    pub max_files: usize,
    /// Named upload slots, if the category restricts them.
    pub allowed_fields: Option<&'static [&'static str]>,
}

impl ValidationPolicy {
    /// Reject files arriving under a field name the category does not accept.
    ///
    /// Files without a field name always pass; slot checks only apply when the
    /// caller labels the file.
    pub fn check_field(&self, field: Option<&str>) -> StorageResult<()> {
        if let (Some(allowed), Some(field)) = (self.allowed_fields, field) {
            if !allowed.contains(&field) {
                return Err(StorageError::UnexpectedField {
                    field: field.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Reject batch positions beyond the per-batch file count limit.
    pub fn check_position(&self, position: usize) -> StorageResult<()> {
        if position >= self.max_files {
            return Err(StorageError::TooManyFiles {
                max: self.max_files,
            });
        }
        Ok(())
    }

    /// Reject MIME types the category does not accept.
    pub fn check_type(&self, mimetype: &str) -> StorageResult<()> {
        if !self.allowed_types.contains(&mimetype) {
            return Err(StorageError::UnsupportedType {
                mimetype: mimetype.to_owned(),
            });
        }
        Ok(())
    }

    /// Reject sizes beyond the per-file limit.
    pub fn check_size(&self, size: u64) -> StorageResult<()> {
        if size > self.max_file_size {
            return Err(StorageError::FileTooLarge {
                max_bytes: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Full accept/reject decision for one file at a known batch position.
    pub fn validate(&self, mimetype: &str, size: u64, position: usize) -> StorageResult<()> {
        self.check_position(position)?;
        self.check_type(mimetype)?;
        self.check_size(size)
    }
}

/// A registered upload category.
///
/// The set of categories is fixed at startup; [`Category::from_str`] is the
/// only way in from string input and it rejects anything not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Avatars,
    Covers,
    Thumbnails,
    General,
    Portfolio,
    Products,
    TenderDocuments,
    Cv,
    PostMedia,
    CoverPhotos,
    Applications,
}

impl Category {
    /// Every registered category, in catalog order.
    pub const ALL: [Category; 11] = [
        Category::Avatars,
        Category::Covers,
        Category::Thumbnails,
        Category::General,
        Category::Portfolio,
        Category::Products,
        Category::TenderDocuments,
        Category::Cv,
        Category::PostMedia,
        Category::CoverPhotos,
        Category::Applications,
    ];

    /// The public category id, as accepted by [`Category::from_str`].
    pub fn id(&self) -> &'static str {
        match self {
            Category::Avatars => "avatars",
            Category::Covers => "covers",
            Category::Thumbnails => "thumbnails",
            Category::General => "general",
            Category::Portfolio => "portfolio",
            Category::Products => "products",
            Category::TenderDocuments => "tender-documents",
            Category::Cv => "cv",
            Category::PostMedia => "post-media",
            Category::CoverPhotos => "cover-photos",
            Category::Applications => "applications",
        }
    }

    /// Directory for this category, relative to the base storage directory.
    /// May be nested.
    pub fn dir(&self) -> &'static str {
        match self {
            Category::Avatars => "avatars",
            Category::Covers => "covers",
            Category::Thumbnails => "thumbnails",
            Category::General => "general",
            Category::Portfolio => "portfolio",
            Category::Products => "products",
            Category::TenderDocuments => "tender/documents",
            Category::Cv => "cv",
            Category::PostMedia => "post-media",
            Category::CoverPhotos => "cover-photos",
            Category::Applications => "applications",
        }
    }

    /// Prefix for generated filenames in this category.
    pub fn prefix(&self) -> &'static str {
        match self {
            Category::Avatars => "avatar",
            Category::Covers => "cover",
            Category::Thumbnails => "thumb",
            Category::General => "file",
            Category::Portfolio => "portfolio",
            Category::Products => "product",
            Category::TenderDocuments => "tender-doc",
            Category::Cv => "cv",
            Category::PostMedia => "post",
            Category::CoverPhotos => "cover-photo",
            Category::Applications => "application",
        }
    }

    /// The validation policy applied to uploads into this category.
    pub fn policy(&self) -> ValidationPolicy {
        match self {
            Category::Avatars => ValidationPolicy {
                allowed_types: IMAGE_TYPES,
                max_file_size: 2 * MB,
                max_files: 1,
                allowed_fields: None,
            },
            Category::Covers | Category::Thumbnails | Category::CoverPhotos => ValidationPolicy {
                allowed_types: IMAGE_TYPES,
                max_file_size: 5 * MB,
                max_files: 1,
                allowed_fields: None,
            },
            Category::General => ValidationPolicy {
                allowed_types: IMAGE_AND_PDF_TYPES,
                max_file_size: 10 * MB,
                max_files: 10,
                allowed_fields: None,
            },
            Category::Portfolio => ValidationPolicy {
                allowed_types: PORTFOLIO_TYPES,
                max_file_size: 10 * MB,
                max_files: 5,
                allowed_fields: None,
            },
            Category::Products => ValidationPolicy {
                allowed_types: IMAGE_TYPES,
                max_file_size: 10 * MB,
                max_files: 10,
                allowed_fields: None,
            },
            Category::TenderDocuments => ValidationPolicy {
                allowed_types: ATTACHMENT_TYPES,
                max_file_size: 15 * MB,
                max_files: 10,
                allowed_fields: None,
            },
            Category::Cv => ValidationPolicy {
                allowed_types: CV_TYPES,
                max_file_size: 5 * MB,
                max_files: 10,
                allowed_fields: None,
            },
            Category::PostMedia => ValidationPolicy {
                allowed_types: POST_MEDIA_TYPES,
                max_file_size: 10 * MB,
                max_files: 10,
                allowed_fields: None,
            },
            Category::Applications => ValidationPolicy {
                allowed_types: ATTACHMENT_TYPES,
                max_file_size: 15 * MB,
                max_files: 10,
                allowed_fields: Some(APPLICATION_FIELDS),
            },
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.id() == value)
            .ok_or_else(|| StorageError::UnknownCategory(value.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ids_roundtrip() {
        for category in Category::ALL {
            let parsed: Category = category.id().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        let result = "../../etc".parse::<Category>();
        assert!(matches!(result, Err(StorageError::UnknownCategory(_))));

        let result = "selfies".parse::<Category>();
        assert!(matches!(result, Err(StorageError::UnknownCategory(_))));
    }

    #[test]
    fn test_directories_never_escape_base() {
        for category in Category::ALL {
            assert!(!category.dir().contains(".."));
            assert!(!category.dir().starts_with('/'));
        }
    }

    #[test]
    fn test_avatar_policy() {
        let policy = Category::Avatars.policy();
        assert_eq!(policy.max_file_size, 2 * MB);
        assert_eq!(policy.max_files, 1);
        assert!(policy.allowed_types.contains(&"image/png"));
        assert!(!policy.allowed_types.contains(&"application/pdf"));
    }

    #[test]
    fn test_cv_policy_accepts_documents_only() {
        let policy = Category::Cv.policy();
        assert!(policy.validate("application/pdf", MB, 0).is_ok());
        assert!(matches!(
            policy.validate("image/png", MB, 0),
            Err(StorageError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_size_rejection() {
        let policy = Category::Avatars.policy();
        let result = policy.validate("image/png", 6 * MB, 0);
        assert!(matches!(
            result,
            Err(StorageError::FileTooLarge { max_bytes }) if max_bytes == 2 * MB
        ));
    }

    #[test]
    fn test_position_rejection() {
        let policy = Category::Avatars.policy();
        assert!(matches!(
            policy.validate("image/png", MB, 1),
            Err(StorageError::TooManyFiles { max: 1 })
        ));
    }

    #[test]
    fn test_application_fields() {
        let policy = Category::Applications.policy();
        assert!(policy.check_field(Some("cv")).is_ok());
        assert!(policy.check_field(Some("documents")).is_ok());
        assert!(policy.check_field(None).is_ok());
        assert!(matches!(
            policy.check_field(Some("selfie")),
            Err(StorageError::UnexpectedField { .. })
        ));
    }

    #[test]
    fn test_size_error_message_names_limit_in_mb() {
        let err = Category::Cv.policy().validate("application/pdf", 6 * MB, 0);
        assert_eq!(
            err.unwrap_err().to_string(),
            "File too large. Maximum size is 5MB."
        );
    }
}
