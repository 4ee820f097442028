use sesh_core::{IngestConfig, MediaKind};
use std::path::Path;

/// Per-file admission failures. These settle an item as failed without it
/// ever reaching a preview generator.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Validates raw files before they are admitted to a session.
///
/// Holds separate allow lists per media kind so the same validator covers
/// the whole mixed batch, without coupling to where the bytes came from.
pub struct FileValidator {
    max_file_size: u64,
    image_allowed_extensions: Vec<String>,
    image_allowed_content_types: Vec<String>,
    video_allowed_extensions: Vec<String>,
    video_allowed_content_types: Vec<String>,
}

impl FileValidator {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            max_file_size: config.max_file_size_bytes,
            image_allowed_extensions: config.image_allowed_extensions.clone(),
            image_allowed_content_types: config.image_allowed_content_types.clone(),
            video_allowed_extensions: config.video_allowed_extensions.clone(),
            video_allowed_content_types: config.video_allowed_content_types.clone(),
        }
    }

    /// Classify a declared content type into a media kind.
    pub fn classify(content_type: &str) -> Result<MediaKind, ValidationError> {
        let normalized = content_type.to_lowercase();
        if normalized.starts_with("image/") {
            Ok(MediaKind::Image)
        } else if normalized.starts_with("video/") {
            Ok(MediaKind::Video)
        } else {
            Err(ValidationError::UnsupportedMediaType(
                content_type.to_string(),
            ))
        }
    }

    /// Best-effort kind for a file that may not validate: declared content
    /// type first, extension second, image as the neutral default.
    pub fn declared_kind(&self, file_name: &str, content_type: &str) -> MediaKind {
        if let Ok(kind) = Self::classify(content_type) {
            return kind;
        }
        match extension_of(file_name) {
            Some(extension) if self.video_allowed_extensions.contains(&extension) => {
                MediaKind::Video
            }
            _ => MediaKind::Image,
        }
    }

    /// Validate all aspects of one file. Returns its kind on success.
    pub fn validate(
        &self,
        file_name: &str,
        content_type: &str,
        size: u64,
    ) -> Result<MediaKind, ValidationError> {
        self.validate_file_size(size)?;
        let kind = Self::classify(content_type)?;
        self.validate_extension(file_name, kind)?;
        self.validate_content_type(content_type, kind)?;
        self.validate_extension_content_type_match(file_name, content_type)?;
        Ok(kind)
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension against the kind's allow list
    pub fn validate_extension(
        &self,
        file_name: &str,
        kind: MediaKind,
    ) -> Result<(), ValidationError> {
        let extension = extension_of(file_name)
            .ok_or_else(|| ValidationError::InvalidFilename(file_name.to_string()))?;

        let allowed = self.allowed_extensions(kind);
        if !allowed.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: allowed.to_vec(),
            });
        }

        Ok(())
    }

    /// Validate content type against the kind's allow list
    pub fn validate_content_type(
        &self,
        content_type: &str,
        kind: MediaKind,
    ) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        let allowed = self.allowed_content_types(kind);
        if !allowed.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: allowed.to_vec(),
            });
        }

        Ok(())
    }

    /// Validate that Content-Type matches the file extension
    /// This prevents Content-Type spoofing where a file is handed over
    /// with a legitimate Content-Type that does not match its name.
    pub fn validate_extension_content_type_match(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let extension = extension_of(file_name)
            .ok_or_else(|| ValidationError::InvalidFilename(file_name.to_string()))?;

        let normalized_content_type = content_type.to_lowercase();

        // Map common extensions to expected Content-Types
        let expected_content_types: Vec<&str> = match extension.as_str() {
            // Images
            "jpg" | "jpeg" => vec!["image/jpeg"],
            "png" => vec!["image/png"],
            "gif" => vec!["image/gif"],
            "webp" => vec!["image/webp"],
            "avif" => vec!["image/avif"],
            "heic" => vec!["image/heic", "image/heif"],
            // Videos
            "mp4" => vec!["video/mp4"],
            "webm" => vec!["video/webm"],
            "mov" => vec!["video/quicktime"],
            "avi" => vec!["video/x-msvideo"],
            "mkv" => vec!["video/x-matroska"],
            "m4v" => vec!["video/x-m4v"],
            _ => {
                // For unknown extensions, skip cross-validation; the
                // extension and content-type are still validated individually
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown extension, skipping Content-Type/extension cross-validation"
                );
                return Ok(());
            }
        };

        if !expected_content_types
            .iter()
            .any(|ct| ct == &normalized_content_type)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}')",
                    content_type, extension
                ),
                allowed: expected_content_types
                    .iter()
                    .map(|ct| ct.to_string())
                    .collect(),
            });
        }

        Ok(())
    }

    fn allowed_extensions(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Image => &self.image_allowed_extensions,
            MediaKind::Video => &self.video_allowed_extensions,
        }
    }

    fn allowed_content_types(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Image => &self.image_allowed_content_types,
            MediaKind::Video => &self.video_allowed_content_types,
        }
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
