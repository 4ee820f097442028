//! Preview generation for session media.
//!
//! This crate provides the per-file half of ingestion:
//! - Admission validation (validator)
//! - Watermarked image previews and cover thumbnails (image)
//! - Low-fidelity video preview clips with still fallback (video)
//!
//! Generators take raw bytes and return finished assets; queueing and
//! dispatch live in `sesh-ingest`.

pub mod error;
pub mod image;
pub mod resize;
pub mod validator;
pub mod video;

pub use error::PreviewError;
pub use validator::{FileValidator, ValidationError};
