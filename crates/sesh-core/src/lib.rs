//! Sesh Core Library
//!
//! This crate provides the domain models, publish gate, configuration and
//! shared error types used across the sesh session-ingestion components.

pub mod config;
pub mod error;
pub mod models;
pub mod publish_gate;

// Re-export commonly used types
pub use config::IngestConfig;
pub use error::AdmissionError;
pub use models::*;
pub use publish_gate::{BlockReason, PublishGate, MIN_IMAGE_ITEMS, MIN_SESSION_ITEMS};
