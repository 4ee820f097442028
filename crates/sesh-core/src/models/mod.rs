//! Data models for the ingestion engine
//!
//! Organized by domain: per-file upload items and their state machine,
//! the session draft being assembled, the assembled submission payload,
//! and venue directory records.

mod item;
mod payload;
mod session;
mod venue;

// Re-export all models for convenient imports
pub use item::*;
pub use payload::*;
pub use session::*;
pub use venue::*;
