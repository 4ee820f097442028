//! Session ingestion pipeline.
//!
//! This crate owns the stateful half of ingestion:
//! - Atomic batch admission into an ordered queue (queue)
//! - Bounded concurrent preview generation (dispatcher, processor)
//! - Submit-time payload assembly from settled items (assembler)
//!
//! Per-file preview generation itself lives in `sesh-processing`; this
//! crate drives it and tracks item lifecycle.

pub mod assembler;
pub mod dispatcher;
pub mod processor;
pub mod queue;

pub use assembler::{AssembleError, SessionAssembler};
pub use dispatcher::{Dispatcher, ItemSettledSender};
pub use processor::{ItemProcessor, MediaItemProcessor};
pub use queue::{IngestionQueue, RawFile};
