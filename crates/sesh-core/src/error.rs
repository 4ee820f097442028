//! Batch admission errors.
//!
//! Admission is all-or-nothing: when a batch would blow either budget the
//! whole batch is rejected with one aggregate error and nothing is admitted.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error(
        "Batch of {incoming} files would exceed the session limit of {max} items ({current} already admitted)"
    )]
    TooManyItems {
        current: usize,
        incoming: usize,
        max: usize,
    },

    #[error(
        "Batch of {incoming_bytes} bytes would exceed the session budget of {max_bytes} bytes ({current_bytes} bytes already admitted)"
    )]
    SessionSizeExceeded {
        current_bytes: u64,
        incoming_bytes: u64,
        max_bytes: u64,
    },
}
