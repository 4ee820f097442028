//! Aggregate readiness evaluation for session submission.
//!
//! The gate is a pure function over the session draft and the current item
//! list: no I/O, cheap enough to re-run after every item state change.
//! Every rule is evaluated and all violations are reported together, in a
//! fixed order, so callers can show the complete picture at once.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::{SessionDraft, SessionKind, UploadItem, VenueRef};

/// Minimum number of items a session must contain before submission.
pub const MIN_SESSION_ITEMS: usize = 20;
/// Minimum number of image-kind items (listing covers are cut from these).
pub const MIN_IMAGE_ITEMS: usize = 4;

/// A single reason the session cannot be submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    NoItems,
    TooFewItems,
    TooFewImages,
    ItemsWithErrors { count: usize },
    ItemsProcessing { count: usize },
    MissingDate,
    MissingLocation,
    MissingSchool,
}

impl Display for BlockReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BlockReason::NoItems => write!(f, "no items added"),
            BlockReason::TooFewItems => write!(f, "fewer than {} items", MIN_SESSION_ITEMS),
            BlockReason::TooFewImages => write!(f, "fewer than {} photos", MIN_IMAGE_ITEMS),
            BlockReason::ItemsWithErrors { count } => {
                write!(f, "{} {} with errors", count, item_word(*count))
            }
            BlockReason::ItemsProcessing { count } => {
                write!(f, "{} {} still processing", count, item_word(*count))
            }
            BlockReason::MissingDate => write!(f, "missing session date"),
            BlockReason::MissingLocation => write!(f, "no location selected"),
            BlockReason::MissingSchool => write!(f, "no school selected"),
        }
    }
}

fn item_word(count: usize) -> &'static str {
    if count == 1 {
        "item"
    } else {
        "items"
    }
}

/// Aggregate readiness evaluator. Submission is allowed iff [`evaluate`]
/// returns an empty list.
///
/// [`evaluate`]: PublishGate::evaluate
pub struct PublishGate;

impl PublishGate {
    pub fn evaluate(draft: &SessionDraft, items: &[UploadItem]) -> Vec<BlockReason> {
        let mut reasons = Vec::new();

        if items.is_empty() {
            reasons.push(BlockReason::NoItems);
        }
        if items.len() < MIN_SESSION_ITEMS {
            reasons.push(BlockReason::TooFewItems);
        }
        let image_count = items.iter().filter(|item| item.is_image()).count();
        if image_count < MIN_IMAGE_ITEMS {
            reasons.push(BlockReason::TooFewImages);
        }
        let error_count = items.iter().filter(|item| item.state.has_error()).count();
        if error_count > 0 {
            reasons.push(BlockReason::ItemsWithErrors { count: error_count });
        }
        let pending_count = items.iter().filter(|item| item.state.is_pending()).count();
        if pending_count > 0 {
            reasons.push(BlockReason::ItemsProcessing {
                count: pending_count,
            });
        }
        if draft.date.is_none() {
            reasons.push(BlockReason::MissingDate);
        }
        match draft.kind {
            SessionKind::FreeSurf => {
                if !matches!(draft.venue, Some(VenueRef::Location { .. })) {
                    reasons.push(BlockReason::MissingLocation);
                }
            }
            SessionKind::Lesson => {
                if !matches!(draft.venue, Some(VenueRef::School { .. })) {
                    reasons.push(BlockReason::MissingSchool);
                }
            }
        }

        reasons
    }

    pub fn can_submit(draft: &SessionDraft, items: &[UploadItem]) -> bool {
        Self::evaluate(draft, items).is_empty()
    }
}
