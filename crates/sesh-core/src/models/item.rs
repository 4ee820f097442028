use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Extension used when naming this kind's preview asset. Video previews
    /// keep a video extension even when the generated asset is a still
    /// fallback; the part's real content type travels separately.
    pub fn preview_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

/// A raw file exactly as handed to the ingestion queue.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub bytes: Bytes,
}

impl SourceFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Natural pixel dimensions of a decoded source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Soft failure: the item finished processing and keeps its preview, but
/// falls below a resolution threshold and blocks submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QualityIssue {
    LowResolutionImage { megapixels: f64 },
    LowResolutionVideo { height: u32 },
}

impl Display for QualityIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            QualityIssue::LowResolutionImage { megapixels } => {
                write!(f, "image resolution too low ({:.1} MP)", megapixels)
            }
            QualityIssue::LowResolutionVideo { height } => {
                write!(f, "video resolution too low ({}p)", height)
            }
        }
    }
}

/// Derived preview payload. Image items yield a still; video items normally
/// yield a clip, with a single-frame still standing in when the streaming
/// re-encode is unavailable.
#[derive(Debug, Clone)]
pub enum PreviewAsset {
    Still(Bytes),
    Clip(Bytes),
}

impl PreviewAsset {
    pub fn bytes(&self) -> &Bytes {
        match self {
            PreviewAsset::Still(bytes) | PreviewAsset::Clip(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    pub fn is_clip(&self) -> bool {
        matches!(self, PreviewAsset::Clip(_))
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            PreviewAsset::Still(_) => "image/jpeg",
            PreviewAsset::Clip(_) => "video/mp4",
        }
    }
}

/// Everything a successfully processed item carries.
#[derive(Debug, Clone)]
pub struct ReadyAsset {
    pub preview: PreviewAsset,
    pub dimensions: Dimensions,
    pub quality: Option<QualityIssue>,
}

/// Per-item state machine. Exactly one forward path
/// (`Queued → Processing → Ready | Failed`); no state is re-entered.
#[derive(Debug, Clone)]
pub enum ItemState {
    Queued,
    Processing,
    Ready(ReadyAsset),
    Failed { reason: String },
}

impl ItemState {
    pub fn is_settled(&self) -> bool {
        matches!(self, ItemState::Ready(_) | ItemState::Failed { .. })
    }

    /// Queued and in-flight items both count as unfinished for the gate.
    pub fn is_pending(&self) -> bool {
        !self.is_settled()
    }

    /// True for hard failures and for soft quality failures alike; either
    /// blocks submission.
    pub fn has_error(&self) -> bool {
        match self {
            ItemState::Failed { .. } => true,
            ItemState::Ready(asset) => asset.quality.is_some(),
            _ => false,
        }
    }
}

impl Display for ItemState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ItemState::Queued => write!(f, "queued"),
            ItemState::Processing => write!(f, "processing"),
            ItemState::Ready(_) => write!(f, "ready"),
            ItemState::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// Result of running a preview generator over one item.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Ready(ReadyAsset),
    Failed { reason: String },
}

impl From<ItemOutcome> for ItemState {
    fn from(outcome: ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Ready(asset) => ItemState::Ready(asset),
            ItemOutcome::Failed { reason } => ItemState::Failed { reason },
        }
    }
}

/// One admitted file and its processing state. Created only by batch
/// admission, mutated only by the generator owning its kind, removed only by
/// explicit user action or full reset.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub id: Uuid,
    pub source: SourceFile,
    pub state: ItemState,
    pub added_at: DateTime<Utc>,
}

impl UploadItem {
    pub fn new(source: SourceFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            state: ItemState::Queued,
            added_at: Utc::now(),
        }
    }

    /// An item that failed validation before any processing was scheduled.
    pub fn failed(source: SourceFile, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            state: ItemState::Failed {
                reason: reason.into(),
            },
            added_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.source.kind
    }

    pub fn is_image(&self) -> bool {
        self.source.kind == MediaKind::Image
    }
}
