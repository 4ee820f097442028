use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    FreeSurf,
    Lesson,
}

impl Display for SessionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SessionKind::FreeSurf => write!(f, "freeSurf"),
            SessionKind::Lesson => write!(f, "lesson"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "freeSurf" => Ok(SessionKind::FreeSurf),
            "lesson" => Ok(SessionKind::Lesson),
            _ => Err(anyhow::anyhow!("Invalid session kind: {}", s)),
        }
    }
}

/// Where the session took place. Free surf sessions reference a spot from
/// the location directory, lessons reference a surf school; the two are
/// mutually exclusive by session kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VenueRef {
    Location { id: String },
    School { id: String },
}

impl VenueRef {
    pub fn id(&self) -> &str {
        match self {
            VenueRef::Location { id } | VenueRef::School { id } => id,
        }
    }

    pub fn matches_kind(&self, kind: SessionKind) -> bool {
        matches!(
            (self, kind),
            (VenueRef::Location { .. }, SessionKind::FreeSurf)
                | (VenueRef::School { .. }, SessionKind::Lesson)
        )
    }
}

/// Scalar metadata of the session being drafted. The item list itself is
/// owned by the ingestion queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDraft {
    pub kind: SessionKind,
    pub venue: Option<VenueRef>,
    pub date: Option<NaiveDate>,
    pub start_hour: Option<u8>,
    pub end_hour: Option<u8>,
    pub photo_price: Decimal,
    pub video_price: Decimal,
}

impl SessionDraft {
    pub fn new(kind: SessionKind) -> Self {
        Self {
            kind,
            venue: None,
            date: None,
            start_hour: None,
            end_hour: None,
            photo_price: Decimal::ZERO,
            video_price: Decimal::ZERO,
        }
    }
}

/// Wire format for session hours: `9` becomes `"9:00"`, `17` becomes
/// `"17:00"`.
pub fn hour_label(hour: u8) -> String {
    format!("{}:00", hour)
}
