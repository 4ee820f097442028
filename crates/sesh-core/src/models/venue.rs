use serde::{Deserialize, Serialize};

/// One entry of the venue directory. Locations (surf spots) and surf
/// schools share the same shape and are listed by separate endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
}
