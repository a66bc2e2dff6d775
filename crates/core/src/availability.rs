//! Open appointment slots.

use serde::{Deserialize, Serialize};

/// A single offered appointment time.
///
/// The availability endpoint usually sends plain timestamps, but some
/// practices return an object carrying the timestamp in `start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Slot {
    Time(String),
    Detailed { start_date: String },
}

impl Slot {
    pub fn start(&self) -> &str {
        match self {
            Slot::Time(t) => t,
            Slot::Detailed { start_date } => start_date,
        }
    }
}

/// The first day with open slots for a center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

/// Scan result for one center (or one place of a center).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    /// Booking slug of the center.
    pub center: String,

    /// Display name.
    pub name: String,

    /// Public booking page.
    pub url: String,

    /// Number of open slots on `when`.
    pub available: usize,

    /// Date of the first open slots, empty when nothing is available.
    pub when: String,
}

impl SlotRecord {
    /// Build a record from an optional availability.
    pub fn from_availability(
        center: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        availability: Option<&Availability>,
    ) -> Self {
        Self {
            center: center.into(),
            name: name.into(),
            url: url.into(),
            available: availability.map_or(0, |a| a.slots.len()),
            when: availability.map(|a| a.date.clone()).unwrap_or_default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available > 0
    }
}
