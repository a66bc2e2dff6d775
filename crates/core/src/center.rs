//! Vaccination centers and their bookable resources.
//!
//! A [`Center`] is what the user asks us to watch. A [`CenterInfo`] is what
//! the booking platform tells us about it on a given run: the visit motives
//! (appointment reasons, e.g. "1re injection vaccin COVID-19 (Pfizer)") and
//! the agendas that can book them.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A center to watch, identified by its booking slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Center {
    /// Booking slug, e.g. `centre-de-vaccination-parc-expo-bruz`.
    pub slug: String,

    /// Public page of the center, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Center {
    pub fn new(slug: impl Into<String>, url: Option<String>) -> Self {
        Self {
            slug: slug.into(),
            url,
        }
    }

    /// Parse a center reference that is either a bare slug or a public URL.
    ///
    /// For URLs the slug is the last path segment, ignoring any query string
    /// or fragment.
    pub fn parse(reference: &str) -> Result<Self, FetchError> {
        let reference = reference.trim();
        if reference.starts_with("http://") || reference.starts_with("https://") {
            let slug = slug_from_url(reference)
                .filter(|s| is_valid_slug(s))
                .ok_or_else(|| FetchError::InvalidCenter(reference.to_string()))?;
            return Ok(Self::new(slug, Some(reference.to_string())));
        }

        if !is_valid_slug(reference) {
            return Err(FetchError::InvalidCenter(reference.to_string()));
        }
        Ok(Self::new(reference, None))
    }
}

impl std::fmt::Display for Center {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug)
    }
}

/// Slugs are a single path segment: ASCII alphanumerics, `-`, `_` and `.`,
/// never `.` or `..`.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn slug_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest)?;
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    // First segment is the host.
    let (_, path) = path.split_once('/')?;
    path.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A bookable appointment reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitMotive {
    pub id: u64,
    pub name: String,
}

/// A calendar that can book a set of visit motives at one practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agenda {
    pub id: u64,
    pub visit_motive_ids: Vec<u64>,
    pub practice_id: u64,
}

impl Agenda {
    /// Whether this agenda books at least one of the given motives.
    pub fn books_any(&self, motive_ids: &[u64]) -> bool {
        self.visit_motive_ids.iter().any(|id| motive_ids.contains(id))
    }
}

/// A physical place of a center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub practice_ids: Vec<u64>,
}

/// Everything the booking platform exposes about a center for one run.
///
/// Never mutated after construction: filtering and place expansion derive
/// new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterInfo {
    pub center_id: u64,
    pub name: String,
    pub visit_motives: Vec<VisitMotive>,
    pub agendas: Vec<Agenda>,
}

impl CenterInfo {
    pub fn motive_ids(&self) -> Vec<u64> {
        self.visit_motives.iter().map(|m| m.id).collect()
    }

    pub fn agenda_ids(&self) -> Vec<u64> {
        self.agendas.iter().map(|a| a.id).collect()
    }

    /// Practice ids in agenda order, one per agenda.
    pub fn practice_ids(&self) -> Vec<u64> {
        self.agendas.iter().map(|a| a.practice_id).collect()
    }

    /// Restrict this center to one place.
    ///
    /// Keeps agendas located at the place, then the motives those agendas
    /// can book.
    pub fn for_place(&self, place: &Place) -> Self {
        let agendas: Vec<Agenda> = self
            .agendas
            .iter()
            .filter(|a| place.practice_ids.contains(&a.practice_id))
            .cloned()
            .collect();
        let visit_motives = self
            .visit_motives
            .iter()
            .filter(|m| agendas.iter().any(|a| a.visit_motive_ids.contains(&m.id)))
            .cloned()
            .collect();

        let name = if place.name.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, place.name)
        };

        Self {
            center_id: self.center_id,
            name,
            visit_motives,
            agendas,
        }
    }
}
