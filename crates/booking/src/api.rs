//! Wire types of the booking platform's public JSON endpoints.
//!
//! Only the fields we read are modeled; everything else is ignored.

use serde::Deserialize;
use vaxwatch_core::{Agenda, Availability, CenterInfo, Place, VisitMotive};

/// `GET /booking/{slug}.json`
#[derive(Debug, Deserialize)]
pub struct BookingResponse {
    pub data: BookingData,
}

#[derive(Debug, Deserialize)]
pub struct BookingData {
    pub profile: ApiProfile,
    #[serde(default)]
    pub visit_motives: Vec<ApiVisitMotive>,
    #[serde(default)]
    pub agendas: Vec<ApiAgenda>,
    #[serde(default)]
    pub places: Vec<ApiPlace>,
}

#[derive(Debug, Deserialize)]
pub struct ApiProfile {
    pub id: u64,
    pub name_with_title: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiVisitMotive {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiAgenda {
    pub id: u64,
    #[serde(default)]
    pub visit_motive_ids: Vec<u64>,
    /// Null for agendas not attached to a practice (teleconsultation).
    #[serde(default)]
    pub practice_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPlace {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub practice_ids: Vec<u64>,
}

/// `GET /availabilities.json`
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    pub availabilities: Vec<Availability>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl BookingData {
    /// Domain view of the center. Agendas without a practice cannot be
    /// queried for availability and are dropped.
    pub fn center_info(&self) -> CenterInfo {
        CenterInfo {
            center_id: self.profile.id,
            name: self.profile.name_with_title.clone(),
            visit_motives: self
                .visit_motives
                .iter()
                .map(|m| VisitMotive {
                    id: m.id,
                    name: m.name.clone(),
                })
                .collect(),
            agendas: self
                .agendas
                .iter()
                .filter_map(|a| {
                    Some(Agenda {
                        id: a.id,
                        visit_motive_ids: a.visit_motive_ids.clone(),
                        practice_id: a.practice_id?,
                    })
                })
                .collect(),
        }
    }

    pub fn places(&self) -> Vec<Place> {
        self.places
            .iter()
            .map(|p| Place {
                id: p.id.clone(),
                name: p.name.clone().unwrap_or_default(),
                practice_ids: p.practice_ids.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_payload_maps_to_center_info() {
        let json = serde_json::json!({
            "data": {
                "profile": {"id": 5, "name_with_title": "Centre A", "city": "Rennes"},
                "visit_motives": [{"id": 1, "name": "Pfizer dose 1", "ref_visit_motive_id": 6970}],
                "agendas": [
                    {"id": 10, "visit_motive_ids": [1], "practice_id": 100, "booking_disabled": false},
                    {"id": 11, "visit_motive_ids": [1], "practice_id": null}
                ],
                "places": [{"id": "practice-100", "name": "Salle A", "practice_ids": [100]}]
            }
        });
        let resp: BookingResponse = serde_json::from_value(json).unwrap();
        let info = resp.data.center_info();
        assert_eq!(info.center_id, 5);
        assert_eq!(info.name, "Centre A");
        assert_eq!(info.motive_ids(), vec![1]);
        assert_eq!(info.agenda_ids(), vec![10]);
        assert_eq!(resp.data.places()[0].practice_ids, vec![100]);
    }

    #[test]
    fn availability_payload_requires_list() {
        let ok: AvailabilityResponse =
            serde_json::from_str(r#"{"availabilities":[],"total":0}"#).unwrap();
        assert!(ok.availabilities.is_empty());
        assert!(serde_json::from_str::<AvailabilityResponse>(r#"{"total":0}"#).is_err());
    }
}
