//! HTTP client for the booking platform.
//!
//! Two endpoints are used:
//! - `/booking/{slug}.json` describes a center (motives, agendas, places)
//! - `/availabilities.json` lists open slots for a set of motives/agendas
//!
//! Every failure is returned to the caller. Nothing is retried.

use chrono::{Days, Local, NaiveDate};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use vaxwatch_core::{Availability, CenterInfo, FetchError, Place};

use crate::api::{AvailabilityResponse, BookingResponse};

/// Default booking platform.
pub const DOCTOLIB_URL: &str = "https://partners.doctolib.fr";

/// Default `limit` of the availability endpoint.
pub const DEFAULT_LIMIT: u32 = 10;

/// A center as published, with its places.
#[derive(Debug, Clone)]
pub struct ResolvedCenter {
    pub info: CenterInfo,
    pub places: Vec<Place>,
}

/// Booking platform client.
#[derive(Debug, Clone)]
pub struct BookingClient {
    base_url: String,
    limit: u32,
    client: reqwest::Client,
}

impl BookingClient {
    /// Create a client for the platform at `base_url`.
    pub fn new(base_url: impl Into<String>, limit: u32) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("vaxwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limit,
            client,
        })
    }

    /// Client for Doctolib with the default limit.
    pub fn doctolib() -> Result<Self, FetchError> {
        Self::new(DOCTOLIB_URL, DEFAULT_LIMIT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public page of a center when none was configured.
    pub fn public_url(&self, slug: &str) -> String {
        format!("{}/{}", self.base_url, slug)
    }

    /// Fetch a center's visit motives, agendas and places.
    pub async fn resolve_center(&self, slug: &str) -> Result<ResolvedCenter, FetchError> {
        let mut url = self.endpoint("booking")?;
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidCenter(self.base_url.clone()))?
            .push(&format!("{slug}.json"));
        let response: BookingResponse = self.get_json(url).await?;
        Ok(ResolvedCenter {
            info: response.data.center_info(),
            places: response.data.places(),
        })
    }

    /// Fetch a center's visit motives and agendas.
    pub async fn resolve(&self, slug: &str) -> Result<CenterInfo, FetchError> {
        Ok(self.resolve_center(slug).await?.info)
    }

    /// First day with open slots, starting at `start_date` (tomorrow when
    /// `None`).
    ///
    /// A center without visit motives has nothing to book: `None` is returned
    /// without calling the platform.
    pub async fn availability(
        &self,
        info: &CenterInfo,
        start_date: Option<NaiveDate>,
    ) -> Result<Option<Availability>, FetchError> {
        if info.visit_motives.is_empty() {
            debug!(center = %info.name, "No visit motive left, skipping availability request");
            return Ok(None);
        }

        let start_date = start_date.unwrap_or_else(tomorrow);
        let mut url = self.endpoint("availabilities.json")?;
        url.query_pairs_mut()
            .append_pair("start_date", &start_date.format("%Y-%m-%d").to_string())
            .append_pair("visit_motive_ids", &join_ids(&info.motive_ids()))
            .append_pair("agenda_ids", &join_ids(&info.agenda_ids()))
            .append_pair("insurance_sector", "public")
            .append_pair("practice_ids", &join_ids(&info.practice_ids()))
            .append_pair("destroy_temporary", "true")
            .append_pair("limit", &self.limit.to_string());

        let response: AvailabilityResponse = self.get_json(url).await?;
        debug!(
            center = %info.name,
            days = response.availabilities.len(),
            total = ?response.total,
            "Availability response"
        );
        Ok(response.availabilities.into_iter().next())
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let raw = format!("{}/{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| FetchError::InvalidCenter(format!("{raw}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "Booking platform returned error");
            return Err(FetchError::Status {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Tomorrow in local time.
pub fn tomorrow() -> NaiveDate {
    let today = Local::now().date_naive();
    today.checked_add_days(Days::new(1)).unwrap_or(today)
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join("-")
}
