//! Slot aggregation across centers.
//!
//! For each center: resolve, filter motives, query availability, and turn the
//! result into a [`SlotRecord`]. Centers are scanned concurrently; they share
//! nothing but the HTTP client.

use chrono::NaiveDate;
use futures::future::try_join_all;
use tracing::{debug, info};
use vaxwatch_core::{filter, Center, CenterInfo, FetchError, MotiveFilter, SlotRecord};

use crate::client::BookingClient;

/// Runs the resolve -> filter -> fetch pipeline over a set of centers.
#[derive(Debug, Clone)]
pub struct Scanner {
    client: BookingClient,
    filter: Option<MotiveFilter>,
    expand_places: bool,
    start_date: Option<NaiveDate>,
}

impl Scanner {
    pub fn new(client: BookingClient) -> Self {
        Self {
            client,
            filter: None,
            expand_places: false,
            start_date: None,
        }
    }

    /// Only watch the visit motives matching `filter`.
    pub fn with_filter(mut self, filter: Option<MotiveFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Scan each place of a multi-place center as its own center.
    pub fn with_expand_places(mut self, expand: bool) -> Self {
        self.expand_places = expand;
        self
    }

    /// Look for slots from this date on instead of tomorrow.
    pub fn with_start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = date;
        self
    }

    /// Scan every center. The first failure aborts the scan.
    ///
    /// Records come back in input order, places of a center next to each
    /// other.
    pub async fn scan(&self, centers: &[Center]) -> Result<Vec<SlotRecord>, FetchError> {
        let per_center = try_join_all(centers.iter().map(|c| self.scan_center(c))).await?;
        let records: Vec<SlotRecord> = per_center.into_iter().flatten().collect();
        info!(
            centers = centers.len(),
            records = records.len(),
            available = records.iter().filter(|r| r.is_available()).count(),
            "Scan complete"
        );
        Ok(records)
    }

    /// Scan one center: one record, or one per place when expanding.
    pub async fn scan_center(&self, center: &Center) -> Result<Vec<SlotRecord>, FetchError> {
        let resolved = self.client.resolve_center(&center.slug).await?;
        let url = center
            .url
            .clone()
            .unwrap_or_else(|| self.client.public_url(&center.slug));

        let targets: Vec<(CenterInfo, String)> =
            if self.expand_places && !resolved.places.is_empty() {
                resolved
                    .places
                    .iter()
                    .map(|place| {
                        let separator = if url.contains('?') { '&' } else { '?' };
                        (
                            resolved.info.for_place(place),
                            format!("{url}{separator}pid={}", place.id),
                        )
                    })
                    .collect()
            } else {
                vec![(resolved.info, url)]
            };

        try_join_all(
            targets
                .into_iter()
                .map(|(info, url)| async move { self.scan_info(&center.slug, &info, url).await }),
        )
        .await
    }

    async fn scan_info(
        &self,
        slug: &str,
        info: &CenterInfo,
        url: String,
    ) -> Result<SlotRecord, FetchError> {
        let filtered = filter::apply(info, self.filter.as_ref());
        debug!(
            center = %slug,
            motives = filtered.visit_motives.len(),
            agendas = filtered.agendas.len(),
            "Filtered center"
        );

        let availability = self.client.availability(&filtered, self.start_date).await?;
        let record =
            SlotRecord::from_availability(slug, &filtered.name, url, availability.as_ref());
        info!(
            center = %slug,
            available = record.available,
            when = %record.when,
            "Center scanned"
        );
        Ok(record)
    }
}
