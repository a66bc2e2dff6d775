//! One pass of vaxwatch: scan every configured center, then notify.
//!
//! There is no loop here. An external scheduler (cron, a serverless timer)
//! calls [`handler`] or [`run_once`] as often as it likes; nothing is kept
//! between runs.

use chrono::NaiveDate;
use tracing::{error, info};
use vaxwatch_booking::{BookingClient, Scanner};
use vaxwatch_channels::{Dispatcher, interested_profiles};
use vaxwatch_config::{AppConfig, ConfigError};
use vaxwatch_core::{Error, Result, SlotRecord};

/// Knobs of a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// First day to look at (tomorrow when `None`).
    pub start_date: Option<NaiveDate>,

    /// Scan, but only log who would be notified.
    pub dry_run: bool,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One record per scanned center or place.
    pub records: Vec<SlotRecord>,

    /// Profiles notified, with their record count.
    pub notified: Vec<(String, usize)>,
}

impl RunReport {
    pub fn available(&self) -> impl Iterator<Item = &SlotRecord> {
        self.records.iter().filter(|r| r.is_available())
    }
}

fn config_error(e: ConfigError) -> Error {
    Error::Config {
        message: e.to_string(),
    }
}

/// Build the scanner described by `config`.
pub fn scanner(config: &AppConfig, start_date: Option<NaiveDate>) -> Result<Scanner> {
    let client = BookingClient::new(&config.booking.base_url, config.booking.limit)?;
    Ok(Scanner::new(client)
        .with_filter(config.filter.to_filter())
        .with_expand_places(config.booking.expand_places)
        .with_start_date(start_date))
}

/// Scan every configured center without notifying anyone.
pub async fn scan(config: &AppConfig, start_date: Option<NaiveDate>) -> Result<Vec<SlotRecord>> {
    let centers = config.centers().map_err(config_error)?;
    if centers.is_empty() {
        info!("No center configured");
        return Ok(Vec::new());
    }
    let records = scanner(config, start_date)?.scan(&centers).await?;
    Ok(records)
}

/// Scan, then notify every interested profile.
pub async fn run_once(config: &AppConfig, options: RunOptions) -> Result<RunReport> {
    let records = scan(config, options.start_date).await?;
    let mut report = RunReport {
        records,
        notified: Vec::new(),
    };

    if report.available().next().is_none() {
        info!("No availability found");
        return Ok(report);
    }

    if options.dry_run {
        for profile in interested_profiles(&config.profiles, &report.records) {
            info!(profile = %profile.name, "Would notify profile (dry run)");
        }
        if config.broadcast.is_some() {
            info!("Would notify broadcast target (dry run)");
        }
        return Ok(report);
    }

    let dispatcher = Dispatcher::from_config(config)?;
    report.notified = dispatcher.dispatch(&report.records).await?.notified;
    Ok(report)
}

/// Entry point for scheduled invocations.
///
/// Loads the default configuration, runs once, and logs the outcome. Errors
/// are logged, never returned.
pub async fn handler() {
    let config = match AppConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load config");
            return;
        }
    };

    match run_once(&config, RunOptions::default()).await {
        Ok(report) => info!(
            scanned = report.records.len(),
            available = report.available().count(),
            notified = report.notified.len(),
            "Run complete"
        ),
        Err(e) => error!(error = %e, "Run failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vaxwatch_config::{CenterConfig, FilterConfig, NotificationProfile, NotifyConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn booking_server(slots: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/booking/a.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
                "profile": {"id": 1, "name_with_title": "A"},
                "visit_motives": [{"id": 1, "name": "Pfizer dose 1"}],
                "agendas": [{"id": 10, "visit_motive_ids": [1], "practice_id": 100}]
            }})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/availabilities.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "availabilities": slots
            })))
            .mount(&server)
            .await;
        server
    }

    fn config(booking: &MockServer, pushbullet: &MockServer) -> AppConfig {
        let mut config = AppConfig {
            filter: FilterConfig {
                name_contains: vec!["pfizer".into()],
                ..FilterConfig::default()
            },
            centers: vec![CenterConfig {
                name: Some("a".into()),
                url: None,
            }],
            profiles: vec![NotificationProfile {
                name: "alice".into(),
                places: vec!["a".into()],
                notify: Some(NotifyConfig::Pushbullet {
                    token: "o.alice".into(),
                    exclude_devices: None,
                }),
            }],
            ..AppConfig::default()
        };
        config.booking.base_url = booking.uri();
        config.pushbullet.base_url = pushbullet.uri();
        config
    }

    #[tokio::test]
    async fn nothing_configured_is_a_noop() {
        let records = scan(&AppConfig::default(), None).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn no_availability_skips_notification() {
        let booking = booking_server(json!([])).await;
        let pushbullet = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&pushbullet)
            .await;

        let report = run_once(&config(&booking, &pushbullet), RunOptions::default())
            .await
            .unwrap();
        assert_eq!(report.records.len(), 1);
        assert!(report.notified.is_empty());
    }

    #[tokio::test]
    async fn dry_run_does_not_notify() {
        let booking = booking_server(json!([{"date": "2021-06-01", "slots": ["09:00"]}])).await;
        let pushbullet = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&pushbullet)
            .await;

        let report = run_once(
            &config(&booking, &pushbullet),
            RunOptions {
                dry_run: true,
                ..RunOptions::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(report.available().count(), 1);
        assert!(report.notified.is_empty());
    }

    #[tokio::test]
    async fn available_slots_are_pushed() {
        let booking = booking_server(json!([{"date": "2021-06-01", "slots": ["09:00"]}])).await;
        let pushbullet = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "devices": [{"iden": "phone", "nickname": "Pixel", "pushable": true}]
            })))
            .mount(&pushbullet)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/pushes"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&pushbullet)
            .await;

        let report = run_once(&config(&booking, &pushbullet), RunOptions::default())
            .await
            .unwrap();
        assert_eq!(report.notified, vec![("alice".to_string(), 1)]);
    }
}
