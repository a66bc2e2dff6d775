//! Pushbullet notifier.
//!
//! Sends one link push per device per slot record. Devices are listed on
//! every call; only pushable ones are used, minus those whose nickname
//! contains the exclusion pattern (e.g. a home automation box subscribed to
//! the same account).

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vaxwatch_core::message::{availability_text, NOTIFICATION_TITLE};
use vaxwatch_core::{Notifier, NotifyError, SlotRecord};

/// Default Pushbullet API.
pub const PUSHBULLET_URL: &str = "https://api.pushbullet.com";

/// Pushbullet notifier configuration.
#[derive(Clone)]
pub struct PushbulletOptions {
    /// Access token of the account.
    pub token: String,
    /// API base URL.
    pub base_url: String,
    /// `limit` when listing devices.
    pub device_limit: u32,
    /// Skip devices whose nickname contains this.
    pub exclude_devices: Option<String>,
}

impl std::fmt::Debug for PushbulletOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushbulletOptions")
            .field("token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("device_limit", &self.device_limit)
            .field("exclude_devices", &self.exclude_devices)
            .finish()
    }
}

/// A device registered on the account.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub iden: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub pushable: bool,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Debug, Serialize)]
struct LinkPush<'a> {
    r#type: &'static str,
    device_iden: &'a str,
    title: &'a str,
    url: &'a str,
    body: &'a str,
}

/// Pushbullet notifier.
#[derive(Debug)]
pub struct PushbulletNotifier {
    options: PushbulletOptions,
    client: reqwest::Client,
}

impl PushbulletNotifier {
    pub fn new(options: PushbulletOptions) -> Result<Self, NotifyError> {
        if options.token.is_empty() {
            return Err(NotifyError::NotConfigured("Pushbullet token is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| delivery_failed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            options: PushbulletOptions {
                base_url: options.base_url.trim_end_matches('/').to_string(),
                ..options
            },
            client,
        })
    }

    /// List the account's devices.
    pub async fn devices(&self) -> Result<Vec<Device>, NotifyError> {
        let url = format!("{}/v2/devices", self.options.base_url);
        let response = self
            .client
            .get(&url)
            .header("Access-Token", &self.options.token)
            .query(&[
                ("active", "true".to_string()),
                ("limit", self.options.device_limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| delivery_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Pushbullet device listing failed");
            return Err(delivery_failed(format!("device listing returned {status}")));
        }

        let list: DeviceList = response
            .json()
            .await
            .map_err(|e| delivery_failed(format!("Failed to parse device list: {e}")))?;
        Ok(list.devices)
    }

    /// Devices that should receive pushes.
    pub async fn target_devices(&self) -> Result<Vec<Device>, NotifyError> {
        let devices = self.devices().await?;
        let total = devices.len();
        let targets: Vec<Device> = devices
            .into_iter()
            .filter(|d| is_target(d, self.options.exclude_devices.as_deref()))
            .collect();
        debug!(total, targets = targets.len(), "Pushbullet devices");
        Ok(targets)
    }

    /// Push a link to one device.
    pub async fn push_link(
        &self,
        device_iden: &str,
        title: &str,
        url: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let push = LinkPush {
            r#type: "link",
            device_iden,
            title,
            url,
            body,
        };
        let response = self
            .client
            .post(format!("{}/v2/pushes", self.options.base_url))
            .header("Access-Token", &self.options.token)
            .json(&push)
            .send()
            .await
            .map_err(|e| delivery_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), device = %device_iden, body = %body, "Push failed");
            return Err(delivery_failed(format!("push returned {status}")));
        }
        Ok(())
    }
}

fn is_target(device: &Device, exclude: Option<&str>) -> bool {
    if !device.pushable {
        return false;
    }
    match (exclude, device.nickname.as_deref()) {
        (Some(pattern), Some(nickname)) if !pattern.is_empty() => !nickname.contains(pattern),
        _ => true,
    }
}

fn delivery_failed(reason: String) -> NotifyError {
    NotifyError::DeliveryFailed {
        channel: "pushbullet".into(),
        reason,
    }
}

#[async_trait]
impl Notifier for PushbulletNotifier {
    fn name(&self) -> &str {
        "pushbullet"
    }

    async fn notify(&self, records: &[SlotRecord]) -> Result<(), NotifyError> {
        let devices = self.target_devices().await?;
        if devices.is_empty() {
            warn!("No pushable Pushbullet device, nothing sent");
            return Ok(());
        }

        let texts: Vec<String> = records.iter().map(availability_text).collect();
        for (record, text) in records.iter().zip(&texts) {
            info!(url = %record.url, text = %text, "{NOTIFICATION_TITLE}");
        }

        let pushes = records.iter().zip(&texts).flat_map(|(record, text)| {
            devices.iter().map(move |device| {
                self.push_link(&device.iden, NOTIFICATION_TITLE, &record.url, text)
            })
        });
        try_join_all(pushes).await?;
        Ok(())
    }
}
