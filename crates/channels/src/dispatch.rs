//! Notification dispatch — routes slot records to subscribers.
//!
//! Each registered target is a notifier plus the set of centers its profile
//! watches (or no set at all for the broadcast target). Only records with
//! availability are dispatched, and a target with nothing to report is not
//! called.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};
use vaxwatch_config::{AppConfig, MailRelayConfig, NotificationProfile, NotifyConfig};
use vaxwatch_core::{Notifier, NotifyError, SlotRecord};

use crate::email::{EmailNotifier, MailTransport, SmtpRelay, SmtpRelayOptions};
use crate::pushbullet::{PushbulletNotifier, PushbulletOptions};

struct Target {
    profile: String,
    /// `None` receives every record.
    centers: Option<HashSet<String>>,
    notifier: Arc<dyn Notifier>,
}

impl Target {
    fn wants(&self, record: &SlotRecord) -> bool {
        self.centers
            .as_ref()
            .is_none_or(|centers| centers.contains(&record.center))
    }
}

/// Outcome of a dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Profiles that were sent something, with the record count.
    pub notified: Vec<(String, usize)>,
}

/// Holds every notification target of a run.
#[derive(Default)]
pub struct Dispatcher {
    targets: Vec<Target>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile watching `centers` (slugs).
    pub fn register_profile(
        &mut self,
        profile: impl Into<String>,
        centers: HashSet<String>,
        notifier: Arc<dyn Notifier>,
    ) {
        let profile = profile.into();
        info!(profile = %profile, notifier = notifier.name(), centers = centers.len(), "Registered profile");
        self.targets.push(Target {
            profile,
            centers: Some(centers),
            notifier,
        });
    }

    /// Register a target receiving every available record.
    pub fn register_broadcast(&mut self, name: impl Into<String>, notifier: Arc<dyn Notifier>) {
        let profile = name.into();
        info!(profile = %profile, notifier = notifier.name(), "Registered broadcast target");
        self.targets.push(Target {
            profile,
            centers: None,
            notifier,
        });
    }

    /// Registered profile names, in registration order.
    pub fn list(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.profile.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Build targets from configuration.
    ///
    /// A profile without usable notification settings is skipped with a
    /// warning. One SMTP relay is built per set of credentials and shared by
    /// the profiles using them.
    pub fn from_config(config: &AppConfig) -> Result<Self, NotifyError> {
        let mut dispatcher = Self::new();
        let mut relays = Relays::default();

        if let Some(notify) = &config.broadcast {
            if let Some(notifier) = build_notifier(config, "broadcast", notify, &mut relays)? {
                dispatcher.register_broadcast("broadcast", notifier);
            }
        }

        for profile in &config.profiles {
            let Some(notify) = &profile.notify else {
                warn!(profile = %profile.name, "Profile has no notification settings, skipping");
                continue;
            };
            if let Some(notifier) = build_notifier(config, &profile.name, notify, &mut relays)? {
                dispatcher.register_profile(&profile.name, profile.center_slugs(), notifier);
            }
        }

        Ok(dispatcher)
    }

    /// Send the available records to every interested target.
    ///
    /// Targets run concurrently; the first delivery failure is returned.
    pub async fn dispatch(&self, records: &[SlotRecord]) -> Result<DispatchReport, NotifyError> {
        let available: Vec<&SlotRecord> = records.iter().filter(|r| r.is_available()).collect();
        if available.is_empty() {
            debug!("No availability, nothing to dispatch");
            return Ok(DispatchReport::default());
        }

        let sends = self.targets.iter().filter_map(|target| {
            let matching: Vec<SlotRecord> = available
                .iter()
                .filter(|r| target.wants(r))
                .map(|r| (*r).clone())
                .collect();
            if matching.is_empty() {
                debug!(profile = %target.profile, "Nothing for this profile");
                return None;
            }
            Some(async move {
                target.notifier.notify(&matching).await?;
                info!(
                    profile = %target.profile,
                    notifier = target.notifier.name(),
                    records = matching.len(),
                    "Profile notified"
                );
                Ok::<_, NotifyError>((target.profile.clone(), matching.len()))
            })
        });

        let notified = try_join_all(sends).await?;
        Ok(DispatchReport { notified })
    }
}

/// SMTP relays built during one `from_config`, one per set of credentials.
#[derive(Default)]
struct Relays {
    entries: Vec<((Option<String>, Option<String>), Arc<dyn MailTransport>)>,
}

impl Relays {
    fn get_or_connect(
        &mut self,
        relay: &MailRelayConfig,
        user: Option<String>,
        password: Option<String>,
    ) -> Result<Arc<dyn MailTransport>, NotifyError> {
        let key = (user, password);
        if let Some((_, transport)) = self.entries.iter().find(|(k, _)| *k == key) {
            return Ok(transport.clone());
        }
        let transport: Arc<dyn MailTransport> = Arc::new(SmtpRelay::new(&SmtpRelayOptions {
            host: relay.host.clone(),
            port: relay.port,
            from: relay.from.clone(),
            starttls: relay.starttls,
            user: key.0.clone(),
            password: key.1.clone(),
        })?);
        self.entries.push((key, transport.clone()));
        Ok(transport)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn build_notifier(
    config: &AppConfig,
    profile: &str,
    notify: &NotifyConfig,
    relays: &mut Relays,
) -> Result<Option<Arc<dyn Notifier>>, NotifyError> {
    match notify {
        NotifyConfig::Pushbullet {
            token,
            exclude_devices,
        } => {
            if token.is_empty() {
                warn!(profile = %profile, "Pushbullet token missing, skipping");
                return Ok(None);
            }
            let notifier = PushbulletNotifier::new(PushbulletOptions {
                token: token.clone(),
                base_url: config.pushbullet.base_url.clone(),
                device_limit: config.pushbullet.device_limit,
                exclude_devices: exclude_devices.clone(),
            })?;
            Ok(Some(Arc::new(notifier)))
        }
        NotifyConfig::Email {
            destinator,
            user,
            password,
        } => {
            let relay = config.mail_relay.as_ref().ok_or_else(|| {
                NotifyError::NotConfigured("email notifications need a [mail_relay]".into())
            })?;
            let (user, password) = match (user, password) {
                (Some(u), Some(p)) => (Some(u.clone()), Some(p.clone())),
                _ => (relay.user.clone(), relay.password.clone()),
            };

            let transport = relays.get_or_connect(relay, user, password)?;
            Ok(Some(Arc::new(EmailNotifier::new(
                profile,
                destinator.clone(),
                transport,
            ))))
        }
        NotifyConfig::Unknown => {
            warn!(profile = %profile, "Unknown notification type, skipping");
            Ok(None)
        }
        NotifyConfig::Invalid { reason } => {
            warn!(profile = %profile, reason = %reason, "Invalid notification settings, skipping");
            Ok(None)
        }
    }
}

/// Profiles from `profiles` that would receive at least one of `records`.
pub fn interested_profiles<'a>(
    profiles: &'a [NotificationProfile],
    records: &[SlotRecord],
) -> Vec<&'a NotificationProfile> {
    profiles
        .iter()
        .filter(|p| {
            let slugs = p.center_slugs();
            records
                .iter()
                .any(|r| r.is_available() && slugs.contains(&r.center))
        })
        .collect()
}
