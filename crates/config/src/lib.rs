//! Configuration loading, validation, and management for vaxwatch.
//!
//! Loads configuration from `~/.vaxwatch/config.toml` (or an explicit path)
//! with environment variable overrides. Notification profiles can live inline
//! or in an external JSON file referenced by `profiles_path`. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use vaxwatch_core::{Center, MotiveFilter};

/// The root configuration structure.
///
/// Maps directly to `~/.vaxwatch/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Booking platform settings
    #[serde(default)]
    pub booking: BookingConfig,

    /// Which visit motives to watch
    #[serde(default)]
    pub filter: FilterConfig,

    /// Static list of centers to watch
    #[serde(default)]
    pub centers: Vec<CenterConfig>,

    /// Notification profiles (subscribers)
    #[serde(default)]
    pub profiles: Vec<NotificationProfile>,

    /// External JSON file holding more profiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_path: Option<PathBuf>,

    /// Pushbullet API settings
    #[serde(default)]
    pub pushbullet: PushbulletApiConfig,

    /// Outbound SMTP relay for email profiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_relay: Option<MailRelayConfig>,

    /// Target notified of every open slot, regardless of profiles
    #[serde(
        default,
        deserialize_with = "lenient_notify",
        skip_serializing_if = "Option::is_none"
    )]
    pub broadcast: Option<NotifyConfig>,
}

fn default_booking_url() -> String {
    "https://partners.doctolib.fr".into()
}
fn default_limit() -> u32 {
    10
}
fn default_pushbullet_url() -> String {
    "https://api.pushbullet.com".into()
}
fn default_device_limit() -> u32 {
    20
}
fn default_smtp_port() -> u16 {
    587
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Base URL of the booking platform
    #[serde(default = "default_booking_url")]
    pub base_url: String,

    /// `limit` query parameter of the availability endpoint
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Scan each place of a multi-place center separately
    #[serde(default)]
    pub expand_places: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            base_url: default_booking_url(),
            limit: default_limit(),
            expand_places: false,
        }
    }
}

/// Visit motive selection.
///
/// A motive is kept when it matches any `name_contains` entry or any
/// `motive_ids` entry (an empty list does not constrain), and matches no
/// `exclude_names` entry. All name matching is case-insensitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub name_contains: Vec<String>,

    #[serde(default)]
    pub motive_ids: Vec<u64>,

    #[serde(default)]
    pub exclude_names: Vec<String>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.name_contains.is_empty() && self.motive_ids.is_empty() && self.exclude_names.is_empty()
    }

    /// Build the motive predicate, or `None` to keep every motive.
    pub fn to_filter(&self) -> Option<MotiveFilter> {
        if self.is_empty() {
            return None;
        }

        let include = match (self.name_contains.is_empty(), self.motive_ids.is_empty()) {
            (true, true) => MotiveFilter::any(),
            (false, true) => MotiveFilter::name_contains_any(self.name_contains.clone()),
            (true, false) => MotiveFilter::ids(self.motive_ids.clone()),
            (false, false) => MotiveFilter::name_contains_any(self.name_contains.clone())
                .or(MotiveFilter::ids(self.motive_ids.clone())),
        };

        if self.exclude_names.is_empty() {
            Some(include)
        } else {
            Some(include.and(MotiveFilter::name_contains_any(self.exclude_names.clone()).not()))
        }
    }
}

/// A statically configured center: a slug, a public URL, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CenterConfig {
    /// Booking slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Public page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CenterConfig {
    pub fn to_center(&self) -> Result<Center, ConfigError> {
        let invalid = |reason: String| ConfigError::ValidationError(reason);
        match (&self.name, &self.url) {
            (Some(name), url) if !name.trim().is_empty() => {
                let mut center = Center::parse(name).map_err(|e| invalid(e.to_string()))?;
                center.url = url.clone().or(center.url);
                Ok(center)
            }
            (_, Some(url)) => Center::parse(url).map_err(|e| invalid(e.to_string())),
            _ => Err(invalid("center needs a name or a url".into())),
        }
    }
}

/// A subscriber: which centers they care about and how to reach them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationProfile {
    pub name: String,

    /// Center slugs or public URLs
    #[serde(default)]
    pub places: Vec<String>,

    #[serde(
        default,
        deserialize_with = "lenient_notify",
        skip_serializing_if = "Option::is_none"
    )]
    pub notify: Option<NotifyConfig>,
}

impl NotificationProfile {
    /// Slugs of the profile's centers. Unparseable entries are skipped.
    pub fn center_slugs(&self) -> HashSet<String> {
        self.places
            .iter()
            .filter_map(|p| match Center::parse(p) {
                Ok(c) => Some(c.slug),
                Err(e) => {
                    tracing::warn!(profile = %self.name, error = %e, "Ignoring invalid place");
                    None
                }
            })
            .collect()
    }
}

/// How to reach a subscriber.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyConfig {
    Pushbullet {
        #[serde(default)]
        token: String,
        /// Devices whose nickname contains this are skipped
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclude_devices: Option<String>,
    },
    Email {
        destinator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    /// A section that could not be decoded; skipped at dispatch time
    #[serde(skip)]
    Invalid { reason: String },
    /// Any other `type`; the profile is skipped at dispatch time
    #[serde(other)]
    Unknown,
}

/// Decode a notify section without failing the whole config: anything that
/// does not decode becomes [`NotifyConfig::Invalid`].
fn lenient_notify<'de, D>(deserializer: D) -> Result<Option<NotifyConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_value(value).unwrap_or_else(|e| {
        NotifyConfig::Invalid {
            reason: e.to_string(),
        }
    })))
}

impl NotifyConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyConfig::Pushbullet { .. } => "pushbullet",
            NotifyConfig::Email { .. } => "email",
            NotifyConfig::Unknown => "unknown",
            NotifyConfig::Invalid { .. } => "invalid",
        }
    }
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyConfig::Pushbullet {
                token,
                exclude_devices,
            } => f
                .debug_struct("Pushbullet")
                .field("token", &redact(&Some(token.clone()).filter(|t| !t.is_empty())))
                .field("exclude_devices", exclude_devices)
                .finish(),
            NotifyConfig::Email {
                destinator,
                user,
                password,
            } => f
                .debug_struct("Email")
                .field("destinator", destinator)
                .field("user", user)
                .field("password", &redact(password))
                .finish(),
            NotifyConfig::Unknown => f.write_str("Unknown"),
            NotifyConfig::Invalid { reason } => {
                f.debug_struct("Invalid").field("reason", reason).finish()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushbulletApiConfig {
    #[serde(default = "default_pushbullet_url")]
    pub base_url: String,

    /// `limit` when listing devices
    #[serde(default = "default_device_limit")]
    pub device_limit: u32,
}

impl Default for PushbulletApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_pushbullet_url(),
            device_limit: default_device_limit(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MailRelayConfig {
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Sender address
    pub from: String,

    /// Upgrade the connection with STARTTLS (plain connection when false)
    #[serde(default = "default_true")]
    pub starttls: bool,

    /// Relay credentials, used when a profile brings none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for MailRelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailRelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from)
            .field("starttls", &self.starttls)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the default path
    /// (`~/.vaxwatch/config.toml`) when `None`.
    ///
    /// Environment variable overrides:
    /// - `VAXWATCH_BOOKING_URL` replaces `booking.base_url`
    /// - `VAXWATCH_PUSHBULLET_TOKEN` fills Pushbullet tokens left empty
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);
        let mut config = Self::load_from(&config_path)?;

        if let Ok(url) = std::env::var("VAXWATCH_BOOKING_URL") {
            config.booking.base_url = url;
        }

        if let Ok(token) = std::env::var("VAXWATCH_PUSHBULLET_TOKEN") {
            config.fill_pushbullet_token(&token);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(profiles_path) = &config.profiles_path {
            let profiles_path = match path.parent() {
                Some(dir) if profiles_path.is_relative() => dir.join(profiles_path),
                _ => profiles_path.clone(),
            };
            let external = load_profiles(&profiles_path)?;
            tracing::debug!(
                count = external.len(),
                path = %profiles_path.display(),
                "Loaded external profiles"
            );
            config.profiles.extend(external);
        }

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vaxwatch")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.booking.limit == 0 {
            return Err(ConfigError::ValidationError(
                "booking.limit must be > 0".into(),
            ));
        }

        if self.pushbullet.device_limit == 0 {
            return Err(ConfigError::ValidationError(
                "pushbullet.device_limit must be > 0".into(),
            ));
        }

        for center in &self.centers {
            center.to_center()?;
        }

        let wants_email = self
            .profiles
            .iter()
            .filter_map(|p| p.notify.as_ref())
            .chain(self.broadcast.as_ref())
            .any(|n| matches!(n, NotifyConfig::Email { .. }));
        if wants_email && self.mail_relay.is_none() {
            return Err(ConfigError::ValidationError(
                "email notifications require a [mail_relay] section".into(),
            ));
        }

        Ok(())
    }

    /// Every center to scan: the static list first, then the places named
    /// by profiles. Deduplicated by slug, first occurrence wins.
    pub fn centers(&self) -> Result<Vec<Center>, ConfigError> {
        let mut seen = HashSet::new();
        let mut centers = Vec::new();

        for configured in &self.centers {
            let center = configured.to_center()?;
            if seen.insert(center.slug.clone()) {
                centers.push(center);
            } else {
                tracing::debug!(center = %center.slug, "Skipping duplicate center");
            }
        }

        for profile in &self.profiles {
            for place in &profile.places {
                let Ok(center) = Center::parse(place) else {
                    continue;
                };
                if seen.insert(center.slug.clone()) {
                    centers.push(center);
                }
            }
        }

        Ok(centers)
    }

    fn fill_pushbullet_token(&mut self, token: &str) {
        let targets = self
            .profiles
            .iter_mut()
            .filter_map(|p| p.notify.as_mut())
            .chain(self.broadcast.as_mut());
        for notify in targets {
            if let NotifyConfig::Pushbullet { token: t, .. } = notify {
                if t.is_empty() {
                    *t = token.to_string();
                }
            }
        }
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self {
            filter: FilterConfig {
                name_contains: vec!["pfizer".into()],
                ..FilterConfig::default()
            },
            centers: vec![CenterConfig {
                name: Some("centre-de-vaccination-parc-expo-bruz".into()),
                url: Some(
                    "https://partners.doctolib.fr/centre-de-sante/bruz/centre-de-vaccination-parc-expo-bruz"
                        .into(),
                ),
            }],
            broadcast: Some(NotifyConfig::Pushbullet {
                token: String::new(),
                exclude_devices: None,
            }),
            ..Self::default()
        };
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Read a JSON array of profiles.
pub fn load_profiles(path: &Path) -> Result<Vec<NotificationProfile>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
