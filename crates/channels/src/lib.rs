//! Notification channels for vaxwatch.
//!
//! Each notifier delivers slot records to one subscriber. Notifiers are
//! trait-based and the dispatcher routes records to them per profile.
//!
//! Available notifiers:
//! - **Pushbullet** — one link push per device per record
//! - **Email** — one plain-text message per profile, via an SMTP relay
//! - **Dispatcher** — builds notifiers from configuration and routes records

pub mod dispatch;
pub mod email;
pub mod pushbullet;

pub use dispatch::{DispatchReport, Dispatcher, interested_profiles};
pub use email::{EmailNotifier, MailTransport, SmtpRelay, SmtpRelayOptions};
pub use pushbullet::{Device, PushbulletNotifier, PushbulletOptions, PUSHBULLET_URL};
