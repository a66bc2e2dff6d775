//! Notifier trait: the abstraction over delivery mechanisms.
//!
//! A Notifier delivers slot records to one subscriber through one medium
//! (Pushbullet devices, an email inbox, ...).

use async_trait::async_trait;

use crate::availability::SlotRecord;
use crate::error::NotifyError;

/// The core Notifier trait.
///
/// Implementations decide how records are grouped: one push per record,
/// one email for all of them, etc. Callers only pass records that have
/// availability.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable notifier name (e.g., "pushbullet", "email").
    fn name(&self) -> &str;

    /// Deliver the records.
    async fn notify(&self, records: &[SlotRecord]) -> Result<(), NotifyError>;
}
