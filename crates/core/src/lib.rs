//! # vaxwatch core
//!
//! Domain types, traits, and error definitions for vaxwatch.
//! This crate has **no I/O** — it defines the domain model that the
//! booking client, notifiers and runner implement against.
//!
//! ## Layout
//!
//! - [`center`]: centers, visit motives, agendas, places
//! - [`availability`]: open slots and per-center scan records
//! - [`filter`]: the visit motive predicate and its application
//! - [`message`]: notification texts
//! - [`notifier`]: the delivery trait

pub mod availability;
pub mod center;
pub mod error;
pub mod filter;
pub mod message;
pub mod notifier;

// Re-export key types at crate root for ergonomics
pub use availability::{Availability, Slot, SlotRecord};
pub use center::{Agenda, Center, CenterInfo, Place, VisitMotive};
pub use error::{Error, FetchError, NotifyError, Result};
pub use filter::MotiveFilter;
pub use notifier::Notifier;
