//! Booking platform access for vaxwatch.
//!
//! - [`client`] talks to the platform's public JSON endpoints
//! - [`scan`] runs resolve -> filter -> fetch over many centers
//! - [`api`] holds the wire types

pub mod api;
pub mod client;
pub mod scan;

pub use client::{BookingClient, ResolvedCenter, DOCTOLIB_URL, DEFAULT_LIMIT};
pub use scan::Scanner;
