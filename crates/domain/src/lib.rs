//! `roost-domain` — minimal entity shapes for the platform services.
//!
//! Deliberately thin: just the fields the reliability core's consumers
//! (routes, sweeps, event consumers) read and write.

pub mod account;
pub mod listing;
pub mod tour;

pub use account::{Account, AccountProfile};
pub use listing::{Listing, ListingStatus};
pub use tour::{Tour, TourStatus};
