//! Booked property tours.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use roost_core::{AccountId, ListingId, TourId};

/// Document collection for tours.
pub const COLLECTION: &str = "tours";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourStatus {
    /// Booked, payment not yet approved.
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub id: TourId,
    pub listing_id: ListingId,
    pub guest: AccountId,
    pub scheduled_at: DateTime<Utc>,
    pub status: TourStatus,
    /// Payment provider reference; doubles as the idempotency key for the
    /// approval event.
    pub payment_ref: Option<String>,
}

impl Tour {
    pub fn new(listing_id: ListingId, guest: AccountId, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: TourId::new(),
            listing_id,
            guest,
            scheduled_at,
            status: TourStatus::Pending,
            payment_ref: None,
        }
    }

    pub fn document(&self) -> JsonValue {
        serde_json::to_value(self).expect("tour serialization is infallible")
    }
}
