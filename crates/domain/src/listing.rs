//! Published property listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use roost_core::{AccountId, CoreError, ListingId};

/// Document collection for listings.
pub const COLLECTION: &str = "listings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Awaiting admin approval; removed by the expiry sweep once the
    /// approval deadline passes.
    PendingApproval,
    Approved,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub host: AccountId,
    pub title: String,
    pub status: ListingStatus,
    pub approval_deadline: DateTime<Utc>,
}

impl Listing {
    pub fn new(
        host: AccountId,
        title: impl Into<String>,
        approval_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ListingId::new(),
            host,
            title: title.into(),
            status: ListingStatus::PendingApproval,
            approval_deadline,
        }
    }

    pub fn document(&self) -> JsonValue {
        serde_json::to_value(self).expect("listing serialization is infallible")
    }
}

/// Pre-commit hook: trim the title and reject blank ones.
pub fn normalize_title(doc: &mut JsonValue) -> Result<(), CoreError> {
    let trimmed = match doc.get("title").and_then(JsonValue::as_str) {
        Some(title) => title.trim().to_string(),
        None => return Ok(()),
    };
    if trimmed.is_empty() {
        return Err(CoreError::validation("listing title must not be blank"));
    }
    doc["title"] = JsonValue::String(trimmed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_listings_start_pending() {
        let listing = Listing::new(AccountId::new(), "Harbor Loft", Utc::now());
        assert_eq!(listing.status, ListingStatus::PendingApproval);
    }

    #[test]
    fn normalize_title_trims_and_rejects_blank() {
        let mut doc = json!({"title": "  Harbor Loft  "});
        normalize_title(&mut doc).unwrap();
        assert_eq!(doc["title"], json!("Harbor Loft"));

        let mut blank = json!({"title": "   "});
        assert!(normalize_title(&mut blank).is_err());
    }
}
