//! Accounts and their role-specific profiles.
//!
//! Hosts and guests share a base shape and diverge in a tagged `profile`
//! variant with a `kind` discriminant, not subclassing. Shared validation
//! runs before the variant-specific handler.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use roost_core::{AccountId, CoreError};

/// Document collection for accounts.
pub const COLLECTION: &str = "accounts";

/// Role-specific account data, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountProfile {
    Host { payout_account: String },
    Guest { phone: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub profile: AccountProfile,
}

impl Account {
    pub fn host(email: impl Into<String>, payout_account: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(),
            email: email.into(),
            profile: AccountProfile::Host {
                payout_account: payout_account.into(),
            },
        }
    }

    pub fn guest(email: impl Into<String>, phone: Option<String>) -> Self {
        Self {
            id: AccountId::new(),
            email: email.into(),
            profile: AccountProfile::Guest { phone },
        }
    }

    /// Validate the base shape, then the variant.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_base(self)?;
        match &self.profile {
            AccountProfile::Host { payout_account } => {
                if payout_account.trim().is_empty() {
                    return Err(CoreError::validation("host payout account is required"));
                }
            }
            AccountProfile::Guest { phone } => {
                if let Some(phone) = phone {
                    if phone.trim().is_empty() {
                        return Err(CoreError::validation("guest phone must not be blank"));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn document(&self) -> JsonValue {
        serde_json::to_value(self).expect("account serialization is infallible")
    }
}

fn validate_base(account: &Account) -> Result<(), CoreError> {
    if !account.email.contains('@') {
        return Err(CoreError::validation("email must contain '@'"));
    }
    Ok(())
}

/// Pre-commit hook: lowercase and trim the email field.
pub fn normalize_email(doc: &mut JsonValue) -> Result<(), CoreError> {
    let normalized = match doc.get("email").and_then(JsonValue::as_str) {
        Some(email) => email.trim().to_lowercase(),
        None => return Ok(()),
    };
    doc["email"] = JsonValue::String(normalized);
    Ok(())
}
