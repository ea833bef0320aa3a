//! Ordered store operations forming one atomic mutation.

use serde_json::Value as JsonValue;
use uuid::Uuid;

/// One step of a domain mutation.
///
/// Steps are applied in order inside a single transaction. `Update` and
/// `Delete` of a missing document abort the whole mutation with `NotFound`;
/// there are no partial writes.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationStep {
    Insert {
        collection: &'static str,
        id: Uuid,
        document: JsonValue,
    },
    Update {
        collection: &'static str,
        id: Uuid,
        document: JsonValue,
    },
    Delete {
        collection: &'static str,
        id: Uuid,
    },
}

impl MutationStep {
    pub fn insert(collection: &'static str, id: Uuid, document: JsonValue) -> Self {
        Self::Insert {
            collection,
            id,
            document,
        }
    }

    pub fn update(collection: &'static str, id: Uuid, document: JsonValue) -> Self {
        Self::Update {
            collection,
            id,
            document,
        }
    }

    pub fn delete(collection: &'static str, id: Uuid) -> Self {
        Self::Delete { collection, id }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            Self::Insert { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Insert { id, .. } | Self::Update { id, .. } | Self::Delete { id, .. } => *id,
        }
    }

    /// The document body this step writes, if any.
    ///
    /// Pre-commit hooks run over these before the transaction opens.
    pub fn document_mut(&mut self) -> Option<&mut JsonValue> {
        match self {
            Self::Insert { document, .. } | Self::Update { document, .. } => Some(document),
            Self::Delete { .. } => None,
        }
    }
}
