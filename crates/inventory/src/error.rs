//! Engine error types.
//!
//! The differ never fails; every error here comes from the backend and is
//! wrapped with the context needed to retry the whole pass.

use crate::diff::Phase;
use crate::key::ResourceKey;
use inventory_client::ClientError;
use thiserror::Error;

/// Errors that can occur during a reconciliation pass.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Listing the observed collection failed; nothing was mutated
    #[error("Failed to list {kind} in {selector}: {source}")]
    Listing {
        /// Kind being listed
        kind: String,
        /// Rendered selector the listing used
        selector: String,
        /// Backend error
        #[source]
        source: ClientError,
    },

    /// A create, update or delete failed; later operations were not issued
    #[error("Failed to {phase} {kind} {key}: {source}")]
    Apply {
        /// Phase the failed operation belongs to
        phase: Phase,
        /// Kind of the resource
        kind: String,
        /// Key of the resource
        key: ResourceKey,
        /// Backend error
        #[source]
        source: ClientError,
    },
}

impl InventoryError {
    /// Phase of a failed apply operation (`None` for listing errors).
    pub fn phase(&self) -> Option<Phase> {
        match self {
            InventoryError::Apply { phase, .. } => Some(*phase),
            InventoryError::Listing { .. } => None,
        }
    }

    /// Key of the resource a failed apply operation targeted.
    pub fn key(&self) -> Option<&ResourceKey> {
        match self {
            InventoryError::Apply { key, .. } => Some(key),
            InventoryError::Listing { .. } => None,
        }
    }

    /// The underlying backend error.
    pub fn client_error(&self) -> &ClientError {
        match self {
            InventoryError::Listing { source, .. } | InventoryError::Apply { source, .. } => source,
        }
    }

    /// Where the pass stopped: `list`, `create`, `update` or `delete`.
    pub fn stage(&self) -> &'static str {
        self.phase().map_or("list", Phase::as_str)
    }

    /// Whether retrying the pass may succeed without outside intervention.
    pub fn is_retryable(&self) -> bool {
        self.client_error().is_retryable()
    }
}
