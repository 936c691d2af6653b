//! Commerce error types.
//!
//! Cart mutations never fail: malformed input is defaulted and coupon
//! rejections are a coupon state. What remains here are the refusals a caller
//! has to branch on.

use thiserror::Error;

/// Errors that can occur in cart and pricing operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// A required variant attribute has no selected value.
    #[error("Missing selection for required attributes: {}", attributes.join(", "))]
    MissingSelection {
        /// Keys of the unselected required attributes, in product order.
        attributes: Vec<String>,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CommerceError {
    /// Check if this is the missing-selection refusal.
    pub fn is_missing_selection(&self) -> bool {
        matches!(self, CommerceError::MissingSelection { .. })
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
