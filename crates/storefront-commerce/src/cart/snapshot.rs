//! Persisted cart shape.
//!
//! Snapshots are read back from storage written by any past release, so the
//! coupon slot accepts both the current record form and a bare code string.

use crate::cart::coupon::REASON_INVALID;
use crate::cart::{CouponState, PersistedLine};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// `{items, coupon}` as stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CartSnapshot {
    pub items: Vec<PersistedLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<PersistedCoupon>,
}

impl CartSnapshot {
    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self, crate::CommerceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, crate::CommerceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The persisted coupon slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistedCoupon {
    /// Older releases stored only the applied code.
    Code(String),
    Record(CouponRecord),
}

/// Current coupon record form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CouponRecord {
    pub status: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_base: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl PersistedCoupon {
    /// Persisted form of a coupon state. `None` for an empty slot.
    pub fn from_state(state: &CouponState) -> Option<Self> {
        let record = match state {
            CouponState::None => return None,
            CouponState::Pending { code } => CouponRecord {
                status: state.status().to_string(),
                code: code.clone(),
                ..Default::default()
            },
            CouponState::Applied {
                code,
                discount,
                meta,
            } => CouponRecord {
                status: state.status().to_string(),
                code: code.clone(),
                discount_base: Some(discount.to_decimal()),
                meta: meta.clone(),
                ..Default::default()
            },
            CouponState::Invalid { code, reason } => CouponRecord {
                status: state.status().to_string(),
                code: code.clone(),
                reason: Some(reason.clone()),
                ..Default::default()
            },
        };
        Some(PersistedCoupon::Record(record))
    }

    /// Restore a coupon state.
    ///
    /// A bare code, or a check that was still pending when the cart was
    /// saved, comes back as applied with a zero discount. A blank code or
    /// an unknown status restores an empty slot.
    pub fn into_state(self) -> CouponState {
        match self {
            PersistedCoupon::Code(code) => applied_without_discount(code),
            PersistedCoupon::Record(record) => {
                let code = record.code.trim().to_string();
                if code.is_empty() {
                    return CouponState::None;
                }
                match record.status.to_ascii_lowercase().as_str() {
                    "applied" => CouponState::Applied {
                        code,
                        discount: record
                            .discount_base
                            .map(Money::from_decimal)
                            .unwrap_or_default()
                            .non_negative(),
                        meta: record.meta,
                    },
                    "pending" => applied_without_discount(code),
                    "invalid" => CouponState::Invalid {
                        code,
                        reason: record
                            .reason
                            .unwrap_or_else(|| REASON_INVALID.to_string()),
                    },
                    _ => CouponState::None,
                }
            }
        }
    }
}

fn applied_without_discount(code: String) -> CouponState {
    let code = code.trim().to_string();
    if code.is_empty() {
        return CouponState::None;
    }
    CouponState::Applied {
        code,
        discount: Money::zero(),
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_string_coupon() {
        let snapshot: CartSnapshot =
            serde_json::from_str(r#"{"items": [], "coupon": "SAVE10"}"#).unwrap();
        let state = snapshot.coupon.unwrap().into_state();
        assert_eq!(
            state,
            CouponState::Applied {
                code: "SAVE10".into(),
                discount: Money::zero(),
                meta: None
            }
        );
    }

    #[test]
    fn test_record_coupon_round_trip() {
        let state = CouponState::Applied {
            code: "SAVE10".into(),
            discount: Money::new(1000),
            meta: Some(serde_json::json!({"label": "10 off"})),
        };
        let persisted = PersistedCoupon::from_state(&state).unwrap();
        let json = serde_json::to_string(&persisted).unwrap();
        let back: PersistedCoupon = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_state(), state);
    }

    #[test]
    fn test_invalid_and_empty_slots() {
        let invalid = CouponState::Invalid {
            code: "OLD".into(),
            reason: "EXPIRED".into(),
        };
        let restored = PersistedCoupon::from_state(&invalid).unwrap().into_state();
        assert_eq!(restored, invalid);

        assert_eq!(PersistedCoupon::from_state(&CouponState::None), None);
        assert_eq!(PersistedCoupon::Code("  ".into()).into_state(), CouponState::None);
    }

    #[test]
    fn test_missing_fields_default() {
        let snapshot = CartSnapshot::from_json("{}").unwrap();
        assert!(snapshot.items.is_empty());
        assert!(snapshot.coupon.is_none());

        assert!(CartSnapshot::from_json("not json").is_err());
    }
}
