//! Coupon state and the validation exchange.
//!
//! A coupon check is a request/response pair tagged with a generation number.
//! The store only accepts a response whose generation is the latest it issued,
//! so a slow answer to an old code can never overwrite a newer one.

use crate::cart::OrderLine;
use crate::ids::ProductId;
use crate::money::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reason used when the transport answered with a non-2xx status or a body
/// that is not valid JSON.
pub const REASON_HTTP_FAIL: &str = "HTTP_FAIL";

/// Reason used when the validator could not be reached at all.
pub const REASON_NETWORK: &str = "NETWORK";

/// Reason used when a rejection carries no reason of its own.
pub const REASON_INVALID: &str = "INVALID";

/// The single coupon slot of a cart.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CouponState {
    /// No coupon.
    #[default]
    None,
    /// A check for this code is in flight.
    Pending { code: String },
    /// The code was accepted.
    Applied {
        code: String,
        #[serde(rename = "discountBase")]
        discount: Money,
        #[serde(skip_serializing_if = "Option::is_none")]
        meta: Option<serde_json::Value>,
    },
    /// The code was rejected. Contributes no discount.
    Invalid { code: String, reason: String },
}

impl CouponState {
    /// Interpret a validator response for `code`.
    ///
    /// Only an `ok` response with a positive, finite discount applies the code.
    pub fn from_response(code: impl Into<String>, response: &CouponResponse) -> Self {
        let code = code.into();
        let discount = response
            .discount_base
            .filter(|d| d.is_finite())
            .map(Money::from_decimal)
            .filter(Money::is_positive);

        match (response.ok, discount) {
            (true, Some(discount)) => CouponState::Applied {
                code,
                discount,
                meta: response.coupon.clone(),
            },
            _ => CouponState::Invalid {
                code,
                reason: response
                    .reason
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| REASON_INVALID.to_string()),
            },
        }
    }

    /// The code occupying the slot, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            CouponState::None => None,
            CouponState::Pending { code }
            | CouponState::Applied { code, .. }
            | CouponState::Invalid { code, .. } => Some(code),
        }
    }

    /// Discount this state contributes to totals.
    pub fn discount(&self) -> Money {
        match self {
            CouponState::Applied { discount, .. } => discount.non_negative(),
            _ => Money::zero(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CouponState::None)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CouponState::Pending { .. })
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, CouponState::Applied { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, CouponState::Invalid { .. })
    }

    /// Lowercase status name, as persisted.
    pub fn status(&self) -> &'static str {
        match self {
            CouponState::None => "none",
            CouponState::Pending { .. } => "pending",
            CouponState::Applied { .. } => "applied",
            CouponState::Invalid { .. } => "invalid",
        }
    }
}

/// A cart line reduced to what the validator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponLine {
    pub product_id: ProductId,
    pub qty: u32,
    pub price_base: f64,
}

impl From<&OrderLine> for CouponLine {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id().clone(),
            qty: line.qty(),
            price_base: line.unit_price().to_decimal(),
        }
    }
}

/// A coupon check as sent to the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponRequest {
    /// Generation the store issued this request under. Not sent on the wire.
    #[serde(skip)]
    pub generation: u64,
    pub code: String,
    pub lines: Vec<CouponLine>,
}

impl CouponRequest {
    pub fn new(generation: u64, code: impl Into<String>, lines: &[OrderLine]) -> Self {
        Self {
            generation,
            code: code.into(),
            lines: lines.iter().map(CouponLine::from).collect(),
        }
    }
}

/// Validator answer: `{ok, discountBase?, reason?, coupon?}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CouponResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_base: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Opaque coupon metadata echoed back by the validator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<serde_json::Value>,
}

impl CouponResponse {
    /// An accepting response.
    pub fn accepted(discount_base: f64) -> Self {
        Self {
            ok: true,
            discount_base: Some(discount_base),
            ..Default::default()
        }
    }

    /// A rejecting response.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Synthetic rejection standing in for a failed exchange.
    pub fn transport_failure(reason: &str) -> Self {
        Self::rejected(reason)
    }

    /// Attach coupon metadata.
    pub fn with_coupon(mut self, coupon: serde_json::Value) -> Self {
        self.coupon = Some(coupon);
        self
    }
}

/// Something that can check a coupon code against a cart.
///
/// Implementations never fail: transport problems are reported as a
/// rejection with [`REASON_HTTP_FAIL`] or [`REASON_NETWORK`].
#[async_trait]
pub trait CouponValidator: Send + Sync {
    async fn validate(&self, request: &CouponRequest) -> CouponResponse;
}

#[async_trait]
impl<V: CouponValidator + ?Sized> CouponValidator for Arc<V> {
    async fn validate(&self, request: &CouponRequest) -> CouponResponse {
        (**self).validate(request).await
    }
}

/// An absent validator behaves like an unreachable one.
#[async_trait]
impl<V: CouponValidator> CouponValidator for Option<V> {
    async fn validate(&self, request: &CouponRequest) -> CouponResponse {
        match self {
            Some(validator) => validator.validate(request).await,
            None => CouponResponse::transport_failure(REASON_NETWORK),
        }
    }
}
