//! Coupon validation over HTTP.

use crate::client::{FetchClient, FetchError, FetchPolicy};
use async_trait::async_trait;
use storefront_commerce::cart::{CouponRequest, CouponResponse, CouponValidator};
use tracing::{info, warn};

/// Validates coupon codes by POSTing the request to an endpoint.
///
/// Any failure to get a usable answer becomes a rejection carrying
/// `HTTP_FAIL` or `NETWORK`, so callers always receive a response.
#[derive(Debug, Clone)]
pub struct HttpCouponValidator {
    client: FetchClient,
    endpoint: String,
}

impl HttpCouponValidator {
    pub fn new(endpoint: impl Into<String>, policy: FetchPolicy) -> Result<Self, FetchError> {
        Ok(Self {
            client: FetchClient::new(policy)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CouponValidator for HttpCouponValidator {
    async fn validate(&self, request: &CouponRequest) -> CouponResponse {
        match self
            .client
            .post_json::<_, CouponResponse>(&self.endpoint, request)
            .await
        {
            Ok(response) => {
                info!(code = %request.code, ok = response.ok, "coupon_validated");
                response
            }
            Err(err) => {
                let reason = err.reason_code();
                warn!(code = %request.code, error = %err, reason, "coupon_validation_failed");
                CouponResponse::transport_failure(reason)
            }
        }
    }
}
