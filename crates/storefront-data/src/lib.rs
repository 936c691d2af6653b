//! Outbound data access for the storefront.
//!
//! This crate provides:
//! - `FetchClient` - JSON over HTTP with timeout and retry
//! - `TimeoutConfig` - connect and total timeouts
//! - `RetryPolicy` - what to retry and how long to back off
//! - `HttpCouponValidator` - the coupon check against a remote endpoint

mod client;
mod coupon;
mod retry;
mod timeout;

pub use client::*;
pub use coupon::HttpCouponValidator;
pub use retry::*;
pub use timeout::*;
