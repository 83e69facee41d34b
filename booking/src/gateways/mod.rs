//! Ports to the external services the booking engine talks to.
//!
//! Each port is a `Send + Sync` trait returning a boxed future, so the
//! environment can hold them as `Arc<dyn …>` and tests can swap in doubles.
//! Ports speak the domain error taxonomy; wire formats and status codes are
//! the adapters' business ([`http`]).

pub mod availability;
pub mod coupon;
pub mod http;
pub mod payment;
pub mod pricing;
pub mod rates;
pub mod records;

use std::future::Future;
use std::pin::Pin;

/// Future returned by every gateway port
pub type GatewayFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

pub use availability::AvailabilityGateway;
pub use coupon::{CouponGateway, CouponRequest};
pub use http::HttpBookingApi;
pub use payment::{PaymentKind, PaymentSession, PaymentSessionGateway, PaymentSessionRequest};
pub use pricing::{PricingGateway, PricingRequest};
pub use rates::ExchangeRateGateway;
pub use records::{BookingId, BookingRecord, BookingRecordGateway, HoldRecord, InquiryRecord};
