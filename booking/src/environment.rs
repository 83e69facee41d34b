//! Injected dependencies for the booking reducer.

use crate::checkout::{CallbackUrls, CheckoutOrchestrator, Navigator};
use crate::config::BookingConfig;
use crate::gateways::{
    AvailabilityGateway, BookingRecordGateway, CouponGateway, ExchangeRateGateway, HttpBookingApi,
    PaymentSessionGateway, PricingGateway,
};
use staybook_core::environment::Clock;
use std::sync::Arc;

/// Every external service the engine talks to
#[derive(Clone)]
pub struct Gateways {
    /// Unavailable-date lookup
    pub availability: Arc<dyn AvailabilityGateway>,
    /// Pricing lookup
    pub pricing: Arc<dyn PricingGateway>,
    /// Coupon validation
    pub coupons: Arc<dyn CouponGateway>,
    /// Exchange-rate table
    pub rates: Arc<dyn ExchangeRateGateway>,
    /// Booking, hold and inquiry records
    pub records: Arc<dyn BookingRecordGateway>,
    /// Hosted payment sessions
    pub payments: Arc<dyn PaymentSessionGateway>,
}

impl Gateways {
    /// Route every port through one HTTP API client
    #[must_use]
    pub fn http(api: HttpBookingApi) -> Self {
        let api = Arc::new(api);
        Self {
            availability: api.clone(),
            pricing: api.clone(),
            coupons: api.clone(),
            rates: api.clone(),
            records: api.clone(),
            payments: api,
        }
    }
}

/// Environment for the booking reducer
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Clock for "today" and hold expiry
    pub clock: Arc<dyn Clock>,
    /// Unavailable-date lookup
    pub availability: Arc<dyn AvailabilityGateway>,
    /// Pricing lookup
    pub pricing: Arc<dyn PricingGateway>,
    /// Coupon validation
    pub coupons: Arc<dyn CouponGateway>,
    /// Exchange-rate table
    pub rates: Arc<dyn ExchangeRateGateway>,
    /// Checkout orchestrator (owns the record and payment gateways)
    pub checkout: Arc<CheckoutOrchestrator>,
    /// Engine configuration
    pub config: BookingConfig,
}

impl BookingEnvironment {
    /// Wire an environment from its ports
    #[must_use]
    pub fn new(
        gateways: Gateways,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        let checkout = Arc::new(CheckoutOrchestrator::new(
            gateways.records,
            gateways.payments,
            navigator,
            Arc::clone(&clock),
            CallbackUrls::new(&config.site_url),
        ));

        Self {
            clock,
            availability: gateways.availability,
            pricing: gateways.pricing,
            coupons: gateways.coupons,
            rates: gateways.rates,
            checkout,
            config,
        }
    }
}

impl std::fmt::Debug for BookingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEnvironment")
            .field("config", &self.config)
            .field("checkout", &self.checkout)
            .finish_non_exhaustive()
    }
}
