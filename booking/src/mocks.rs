//! In-memory gateways for development and testing.
//!
//! Every mock records what it was asked and can be told to fail or to take
//! a while, so hosts can run the full session without a backend.

use crate::checkout::{Navigator, RedirectLog};
use crate::config::BookingConfig;
use crate::environment::{BookingEnvironment, Gateways};
use crate::error::{AvailabilityError, CouponError, GatewayError, PaymentSessionError, PricingError, PricingUnavailable, RecordError};
use crate::gateways::{
    AvailabilityGateway, BookingId, BookingRecord, BookingRecordGateway, CouponGateway, CouponRequest,
    ExchangeRateGateway, HoldRecord, InquiryRecord, PaymentSession, PaymentSessionGateway,
    PaymentSessionRequest, PricingGateway, PricingRequest,
};
use crate::gateways::GatewayFuture;
use staybook_core::currency::{round_to_cents, CurrencyCode, ExchangeRates};
use staybook_core::dates::nights;
use staybook_core::environment::Clock;
use staybook_core::pricing::PricingSnapshot;
use staybook_core::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn pause(latency: Option<Duration>) {
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
}

// ============================================================================
// Availability
// ============================================================================

/// Fixed set of blocked nights
#[derive(Debug, Default)]
pub struct MockAvailability {
    dates: BTreeSet<NaiveDate>,
    failure: Option<GatewayError>,
    calls: AtomicUsize,
}

impl MockAvailability {
    /// Report `dates` as blocked
    #[must_use]
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Fail every lookup with `error`
    #[must_use]
    pub fn failing(error: GatewayError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Lookups made so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AvailabilityGateway for MockAvailability {
    fn unavailable_dates(
        &self,
        _property_slug: &str,
        _months: u32,
    ) -> GatewayFuture<BTreeSet<NaiveDate>, AvailabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.failure {
            Some(error) => Err(AvailabilityError(error.clone())),
            None => Ok(self.dates.clone()),
        };
        Box::pin(async move { result })
    }
}

// ============================================================================
// Pricing
// ============================================================================

/// Prices every stay at a flat nightly rate
///
/// Guests above `base_occupancy` pay `extra_guest_fee` per guest per night.
#[derive(Debug)]
pub struct FlatRatePricing {
    /// Price per night
    pub nightly_rate: f64,
    /// One-off cleaning fee
    pub cleaning_fee: f64,
    /// Per extra guest, per night
    pub extra_guest_fee: f64,
    /// Guests included in the nightly rate
    pub base_occupancy: u32,
    /// Stays shorter than this are declined
    pub minimum_stay: u32,
    /// Currency of every snapshot
    pub currency: CurrencyCode,
    latency: Option<Duration>,
    failure: Option<PricingError>,
    requests: Mutex<Vec<PricingRequest>>,
}

impl FlatRatePricing {
    /// 100 EUR a night, 50 EUR cleaning, 10 EUR per extra guest over 4,
    /// two-night minimum
    #[must_use]
    pub fn new() -> Self {
        Self {
            nightly_rate: 100.0,
            cleaning_fee: 50.0,
            extra_guest_fee: 10.0,
            base_occupancy: 4,
            minimum_stay: 2,
            currency: CurrencyCode::new("EUR"),
            latency: None,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Delay every reply
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every request with `error`
    #[must_use]
    pub fn failing(mut self, error: PricingError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Every request received, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<PricingRequest> {
        lock(&self.requests).clone()
    }

    fn price(&self, request: &PricingRequest) -> Result<PricingSnapshot, PricingError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let count = u32::try_from(nights(request.check_in, request.check_out)).unwrap_or(0);
        if count < self.minimum_stay {
            return Err(PricingUnavailable::MinimumStay {
                required: self.minimum_stay,
            }
            .into());
        }

        let accommodation_total = round_to_cents(self.nightly_rate * f64::from(count));
        let extra_guests = request.guests.saturating_sub(self.base_occupancy);
        let extra_guest_fee_total =
            round_to_cents(self.extra_guest_fee * f64::from(extra_guests) * f64::from(count));

        Ok(PricingSnapshot {
            number_of_nights: count,
            accommodation_total,
            cleaning_fee: self.cleaning_fee,
            extra_guest_fee_total,
            taxes: 0.0,
            length_of_stay_discount: None,
            coupon_discount: None,
            total: round_to_cents(accommodation_total + self.cleaning_fee + extra_guest_fee_total),
            currency: self.currency.clone(),
        })
    }
}

impl Default for FlatRatePricing {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingGateway for FlatRatePricing {
    fn quote(&self, request: PricingRequest) -> GatewayFuture<PricingSnapshot, PricingError> {
        let result = self.price(&request);
        lock(&self.requests).push(request);
        let latency = self.latency;
        Box::pin(async move {
            pause(latency).await;
            result
        })
    }
}

// ============================================================================
// Coupons and rates
// ============================================================================

/// Accepts a fixed table of codes, case-insensitively
#[derive(Debug, Default)]
pub struct MockCoupons {
    codes: HashMap<String, f64>,
    calls: AtomicUsize,
}

impl MockCoupons {
    /// Accept each `(code, percentage)` pair
    #[must_use]
    pub fn new<'a>(codes: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            codes: codes
                .into_iter()
                .map(|(code, percentage)| (code.to_uppercase(), percentage))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Validations made so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CouponGateway for MockCoupons {
    fn validate(&self, request: CouponRequest) -> GatewayFuture<f64, CouponError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .codes
            .get(&request.code.to_uppercase())
            .copied()
            .ok_or(CouponError::Invalid);
        Box::pin(async move { result })
    }
}

/// Serves a fixed rate table, or fails when there is none
#[derive(Debug, Default)]
pub struct MockRates {
    rates: Option<ExchangeRates>,
}

impl MockRates {
    /// Serve `rates`
    #[must_use]
    pub const fn new(rates: ExchangeRates) -> Self {
        Self { rates: Some(rates) }
    }

    /// Always fail
    #[must_use]
    pub const fn unavailable() -> Self {
        Self { rates: None }
    }
}

impl ExchangeRateGateway for MockRates {
    fn latest(&self) -> GatewayFuture<ExchangeRates, GatewayError> {
        let result = self
            .rates
            .clone()
            .ok_or_else(|| GatewayError::RequestFailed("no exchange rates configured".to_string()));
        Box::pin(async move { result })
    }
}

// ============================================================================
// Records and payments
// ============================================================================

/// Records every booking, hold and inquiry it is asked to create
#[derive(Debug, Default)]
pub struct MockRecords {
    latency: Option<Duration>,
    failure: Option<RecordError>,
    next_id: AtomicUsize,
    bookings: Mutex<Vec<BookingRecord>>,
    holds: Mutex<Vec<HoldRecord>>,
    inquiries: Mutex<Vec<InquiryRecord>>,
}

impl MockRecords {
    /// Accept everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Reject every record with `error`
    #[must_use]
    pub fn failing(mut self, error: RecordError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Bookings created
    #[must_use]
    pub fn bookings(&self) -> Vec<BookingRecord> {
        lock(&self.bookings).clone()
    }

    /// Holds created
    #[must_use]
    pub fn holds(&self) -> Vec<HoldRecord> {
        lock(&self.holds).clone()
    }

    /// Inquiries created
    #[must_use]
    pub fn inquiries(&self) -> Vec<InquiryRecord> {
        lock(&self.inquiries).clone()
    }

    /// Create calls of any kind
    #[must_use]
    pub fn calls(&self) -> usize {
        lock(&self.bookings).len() + lock(&self.holds).len() + lock(&self.inquiries).len()
    }

    fn reply(&self, prefix: &str) -> GatewayFuture<BookingId, RecordError> {
        let result = match &self.failure {
            Some(error) => Err(error.clone()),
            None => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(BookingId::new(format!("{prefix}_{n}")))
            }
        };
        let latency = self.latency;
        Box::pin(async move {
            pause(latency).await;
            result
        })
    }
}

impl BookingRecordGateway for MockRecords {
    fn create_booking(&self, record: BookingRecord) -> GatewayFuture<BookingId, RecordError> {
        lock(&self.bookings).push(record);
        self.reply("bk")
    }

    fn create_hold(&self, record: HoldRecord) -> GatewayFuture<BookingId, RecordError> {
        lock(&self.holds).push(record);
        self.reply("hold")
    }

    fn create_inquiry(&self, record: InquiryRecord) -> GatewayFuture<BookingId, RecordError> {
        lock(&self.inquiries).push(record);
        self.reply("inq")
    }
}

/// Opens fake hosted payment sessions
#[derive(Debug, Default)]
pub struct MockPayments {
    failure: Option<PaymentSessionError>,
    requests: Mutex<Vec<PaymentSessionRequest>>,
}

impl MockPayments {
    /// Open every session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every session with `error`
    #[must_use]
    pub fn failing(error: PaymentSessionError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Every session request, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<PaymentSessionRequest> {
        lock(&self.requests).clone()
    }
}

impl PaymentSessionGateway for MockPayments {
    fn create_session(&self, request: PaymentSessionRequest) -> GatewayFuture<PaymentSession, PaymentSessionError> {
        let result = match &self.failure {
            Some(error) => Err(error.clone()),
            None => {
                let session_id = format!("cs_test_{}", uuid::Uuid::new_v4().simple());
                Ok(PaymentSession {
                    session_url: format!("https://pay.example.com/c/{session_id}"),
                    session_id,
                })
            }
        };
        tracing::info!(
            booking_id = %request.booking_id,
            unit_amount = request.unit_amount,
            currency = %request.currency,
            "Mock payment session requested"
        );
        lock(&self.requests).push(request);
        Box::pin(async move { result })
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// One of each mock, shared so tests can inspect them after a run
#[derive(Clone, Debug)]
pub struct MockServices {
    /// Blocked nights
    pub availability: Arc<MockAvailability>,
    /// Pricing
    pub pricing: Arc<FlatRatePricing>,
    /// Coupons
    pub coupons: Arc<MockCoupons>,
    /// Exchange rates
    pub rates: Arc<MockRates>,
    /// Records
    pub records: Arc<MockRecords>,
    /// Payment sessions
    pub payments: Arc<MockPayments>,
    /// Redirects
    pub navigator: Arc<RedirectLog>,
}

impl MockServices {
    /// Everything succeeds: no blocked nights, flat-rate pricing, coupon
    /// `SUMMER10` for 10%, and EUR/USD/GBP rates
    #[must_use]
    pub fn new() -> Self {
        Self {
            availability: Arc::new(MockAvailability::default()),
            pricing: Arc::new(FlatRatePricing::new()),
            coupons: Arc::new(MockCoupons::new([("SUMMER10", 10.0)])),
            rates: Arc::new(MockRates::new(ExchangeRates::new([
                ("EUR", 1.0),
                ("USD", 1.08),
                ("GBP", 0.86),
            ]))),
            records: Arc::new(MockRecords::new()),
            payments: Arc::new(MockPayments::new()),
            navigator: Arc::new(RedirectLog::new()),
        }
    }

    /// Gateway bundle backed by these mocks
    #[must_use]
    pub fn gateways(&self) -> Gateways {
        Gateways {
            availability: self.availability.clone(),
            pricing: self.pricing.clone(),
            coupons: self.coupons.clone(),
            rates: self.rates.clone(),
            records: self.records.clone(),
            payments: self.payments.clone(),
        }
    }

    /// Environment backed by these mocks
    #[must_use]
    pub fn environment(&self, clock: Arc<dyn Clock>, config: BookingConfig) -> BookingEnvironment {
        let navigator: Arc<dyn Navigator> = self.navigator.clone();
        BookingEnvironment::new(self.gateways(), navigator, clock, config)
    }
}

impl Default for MockServices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(check_in: u32, check_out: u32, guests: u32) -> PricingRequest {
        PricingRequest {
            property_id: "prop-1".to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 3, check_in).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 3, check_out).unwrap(),
            guests,
        }
    }

    #[tokio::test]
    async fn flat_rate_charges_extra_guests_per_night() {
        let pricing = FlatRatePricing::new();
        let snapshot = pricing.quote(request(10, 13, 5)).await.unwrap();

        assert_eq!(snapshot.number_of_nights, 3);
        assert!((snapshot.extra_guest_fee_total - 30.0).abs() < 1e-9);
        assert!((snapshot.total - 380.0).abs() < 1e-9);
        assert_eq!(pricing.requests().len(), 1);
    }

    #[tokio::test]
    async fn flat_rate_declines_short_stays() {
        let error = FlatRatePricing::new().quote(request(10, 11, 2)).await.unwrap_err();
        assert_eq!(
            error,
            PricingError::Unavailable(PricingUnavailable::MinimumStay { required: 2 })
        );
    }

    #[tokio::test]
    async fn coupons_match_case_insensitively() {
        let coupons = MockCoupons::new([("SUMMER10", 10.0)]);
        let request = |code: &str| CouponRequest {
            code: code.to_string(),
            check_in_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            check_out_date: NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
            property_slug: "villa-sol".to_string(),
        };

        assert!((coupons.validate(request("summer10")).await.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(coupons.validate(request("NOPE")).await, Err(CouponError::Invalid));
        assert_eq!(coupons.calls(), 2);
    }

    #[tokio::test]
    async fn records_hand_out_sequential_ids() {
        let records = MockRecords::new();
        let first = records.reply("bk").await.unwrap();
        let second = records.reply("hold").await.unwrap();
        assert_eq!(first.as_str(), "bk_1");
        assert_eq!(second.as_str(), "hold_2");
    }
}
