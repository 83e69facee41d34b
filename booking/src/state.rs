//! Booking session state.
//!
//! One [`BookingState`] exists per mounted booking session. Every monetary
//! value it holds is in the property's base currency; display amounts are
//! derived through [`BookingState::display_quote`] and friends and never
//! stored.

use crate::error::{AvailabilityError, CheckoutError, CouponError, PricingError};
use crate::gateways::records::BookingId;
use serde::{Deserialize, Serialize};
use staybook_core::currency::{ConvertedAmount, ConvertedQuote, CurrencyCode, CurrencyConverter, ExchangeRates};
use staybook_core::dates::DateConstraints;
use staybook_core::error::{FieldError, StayError};
use staybook_core::guest::GuestInfo;
use staybook_core::pricing::{AppliedCoupon, PricingSnapshot, Quote};
use staybook_core::property::Property;
use staybook_core::NaiveDate;
use std::collections::BTreeSet;

/// Which checkout path the visitor chose
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectedAction {
    /// Nothing chosen yet
    #[default]
    None,
    /// Full booking, paid now
    Book,
    /// Paid hold on the dates
    Hold,
    /// Inquiry to the host, no payment
    Contact,
}

impl SelectedAction {
    /// Wire/storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Book => "book",
            Self::Hold => "hold",
            Self::Contact => "contact",
        }
    }

    /// Parse a wire/storage name (case-insensitive)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "book" => Some(Self::Book),
            "hold" => Some(Self::Hold),
            "contact" => Some(Self::Contact),
            _ => None,
        }
    }

    /// Whether this path ends in a payment
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Book | Self::Hold)
    }
}

impl std::fmt::Display for SelectedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a checkout submission currently is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutPhase {
    /// No submission in progress
    #[default]
    Idle,
    /// Checking local preconditions
    Validating,
    /// Creating the booking, hold or inquiry record
    CreatingRecord,
    /// Opening the hosted payment session
    CreatingPaymentSession,
    /// Handing the visitor to the payment page
    Redirecting,
    /// Inquiry sent; nothing left to do
    Completed,
    /// Submission failed; see [`CheckoutStatus::error`]
    Failed,
}

impl CheckoutPhase {
    /// Whether a submission is between start and a terminal phase
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(
            self,
            Self::Validating | Self::CreatingRecord | Self::CreatingPaymentSession
        )
    }
}

/// How a successful submission ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutOutcome {
    /// Visitor handed to the hosted payment page
    Redirected {
        /// Record the payment settles
        booking_id: BookingId,
        /// Processor session identifier
        session_id: String,
        /// Payment page URL
        url: String,
    },
    /// Inquiry recorded; no payment
    InquirySent {
        /// Inquiry record identifier
        inquiry_id: BookingId,
    },
    /// Ignored because another submission was already in flight
    AlreadySubmitting,
}

/// Checkout progress tracked in session state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckoutStatus {
    /// A submission is in flight; further submits are ignored
    pub is_submitting: bool,
    /// Last reported phase
    pub phase: CheckoutPhase,
    /// Banner error from the last submission
    pub error: Option<CheckoutError>,
    /// Inline guest-info errors from the last validation
    pub field_errors: Vec<FieldError>,
    /// Result of the last successful submission
    pub last_outcome: Option<CheckoutOutcome>,
}

/// Booking session state
#[derive(Clone, Debug, PartialEq)]
pub struct BookingState {
    /// Property being booked (immutable for the session)
    pub property: Property,
    /// Selected check-in day
    pub check_in: Option<NaiveDate>,
    /// Selected check-out day
    pub check_out: Option<NaiveDate>,
    /// Guests, always within `[1, max_guests]`
    pub guest_count: u32,
    /// Blocked nights, loaded once on mount
    pub unavailable_dates: BTreeSet<NaiveDate>,
    /// Pricing for the current selection, in base currency
    pub pricing: Option<PricingSnapshot>,
    /// Chosen checkout path
    pub selected_action: SelectedAction,
    /// Guest contact details
    pub guest_info: GuestInfo,
    /// Validated coupon
    pub applied_coupon: Option<AppliedCoupon>,
    /// Display currency
    pub selected_currency: CurrencyCode,
    /// Rate table; `None` until loaded (or when loading failed)
    pub exchange_rates: Option<ExchangeRates>,

    /// Unavailable dates are being loaded
    pub is_loading_unavailable: bool,
    /// Unavailable dates failed to load
    pub unavailable_error: Option<AvailabilityError>,
    /// A pricing request is in flight
    pub is_loading_pricing: bool,
    /// Last pricing failure for the current selection
    pub pricing_error: Option<PricingError>,
    /// A check-in change just cleared a too-short check-out
    pub show_min_stay_warning: bool,
    /// Last rejected date selection
    pub date_error: Option<StayError>,
    /// A coupon is being validated
    pub is_validating_coupon: bool,
    /// Last coupon failure
    pub coupon_error: Option<CouponError>,
    /// Checkout progress
    pub checkout: CheckoutStatus,

    /// Bumped on every date/guest mutation; pricing replies carrying an
    /// older value are discarded
    pub pricing_generation: u64,
    /// Bumped whenever the coupon or the dates change; validation replies
    /// carrying an older value are discarded
    pub coupon_generation: u64,
}

impl BookingState {
    /// Fresh session for a property
    #[must_use]
    pub fn new(property: Property) -> Self {
        let selected_currency = property.base_currency.clone();
        Self {
            property,
            check_in: None,
            check_out: None,
            guest_count: 1,
            unavailable_dates: BTreeSet::new(),
            pricing: None,
            selected_action: SelectedAction::None,
            guest_info: GuestInfo::default(),
            applied_coupon: None,
            selected_currency,
            exchange_rates: None,
            is_loading_unavailable: false,
            unavailable_error: None,
            is_loading_pricing: false,
            pricing_error: None,
            show_min_stay_warning: false,
            date_error: None,
            is_validating_coupon: false,
            coupon_error: None,
            checkout: CheckoutStatus::default(),
            pricing_generation: 0,
            coupon_generation: 0,
        }
    }

    /// Date rules for the current session
    #[must_use]
    pub fn constraints(&self, today: NaiveDate) -> DateConstraints<'_> {
        DateConstraints::new(&self.unavailable_dates, today, self.property.default_minimum_stay)
    }

    /// Both dates set
    #[must_use]
    pub const fn stay(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => Some((check_in, check_out)),
            _ => None,
        }
    }

    /// Dates and guests are all set, so the stay can be priced
    #[must_use]
    pub const fn is_priceable(&self) -> bool {
        self.stay().is_some() && self.guest_count > 0
    }

    /// Quote for the current snapshot and coupon, in base currency
    #[must_use]
    pub fn quote(&self) -> Option<Quote> {
        self.pricing
            .as_ref()
            .map(|snapshot| Quote::new(snapshot, self.applied_coupon.as_ref()))
    }

    /// Converter into the selected display currency
    #[must_use]
    pub fn converter(&self) -> CurrencyConverter {
        CurrencyConverter::new(self.exchange_rates.clone(), self.selected_currency.clone())
    }

    /// Quote in the display currency: what the visitor sees and what a
    /// booking charges
    #[must_use]
    pub fn display_quote(&self) -> Option<ConvertedQuote> {
        self.quote().map(|quote| self.converter().convert_quote(&quote))
    }

    /// Hold fee in the display currency
    #[must_use]
    pub fn display_hold_fee(&self) -> ConvertedAmount {
        self.converter()
            .convert_amount(self.property.hold_fee_amount, &self.property.base_currency)
    }

    /// Currencies the visitor can pick
    #[must_use]
    pub fn available_currencies(&self) -> Vec<CurrencyCode> {
        let mut currencies = self
            .exchange_rates
            .as_ref()
            .map(ExchangeRates::currencies)
            .unwrap_or_default();
        if !currencies.contains(&self.property.base_currency) {
            currencies.insert(0, self.property.base_currency.clone());
        }
        currencies
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use staybook_core::pricing::PricingSnapshot;

    fn property() -> Property {
        Property {
            id: "prop-1".to_string(),
            slug: "villa-sol".to_string(),
            name: "Villa Sol".to_string(),
            base_currency: CurrencyCode::new("EUR"),
            base_occupancy: 4,
            max_guests: 6,
            default_minimum_stay: 2,
            hold_fee_amount: 50.0,
            hold_duration_hours: 24,
            hold_fee_refundable: true,
        }
    }

    #[test]
    fn new_session_uses_base_currency() {
        let state = BookingState::new(property());
        assert_eq!(state.selected_currency.as_str(), "EUR");
        assert_eq!(state.guest_count, 1);
        assert!(!state.is_priceable());
        assert_eq!(state.available_currencies(), vec![CurrencyCode::new("EUR")]);
    }

    #[test]
    fn display_quote_converts_with_coupon() {
        let mut state = BookingState::new(property());
        state.pricing = Some(PricingSnapshot {
            number_of_nights: 2,
            accommodation_total: 200.0,
            cleaning_fee: 0.0,
            extra_guest_fee_total: 0.0,
            taxes: 0.0,
            length_of_stay_discount: None,
            coupon_discount: None,
            total: 200.0,
            currency: CurrencyCode::new("EUR"),
        });
        state.applied_coupon = Some(AppliedCoupon::new("ten", 10.0));
        state.exchange_rates = Some(ExchangeRates::new([("EUR", 1.0), ("USD", 1.08)]));
        state.selected_currency = CurrencyCode::new("USD");

        let quote = state.display_quote().unwrap();
        assert_eq!(quote.currency.as_str(), "USD");
        assert!((quote.total - 194.4).abs() < 1e-9);
        assert_eq!(state.display_hold_fee().minor_units(), 5400);
    }

    #[test]
    fn selected_action_parses_case_insensitively() {
        assert_eq!(SelectedAction::parse("HOLD"), Some(SelectedAction::Hold));
        assert_eq!(SelectedAction::parse("pay"), None);
        assert!(SelectedAction::Book.is_paid());
        assert!(!SelectedAction::Contact.is_paid());
    }
}
