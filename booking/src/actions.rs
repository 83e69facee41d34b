//! Booking session actions.
//!
//! Every input to the session is one of these: visitor commands from the
//! host UI, and feedback actions produced by effects (gateway replies,
//! timer expiry).

use crate::error::{AvailabilityError, CheckoutError, CouponError, GatewayError, PricingError};
use crate::persistence::RestoredSession;
use crate::state::{CheckoutOutcome, SelectedAction};
use staybook_core::currency::{CurrencyCode, ExchangeRates};
use staybook_core::guest::GuestInfoPatch;
use staybook_core::pricing::{AppliedCoupon, PricingSnapshot};
use staybook_core::NaiveDate;
use std::collections::BTreeSet;

/// Actions for the booking session reducer
#[derive(Clone, Debug, PartialEq)]
pub enum BookingAction {
    // ========== Lifecycle ==========
    /// Session mounted with values recovered from the URL and storage
    Mounted {
        /// Recovered values, validated like live input
        restored: RestoredSession,
    },

    /// Clear every selection and the persisted copy
    Reset,

    // ========== Dates and guests ==========
    /// Pick (or clear) the check-in day
    SetCheckIn(Option<NaiveDate>),

    /// Pick (or clear) the check-out day
    SetCheckOut(Option<NaiveDate>),

    /// Change the guest count (clamped to the property's limits)
    SetGuestCount(u32),

    /// Hide the minimum-stay warning
    DismissMinStayWarning,

    // ========== Availability ==========
    /// Blocked nights loaded
    SetUnavailableDates(BTreeSet<NaiveDate>),

    /// Blocked nights failed to load
    UnavailableDatesFailed(AvailabilityError),

    /// Load blocked nights again after a failure
    RetryAvailability,

    // ========== Pricing ==========
    /// Replace the pricing snapshot directly
    SetPricing(Option<PricingSnapshot>),

    /// The debounce window for `generation` passed without further input
    PricingDebounceElapsed {
        /// Generation the timer was armed for
        generation: u64,
    },

    /// Pricing arrived for `generation`
    PricingLoaded {
        /// Generation the request was made for
        generation: u64,
        /// Breakdown in base currency
        outcome: PricingSnapshot,
    },

    /// Pricing failed for `generation`
    PricingFailed {
        /// Generation the request was made for
        generation: u64,
        /// What went wrong
        error: PricingError,
    },

    /// Request pricing again for the current selection, skipping the debounce
    RetryPricing,

    // ========== Checkout path and guest ==========
    /// Choose book, hold or contact
    SetSelectedAction(SelectedAction),

    /// Merge form field changes into the guest info
    UpdateGuestInfo(GuestInfoPatch),

    // ========== Coupons ==========
    /// Validate a code against the selected dates
    ApplyCoupon {
        /// Code as typed
        code: String,
    },

    /// The code was accepted
    CouponValidated {
        /// Coupon generation the validation was started for
        generation: u64,
        /// Code as typed
        code: String,
        /// Discount percentage
        discount_percentage: f64,
    },

    /// The code was refused
    CouponRejected {
        /// Coupon generation the validation was started for
        generation: u64,
        /// Why
        error: CouponError,
    },

    /// Replace the applied coupon directly
    SetCoupon(Option<AppliedCoupon>),

    /// Drop the applied coupon
    RemoveCoupon,

    // ========== Currency ==========
    /// Change the display currency
    SetCurrency(CurrencyCode),

    /// Rate table loaded
    SetExchangeRates(ExchangeRates),

    /// Rate table failed to load; prices stay in base currency
    ExchangeRatesFailed(GatewayError),

    // ========== Checkout ==========
    /// Submit the selected checkout path
    SubmitCheckout,

    /// The orchestrator finished a submission
    CheckoutFinished(Result<CheckoutOutcome, CheckoutError>),

    /// Hide the checkout error banner
    DismissCheckoutError,
}

impl BookingAction {
    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mounted { .. } => "mounted",
            Self::Reset => "reset",
            Self::SetCheckIn(_) => "set-check-in",
            Self::SetCheckOut(_) => "set-check-out",
            Self::SetGuestCount(_) => "set-guest-count",
            Self::DismissMinStayWarning => "dismiss-min-stay-warning",
            Self::SetUnavailableDates(_) => "set-unavailable-dates",
            Self::UnavailableDatesFailed(_) => "unavailable-dates-failed",
            Self::RetryAvailability => "retry-availability",
            Self::SetPricing(_) => "set-pricing",
            Self::PricingDebounceElapsed { .. } => "pricing-debounce-elapsed",
            Self::PricingLoaded { .. } => "pricing-loaded",
            Self::PricingFailed { .. } => "pricing-failed",
            Self::RetryPricing => "retry-pricing",
            Self::SetSelectedAction(_) => "set-selected-action",
            Self::UpdateGuestInfo(_) => "update-guest-info",
            Self::ApplyCoupon { .. } => "apply-coupon",
            Self::CouponValidated { .. } => "coupon-validated",
            Self::CouponRejected { .. } => "coupon-rejected",
            Self::SetCoupon(_) => "set-coupon",
            Self::RemoveCoupon => "remove-coupon",
            Self::SetCurrency(_) => "set-currency",
            Self::SetExchangeRates(_) => "set-exchange-rates",
            Self::ExchangeRatesFailed(_) => "exchange-rates-failed",
            Self::SubmitCheckout => "submit-checkout",
            Self::CheckoutFinished(_) => "checkout-finished",
            Self::DismissCheckoutError => "dismiss-checkout-error",
        }
    }
}
