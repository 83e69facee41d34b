//! Checkout input: the session snapshot and its validated form.

use crate::state::{BookingState, SelectedAction};
use staybook_core::currency::{ConvertedAmount, ConvertedQuote, CurrencyConverter};
use staybook_core::dates::DateConstraints;
use staybook_core::error::ValidationError;
use staybook_core::guest::GuestInfo;
use staybook_core::pricing::{AppliedCoupon, PricingSnapshot, Quote};
use staybook_core::property::Property;
use staybook_core::NaiveDate;
use std::collections::BTreeSet;

/// Checkout path of a validated request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutKind {
    /// Full booking
    Book,
    /// Paid hold
    Hold,
    /// Inquiry
    Contact,
}

impl CheckoutKind {
    /// Label for logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Hold => "hold",
            Self::Contact => "contact",
        }
    }
}

/// Everything a submission needs, copied out of session state
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutDraft {
    /// Chosen path
    pub action: SelectedAction,
    /// Property
    pub property: Property,
    /// Check-in day
    pub check_in: Option<NaiveDate>,
    /// Check-out day
    pub check_out: Option<NaiveDate>,
    /// Guest count
    pub guest_count: u32,
    /// Guest contact details
    pub guest_info: GuestInfo,
    /// Pricing in base currency
    pub pricing: Option<PricingSnapshot>,
    /// Applied coupon
    pub coupon: Option<AppliedCoupon>,
    /// Blocked nights
    pub unavailable_dates: BTreeSet<NaiveDate>,
    /// Converter into the display currency
    pub converter: CurrencyConverter,
}

impl CheckoutDraft {
    /// Snapshot the session
    #[must_use]
    pub fn from_state(state: &BookingState) -> Self {
        Self {
            action: state.selected_action,
            property: state.property.clone(),
            check_in: state.check_in,
            check_out: state.check_out,
            guest_count: state.guest_count,
            guest_info: state.guest_info.clone(),
            pricing: state.pricing.clone(),
            coupon: state.applied_coupon.clone(),
            unavailable_dates: state.unavailable_dates.clone(),
            converter: state.converter(),
        }
    }

    /// Check every local precondition and convert the money once.
    ///
    /// Checks run in order: path chosen, dates present, dates form a legal
    /// stay, pricing present, guest fields, amount to charge.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found. Guest field problems are
    /// reported together in [`ValidationError::Fields`].
    pub fn validate(self, today: NaiveDate) -> Result<CheckoutRequest, ValidationError> {
        let kind = match self.action {
            SelectedAction::None => return Err(ValidationError::NoActionSelected),
            SelectedAction::Book => CheckoutKind::Book,
            SelectedAction::Hold if !self.property.supports_holds() => {
                return Err(ValidationError::HoldsUnavailable);
            }
            SelectedAction::Hold => CheckoutKind::Hold,
            SelectedAction::Contact => CheckoutKind::Contact,
        };

        let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) else {
            return Err(ValidationError::MissingDates);
        };

        DateConstraints::new(&self.unavailable_dates, today, self.property.default_minimum_stay)
            .validate_stay(check_in, check_out)
            .map_err(ValidationError::Stay)?;

        let snapshot = self.pricing.as_ref().ok_or(ValidationError::MissingPricing)?;

        self.guest_info.validate(kind != CheckoutKind::Contact)?;

        let quote = self
            .converter
            .convert_quote(&Quote::new(snapshot, self.coupon.as_ref()));
        let hold_fee = self
            .converter
            .convert_amount(self.property.hold_fee_amount, &self.property.base_currency);

        let charge = match kind {
            CheckoutKind::Book => Some(quote.total_amount()),
            CheckoutKind::Hold => Some(hold_fee.clone()),
            CheckoutKind::Contact => None,
        };
        if charge.is_some_and(|charge| charge.minor_units() <= 0) {
            return Err(ValidationError::NonPositiveAmount);
        }

        Ok(CheckoutRequest {
            kind,
            property: self.property,
            guest_info: self.guest_info,
            check_in,
            check_out,
            guest_count: self.guest_count,
            quote,
            hold_fee,
            coupon: self.coupon,
        })
    }
}

/// A validated submission with every amount in the display currency
///
/// Only produced by [`CheckoutDraft::validate`]. Never persisted.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct CheckoutRequest {
    /// Chosen path
    pub kind: CheckoutKind,
    /// Property
    pub property: Property,
    /// Guest contact details
    pub guest_info: GuestInfo,
    /// Check-in day
    pub check_in: NaiveDate,
    /// Check-out day
    pub check_out: NaiveDate,
    /// Guest count
    pub guest_count: u32,
    /// Converted quote (what the visitor saw)
    pub quote: ConvertedQuote,
    /// Converted hold fee
    pub hold_fee: ConvertedAmount,
    /// Applied coupon
    pub coupon: Option<AppliedCoupon>,
}
