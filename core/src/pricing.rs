//! Pricing snapshot and the quote shown to the visitor.
//!
//! The pricing service returns a [`PricingSnapshot`] in the property's base
//! currency. The engine never recomputes nightly rates; it only layers the
//! applied coupon on top to produce a [`Quote`]. Quotes are derived on every
//! read, so removing a coupon restores the exact pre-coupon total.

use crate::currency::{round_to_cents, CurrencyCode};
use serde::{Deserialize, Serialize};

/// A percentage discount and the amount it took off
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    /// Percentage, e.g. `10.0` for 10 %
    pub percentage: f64,
    /// Amount deducted
    pub amount: f64,
}

/// Price breakdown produced by the pricing service
///
/// Always in the property's base currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    /// Nights in the stay
    pub number_of_nights: u32,
    /// Sum of nightly rates
    pub accommodation_total: f64,
    /// Cleaning fee
    #[serde(default)]
    pub cleaning_fee: f64,
    /// Extra-guest fees over the whole stay
    #[serde(default)]
    pub extra_guest_fee_total: f64,
    /// Taxes
    #[serde(default)]
    pub taxes: f64,
    /// Length-of-stay discount
    #[serde(default)]
    pub length_of_stay_discount: Option<Discount>,
    /// Coupon discount already applied by the service, if any
    #[serde(default)]
    pub coupon_discount: Option<Discount>,
    /// Grand total
    pub total: f64,
    /// Base currency of the property
    pub currency: CurrencyCode,
}

impl PricingSnapshot {
    /// Accommodation plus fees, before discounts and taxes
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.accommodation_total + self.cleaning_fee + self.extra_guest_fee_total
    }

    /// Grand total with any service-side coupon discount added back
    #[must_use]
    pub fn total_before_coupon(&self) -> f64 {
        let coupon = self.coupon_discount.as_ref().map_or(0.0, |discount| discount.amount);
        round_to_cents(self.total + coupon)
    }
}

/// A validated promotional code held in the session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    /// Code, upper-cased
    pub code: String,
    /// Discount percentage
    pub discount_percentage: f64,
}

impl AppliedCoupon {
    /// Create an applied coupon, normalizing the code to upper-case
    #[must_use]
    pub fn new(code: &str, discount_percentage: f64) -> Self {
        Self {
            code: code.trim().to_uppercase(),
            discount_percentage,
        }
    }
}

/// What the visitor sees and what checkout charges, in base currency
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Nights in the stay
    pub number_of_nights: u32,
    /// Sum of nightly rates
    pub accommodation_total: f64,
    /// Cleaning fee
    pub cleaning_fee: f64,
    /// Extra-guest fees
    pub extra_guest_fee_total: f64,
    /// Taxes
    pub taxes: f64,
    /// Length-of-stay discount
    pub length_of_stay_discount: Option<Discount>,
    /// Coupon discount
    pub coupon_discount: Option<Discount>,
    /// Grand total after all discounts
    pub total: f64,
    /// Base currency
    pub currency: CurrencyCode,
}

impl Quote {
    /// Derive the quote for a snapshot and the currently applied coupon.
    ///
    /// Any coupon the service had already applied is replaced: the coupon
    /// percentage is taken off the snapshot's pre-coupon total.
    #[must_use]
    pub fn new(snapshot: &PricingSnapshot, coupon: Option<&AppliedCoupon>) -> Self {
        let base_total = snapshot.total_before_coupon();

        let (coupon_discount, total) = match coupon {
            Some(coupon) if coupon.discount_percentage > 0.0 => {
                let percentage = coupon.discount_percentage.min(100.0);
                let amount = round_to_cents(base_total * percentage / 100.0);
                (
                    Some(Discount { percentage, amount }),
                    round_to_cents(base_total - amount),
                )
            }
            _ => (None, base_total),
        };

        Self {
            number_of_nights: snapshot.number_of_nights,
            accommodation_total: snapshot.accommodation_total,
            cleaning_fee: snapshot.cleaning_fee,
            extra_guest_fee_total: snapshot.extra_guest_fee_total,
            taxes: snapshot.taxes,
            length_of_stay_discount: snapshot.length_of_stay_discount.clone(),
            coupon_discount,
            total,
            currency: snapshot.currency.clone(),
        }
    }
}
