//! Multi-currency conversion and price formatting.
//!
//! Rates are quoted against a common base (USD-equivalent): converting
//! `amount` from `X` to `Y` is `amount / rate[X] * rate[Y]`.
//!
//! Conversion into the visitor's display currency happens exactly once, at
//! the checkout boundary, through [`CurrencyConverter::convert_quote`] and
//! [`CurrencyConverter::convert_amount`]. Their outputs ([`ConvertedQuote`],
//! [`ConvertedAmount`]) cannot be built outside this crate and cannot be fed
//! back into the converter, so a skipped or doubled conversion does not
//! type-check.

use crate::pricing::{Discount, Quote};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// ISO 4217 currency code, always upper-case
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a code, normalizing to upper-case
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// The code as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display symbol, or the code followed by a space when unknown
    #[must_use]
    pub fn symbol(&self) -> String {
        match self.0.as_str() {
            "USD" => "$".to_string(),
            "EUR" => "€".to_string(),
            "GBP" => "£".to_string(),
            "JPY" => "¥".to_string(),
            "RON" => "lei ".to_string(),
            other => format!("{other} "),
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Rate table keyed by currency code
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRates {
    rates: HashMap<CurrencyCode, f64>,
}

impl ExchangeRates {
    /// Build a table from `(code, rate)` pairs
    pub fn new<I, C>(rates: I) -> Self
    where
        I: IntoIterator<Item = (C, f64)>,
        C: Into<CurrencyCode>,
    {
        Self {
            rates: rates.into_iter().map(|(code, rate)| (code.into(), rate)).collect(),
        }
    }

    /// Rate for `code`; missing, zero, negative or non-finite rates are `None`
    #[must_use]
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates
            .get(code)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Currencies with a usable rate, sorted
    #[must_use]
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<_> = self
            .rates
            .keys()
            .filter(|code| self.rate(code).is_some())
            .cloned()
            .collect();
        codes.sort();
        codes
    }

    /// Whether the table has no usable rates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.currencies().is_empty()
    }
}

/// Round to two decimal places (cents)
#[must_use]
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Integer minor units for a payment processor (`round(amount * 100)`)
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Booking amounts are far below i64::MAX cents
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Format an amount with its currency symbol and thousands separators
///
/// ```
/// use staybook_core::currency::{format_price, CurrencyCode};
/// assert_eq!(format_price(1234.5, &CurrencyCode::new("EUR")), "€1,234.50");
/// assert_eq!(format_price(-20.0, &CurrencyCode::new("USD")), "-$20.00");
/// ```
#[must_use]
pub fn format_price(amount: f64, currency: &CurrencyCode) -> String {
    let cents = to_minor_units(amount).unsigned_abs();
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{}{grouped}.{fraction:02}", currency.symbol())
}

/// An amount already converted into the display currency
///
/// Only produced by [`CurrencyConverter`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ConvertedAmount {
    /// Amount in `currency`, rounded to cents
    pub amount: f64,
    /// Currency the amount is expressed in
    pub currency: CurrencyCode,
}

impl ConvertedAmount {
    /// Integer minor units to hand to a payment processor
    #[must_use]
    pub fn minor_units(&self) -> i64 {
        to_minor_units(self.amount)
    }

    /// Human-readable price
    #[must_use]
    pub fn formatted(&self) -> String {
        format_price(self.amount, &self.currency)
    }
}

/// Every monetary field of a [`Quote`], converted into the display currency
///
/// Only produced by [`CurrencyConverter::convert_quote`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ConvertedQuote {
    /// Nights in the stay
    pub number_of_nights: u32,
    /// Accommodation total
    pub accommodation_total: f64,
    /// Cleaning fee
    pub cleaning_fee: f64,
    /// Extra-guest fee total
    pub extra_guest_fee_total: f64,
    /// Taxes
    pub taxes: f64,
    /// Length-of-stay discount
    pub length_of_stay_discount: Option<Discount>,
    /// Coupon discount
    pub coupon_discount: Option<Discount>,
    /// Grand total
    pub total: f64,
    /// Currency of every amount above
    pub currency: CurrencyCode,
}

impl ConvertedQuote {
    /// Grand total as a standalone amount
    #[must_use]
    pub fn total_amount(&self) -> ConvertedAmount {
        ConvertedAmount {
            amount: self.total,
            currency: self.currency.clone(),
        }
    }
}

/// Converts base-currency amounts into a selected display currency
#[derive(Clone, Debug, PartialEq)]
pub struct CurrencyConverter {
    rates: Option<ExchangeRates>,
    selected: CurrencyCode,
}

impl CurrencyConverter {
    /// Create a converter into `selected`; `rates: None` makes every
    /// conversion a logged no-op
    #[must_use]
    pub const fn new(rates: Option<ExchangeRates>, selected: CurrencyCode) -> Self {
        Self { rates, selected }
    }

    /// The display currency requested by the visitor
    #[must_use]
    pub const fn selected(&self) -> &CurrencyCode {
        &self.selected
    }

    /// Factor to multiply `from` amounts by, or `None` when the table cannot
    /// convert between the two currencies
    fn factor(&self, from: &CurrencyCode) -> Option<f64> {
        if *from == self.selected {
            return Some(1.0);
        }
        let rates = self.rates.as_ref()?;
        Some(rates.rate(&self.selected)? / rates.rate(from)?)
    }

    /// Raw conversion of `amount` from `from` into the selected currency.
    ///
    /// Unrounded. Degrades to returning `amount` unchanged (and logging)
    /// when rates are missing.
    #[must_use]
    pub fn convert(&self, amount: f64, from: &CurrencyCode) -> f64 {
        match self.factor(from) {
            Some(factor) => amount * factor,
            None => {
                tracing::warn!(
                    from = %from,
                    to = %self.selected,
                    "Exchange rates unavailable, showing base currency amount"
                );
                amount
            }
        }
    }

    /// Currency an amount in `from` ends up in after conversion: the
    /// selected currency, or `from` itself when conversion degrades
    #[must_use]
    pub fn effective_currency(&self, from: &CurrencyCode) -> CurrencyCode {
        if self.factor(from).is_some() {
            self.selected.clone()
        } else {
            from.clone()
        }
    }

    /// Convert a single base amount (e.g. a hold fee)
    #[must_use]
    pub fn convert_amount(&self, amount: f64, from: &CurrencyCode) -> ConvertedAmount {
        ConvertedAmount {
            amount: round_to_cents(self.convert(amount, from)),
            currency: self.effective_currency(from),
        }
    }

    /// Convert every monetary field of a quote
    #[must_use]
    pub fn convert_quote(&self, quote: &Quote) -> ConvertedQuote {
        let from = &quote.currency;
        let money = |amount: f64| round_to_cents(self.convert(amount, from));
        let discount = |discount: &Discount| Discount {
            percentage: discount.percentage,
            amount: money(discount.amount),
        };

        ConvertedQuote {
            number_of_nights: quote.number_of_nights,
            accommodation_total: money(quote.accommodation_total),
            cleaning_fee: money(quote.cleaning_fee),
            extra_guest_fee_total: money(quote.extra_guest_fee_total),
            taxes: money(quote.taxes),
            length_of_stay_discount: quote.length_of_stay_discount.as_ref().map(discount),
            coupon_discount: quote.coupon_discount.as_ref().map(discount),
            total: money(quote.total),
            currency: self.effective_currency(from),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pricing::PricingSnapshot;
    use proptest::prelude::*;

    fn rates() -> ExchangeRates {
        ExchangeRates::new([("USD", 1.0), ("EUR", 0.92), ("GBP", 0.79), ("RON", 4.57)])
    }

    #[test]
    fn converts_through_common_base() {
        let converter = CurrencyConverter::new(Some(rates()), CurrencyCode::new("RON"));
        let converted = converter.convert(92.0, &CurrencyCode::new("EUR"));
        assert!((converted - 457.0).abs() < 1e-9);
    }

    #[test]
    fn missing_rates_are_a_no_op() {
        let converter = CurrencyConverter::new(None, CurrencyCode::new("USD"));
        let eur = CurrencyCode::new("EUR");
        assert!((converter.convert(50.0, &eur) - 50.0).abs() < f64::EPSILON);

        let amount = converter.convert_amount(50.0, &eur);
        assert_eq!(amount.currency, eur);
        assert_eq!(amount.minor_units(), 5000);
    }

    #[test]
    fn unknown_currency_degrades_to_base() {
        let converter = CurrencyConverter::new(Some(rates()), CurrencyCode::new("CHF"));
        let amount = converter.convert_amount(10.0, &CurrencyCode::new("EUR"));
        assert_eq!(amount.currency, CurrencyCode::new("EUR"));
        assert!((amount.amount - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hold_fee_conversion_matches_charge() {
        let table = ExchangeRates::new([("EUR", 1.0), ("USD", 1.08)]);
        let converter = CurrencyConverter::new(Some(table), CurrencyCode::new("USD"));

        let fee = converter.convert_amount(50.0, &CurrencyCode::new("EUR"));
        assert!((fee.amount - 54.0).abs() < f64::EPSILON);
        assert_eq!(fee.currency, CurrencyCode::new("USD"));
        assert_eq!(fee.minor_units(), 5400);
    }

    #[test]
    fn quote_conversion_covers_every_field() {
        let snapshot = PricingSnapshot {
            number_of_nights: 3,
            accommodation_total: 300.0,
            cleaning_fee: 50.0,
            extra_guest_fee_total: 30.0,
            taxes: 38.0,
            length_of_stay_discount: Some(Discount { percentage: 10.0, amount: 38.0 }),
            coupon_discount: None,
            total: 380.0,
            currency: CurrencyCode::new("EUR"),
        };
        let quote = Quote::new(&snapshot, None);
        let table = ExchangeRates::new([("EUR", 1.0), ("USD", 1.08)]);
        let converted =
            CurrencyConverter::new(Some(table), CurrencyCode::new("USD")).convert_quote(&quote);

        assert_eq!(converted.currency, CurrencyCode::new("USD"));
        assert!((converted.accommodation_total - 324.0).abs() < 1e-9);
        assert!((converted.cleaning_fee - 54.0).abs() < 1e-9);
        assert!((converted.extra_guest_fee_total - 32.4).abs() < 1e-9);
        assert!((converted.taxes - 41.04).abs() < 1e-9);
        assert!((converted.length_of_stay_discount.as_ref().unwrap().amount - 41.04).abs() < 1e-9);
        assert!((converted.total - 410.4).abs() < 1e-9);
        assert_eq!(converted.total_amount().minor_units(), 41040);
    }

    #[test]
    fn formats_with_symbol_and_grouping() {
        assert_eq!(format_price(0.0, &CurrencyCode::new("usd")), "$0.00");
        assert_eq!(format_price(1_000_000.0, &CurrencyCode::new("GBP")), "£1,000,000.00");
        assert_eq!(format_price(99.999, &CurrencyCode::new("CHF")), "CHF 100.00");
    }

    proptest! {
        #[test]
        fn round_trip_stays_within_a_cent(amount in 0.0f64..100_000.0) {
            let table = rates();
            let eur = CurrencyCode::new("EUR");
            let gbp = CurrencyCode::new("GBP");
            let to_gbp = CurrencyConverter::new(Some(table.clone()), gbp.clone());
            let to_eur = CurrencyConverter::new(Some(table), eur.clone());

            let back = to_eur.convert(to_gbp.convert(amount, &eur), &gbp);
            prop_assert!((back - amount).abs() <= 0.01);
        }
    }
}
