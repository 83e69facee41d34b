//! Server-side pricing lookup.
//!
//! The engine never computes nightly rates itself. It asks the pricing
//! service for a [`PricingSnapshot`] and only layers coupons and currency
//! conversion on top.

use super::GatewayFuture;
use crate::error::{GatewayError, PricingError, PricingUnavailable};
use serde::{Deserialize, Serialize};
use staybook_core::pricing::PricingSnapshot;
use staybook_core::NaiveDate;

/// `POST /pricing` request body
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    /// Backend property identifier
    pub property_id: String,
    /// Check-in day
    pub check_in: NaiveDate,
    /// Check-out day
    pub check_out: NaiveDate,
    /// Guest count
    pub guests: u32,
}

/// Why the service declined to price the stay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Stay is shorter than the property's minimum for these dates
    MinimumStay,
    /// Dates are taken
    Unavailable,
    /// Any reason this client does not know about
    #[serde(other)]
    Other,
}

/// `POST /pricing` response body
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    /// Whether the stay can be booked
    pub available: bool,
    /// Reason when `available` is false
    #[serde(default)]
    pub reason: Option<UnavailableReason>,
    /// Required nights when `reason` is `minimum_stay`
    #[serde(default)]
    pub minimum_stay: Option<u32>,
    /// Breakdown when `available` is true
    #[serde(default)]
    pub pricing: Option<PricingSnapshot>,
}

impl PricingResponse {
    /// Map the wire response onto the pricing outcome.
    ///
    /// `fallback_minimum_stay` is reported when the service says
    /// `minimum_stay` without a count.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Unavailable`] for declined stays and
    /// [`PricingError::Gateway`] when an available response carries no
    /// breakdown.
    pub fn into_snapshot(self, fallback_minimum_stay: u32) -> Result<PricingSnapshot, PricingError> {
        if self.available {
            return self.pricing.ok_or_else(|| {
                GatewayError::ResponseParseFailed("available response without pricing".to_string()).into()
            });
        }

        let unavailable = match self.reason {
            Some(UnavailableReason::MinimumStay) => PricingUnavailable::MinimumStay {
                required: self.minimum_stay.unwrap_or(fallback_minimum_stay),
            },
            Some(UnavailableReason::Unavailable | UnavailableReason::Other) | None => {
                PricingUnavailable::DateConflict
            }
        };
        Err(unavailable.into())
    }
}

/// Pricing gateway trait
pub trait PricingGateway: Send + Sync {
    /// Price a stay
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Unavailable`] when the service declines the
    /// stay, [`PricingError::Gateway`] when it cannot be reached
    fn quote(&self, request: PricingRequest) -> GatewayFuture<PricingSnapshot, PricingError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PricingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn request_serializes_iso_dates() {
        let request = PricingRequest {
            property_id: "prop-1".to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
            guests: 5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "propertyId": "prop-1",
                "checkIn": "2026-03-10",
                "checkOut": "2026-03-13",
                "guests": 5
            })
        );
    }

    #[test]
    fn minimum_stay_carries_required_nights() {
        let response = parse(r#"{"available": false, "reason": "minimum_stay", "minimumStay": 4}"#);
        assert_eq!(
            response.into_snapshot(2),
            Err(PricingError::Unavailable(PricingUnavailable::MinimumStay { required: 4 }))
        );

        let response = parse(r#"{"available": false, "reason": "minimum_stay"}"#);
        assert_eq!(
            response.into_snapshot(2),
            Err(PricingError::Unavailable(PricingUnavailable::MinimumStay { required: 2 }))
        );
    }

    #[test]
    fn unknown_reason_is_a_date_conflict() {
        for reason in ["unavailable", "blackout"] {
            let response = parse(&format!(r#"{{"available": false, "reason": "{reason}"}}"#));
            assert_eq!(
                response.into_snapshot(2),
                Err(PricingError::Unavailable(PricingUnavailable::DateConflict))
            );
        }
    }

    #[test]
    fn available_without_breakdown_is_a_gateway_error() {
        let response = parse(r#"{"available": true}"#);
        assert!(matches!(response.into_snapshot(2), Err(PricingError::Gateway(_))));
    }
}
