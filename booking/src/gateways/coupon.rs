//! Coupon validation.

use super::GatewayFuture;
use crate::error::CouponError;
use serde::{Deserialize, Serialize};
use staybook_core::NaiveDate;

/// `POST /coupons/validate` request body
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRequest {
    /// Code as typed (trimmed)
    pub code: String,
    /// Check-in day
    pub check_in_date: NaiveDate,
    /// Check-out day
    pub check_out_date: NaiveDate,
    /// Property slug
    pub property_slug: String,
}

/// `POST /coupons/validate` response body: either a percentage or an error
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    /// Discount percentage for a valid code
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    /// Service error message for an invalid code
    #[serde(default)]
    pub error: Option<String>,
}

impl CouponResponse {
    /// Map the response onto a discount percentage
    ///
    /// # Errors
    ///
    /// Returns the classified [`CouponError`] when the service reports an
    /// error, and [`CouponError::Invalid`] when the percentage is missing or
    /// outside `(0, 100]`.
    pub fn into_percentage(self) -> Result<f64, CouponError> {
        if let Some(message) = self.error {
            return Err(CouponError::from_service_message(&message));
        }
        match self.discount_percentage {
            Some(percentage) if percentage > 0.0 && percentage <= 100.0 => Ok(percentage),
            _ => Err(CouponError::Invalid),
        }
    }
}

/// Coupon gateway trait
pub trait CouponGateway: Send + Sync {
    /// Validate a code against the selected stay and return its percentage
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] describing why the code cannot be applied
    fn validate(&self, request: CouponRequest) -> GatewayFuture<f64, CouponError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn percentage_or_classified_error() {
        let ok: CouponResponse = serde_json::from_str(r#"{"discountPercentage": 15}"#).unwrap();
        assert_eq!(ok.into_percentage(), Ok(15.0));

        let expired: CouponResponse = serde_json::from_str(r#"{"error": "Coupon expired"}"#).unwrap();
        assert_eq!(expired.into_percentage(), Err(CouponError::Expired));

        let zero: CouponResponse = serde_json::from_str(r#"{"discountPercentage": 0}"#).unwrap();
        assert_eq!(zero.into_percentage(), Err(CouponError::Invalid));

        assert_eq!(CouponResponse::default().into_percentage(), Err(CouponError::Invalid));
    }
}
