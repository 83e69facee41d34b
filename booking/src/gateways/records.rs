//! Booking, hold and inquiry record creation.
//!
//! Every paid path creates its record first and only then opens a payment
//! session against the returned [`BookingId`].

use super::GatewayFuture;
use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use staybook_core::currency::{ConvertedAmount, ConvertedQuote, CurrencyCode};
use staybook_core::guest::GuestInfo;
use staybook_core::{DateTime, NaiveDate, Utc};

/// Identifier of a created booking, hold or inquiry record
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Wrap a service-issued identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pending full booking (`POST /bookings`)
///
/// Every monetary field is already in the display currency.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    /// Property slug
    pub property_slug: String,
    /// Backend property identifier
    pub property_id: String,
    /// Guest contact details
    pub guest_info: GuestInfo,
    /// Check-in day
    pub check_in: NaiveDate,
    /// Check-out day
    pub check_out: NaiveDate,
    /// Guest count
    pub guests: u32,
    /// Converted price breakdown
    pub pricing: ConvertedQuote,
    /// Applied coupon code
    pub coupon_code: Option<String>,
}

/// Paid hold on the dates (`POST /bookings/hold`)
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldRecord {
    /// Property slug
    pub property_slug: String,
    /// Backend property identifier
    pub property_id: String,
    /// Guest contact details
    pub guest_info: GuestInfo,
    /// Check-in day
    pub check_in: NaiveDate,
    /// Check-out day
    pub check_out: NaiveDate,
    /// Guest count
    pub guests: u32,
    /// Hold fee in the display currency
    pub hold_fee: f64,
    /// Currency of `hold_fee`
    pub currency: CurrencyCode,
    /// When the hold lapses
    pub hold_until: DateTime<Utc>,
    /// Whether the fee is credited on a full booking
    pub refundable: bool,
}

/// Non-paying inquiry (`POST /inquiries`)
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryRecord {
    /// Property slug
    pub property_slug: String,
    /// Backend property identifier
    pub property_id: String,
    /// Guest contact details
    pub guest_info: GuestInfo,
    /// Check-in day
    pub check_in: NaiveDate,
    /// Check-out day
    pub check_out: NaiveDate,
    /// Guest count
    pub guests: u32,
    /// Message to the host
    pub message: Option<String>,
    /// Informational total in the display currency
    pub estimated_total: ConvertedAmount,
}

/// Response body shared by the three record endpoints
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    /// Created record identifier
    #[serde(default, alias = "inquiryId")]
    pub booking_id: Option<String>,
    /// Service error message
    #[serde(default)]
    pub error: Option<String>,
}

impl RecordResponse {
    /// Extract the record identifier
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Rejected`] with the service message, or a
    /// generic one when the body has neither field.
    pub fn into_id(self) -> Result<BookingId, RecordError> {
        match (self.booking_id, self.error) {
            (_, Some(message)) => Err(RecordError::Rejected(message)),
            (Some(id), None) if !id.is_empty() => Ok(BookingId(id)),
            _ => Err(RecordError::Rejected("response carried no record id".to_string())),
        }
    }
}

/// Booking record gateway trait
pub trait BookingRecordGateway: Send + Sync {
    /// Create a pending booking awaiting payment
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the record could not be created
    fn create_booking(&self, record: BookingRecord) -> GatewayFuture<BookingId, RecordError>;

    /// Create a hold awaiting the hold-fee payment
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the record could not be created
    fn create_hold(&self, record: HoldRecord) -> GatewayFuture<BookingId, RecordError>;

    /// Create an inquiry; no payment follows
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the record could not be created
    fn create_inquiry(&self, record: InquiryRecord) -> GatewayFuture<BookingId, RecordError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn response_yields_id_or_rejection() {
        let ok: RecordResponse = serde_json::from_str(r#"{"bookingId": "bk_1"}"#).unwrap();
        assert_eq!(ok.into_id(), Ok(BookingId::new("bk_1")));

        let inquiry: RecordResponse = serde_json::from_str(r#"{"inquiryId": "inq_9"}"#).unwrap();
        assert_eq!(inquiry.into_id().unwrap().as_str(), "inq_9");

        let rejected: RecordResponse = serde_json::from_str(r#"{"error": "Dates taken"}"#).unwrap();
        assert_eq!(rejected.into_id(), Err(RecordError::Rejected("Dates taken".to_string())));

        assert!(RecordResponse::default().into_id().is_err());
    }
}
