//! Hosted payment checkout sessions.

use super::records::BookingId;
use super::GatewayFuture;
use crate::error::PaymentSessionError;
use serde::{Deserialize, Serialize};
use staybook_core::currency::{ConvertedAmount, CurrencyCode};

/// What the payment session charges for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// Full stay
    Booking,
    /// Hold fee
    Hold,
}

/// `POST /checkout/sessions` request body
///
/// Built from a [`ConvertedAmount`] only, so the charged minor units always
/// match the amount shown to the visitor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PaymentSessionRequest {
    /// Property slug
    pub property_slug: String,
    /// Record the payment settles
    pub booking_id: BookingId,
    /// Amount in minor units of `currency`
    pub unit_amount: i64,
    /// Charge currency
    pub currency: CurrencyCode,
    /// Receipt address
    pub guest_email: String,
    /// Where the processor sends the visitor after paying
    pub success_url: String,
    /// Where the processor sends the visitor after cancelling
    pub cancel_url: String,
    /// Full stay or hold
    pub kind: PaymentKind,
    /// Line-item description
    pub description: String,
}

impl PaymentSessionRequest {
    /// Build a request charging exactly `charge`
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        property_slug: &str,
        booking_id: BookingId,
        charge: &ConvertedAmount,
        guest_email: &str,
        success_url: String,
        cancel_url: String,
        kind: PaymentKind,
        description: String,
    ) -> Self {
        Self {
            property_slug: property_slug.to_string(),
            booking_id,
            unit_amount: charge.minor_units(),
            currency: charge.currency.clone(),
            guest_email: guest_email.trim().to_string(),
            success_url,
            cancel_url,
            kind,
            description,
        }
    }
}

/// An opened payment session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    /// Processor session identifier
    pub session_id: String,
    /// Hosted checkout page to redirect to
    pub session_url: String,
}

/// `POST /checkout/sessions` response body
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionResponse {
    /// Processor session identifier
    #[serde(default)]
    pub session_id: Option<String>,
    /// Hosted checkout URL
    #[serde(default, alias = "url")]
    pub session_url: Option<String>,
    /// Service error message
    #[serde(default)]
    pub error: Option<String>,
}

impl PaymentSessionResponse {
    /// Extract the session
    ///
    /// # Errors
    ///
    /// Returns [`PaymentSessionError::Rejected`] for a service error and
    /// [`PaymentSessionError::MissingUrl`] when no redirect URL came back.
    pub fn into_session(self) -> Result<PaymentSession, PaymentSessionError> {
        if let Some(message) = self.error {
            return Err(PaymentSessionError::Rejected(message));
        }
        match self.session_url {
            Some(session_url) if !session_url.is_empty() => Ok(PaymentSession {
                session_id: self.session_id.unwrap_or_default(),
                session_url,
            }),
            _ => Err(PaymentSessionError::MissingUrl),
        }
    }
}

/// Payment session gateway trait
///
/// Abstraction over hosted checkout providers.
pub trait PaymentSessionGateway: Send + Sync {
    /// Open a hosted checkout session
    ///
    /// # Errors
    ///
    /// Returns [`PaymentSessionError`] if the session could not be created
    fn create_session(
        &self,
        request: PaymentSessionRequest,
    ) -> GatewayFuture<PaymentSession, PaymentSessionError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn session_requires_url() {
        let ok: PaymentSessionResponse =
            serde_json::from_str(r#"{"sessionId": "cs_1", "sessionUrl": "https://pay/cs_1"}"#).unwrap();
        assert_eq!(ok.into_session().unwrap().session_id, "cs_1");

        let no_url: PaymentSessionResponse = serde_json::from_str(r#"{"sessionId": "cs_1"}"#).unwrap();
        assert_eq!(no_url.into_session(), Err(PaymentSessionError::MissingUrl));

        let rejected: PaymentSessionResponse = serde_json::from_str(r#"{"error": "card processor down"}"#).unwrap();
        assert!(matches!(rejected.into_session(), Err(PaymentSessionError::Rejected(_))));
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PaymentKind::Hold).unwrap(), r#""hold""#);
    }
}
