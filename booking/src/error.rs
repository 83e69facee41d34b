//! Error taxonomy for the booking engine.
//!
//! Every error here is recoverable: it is stored in session state (or
//! returned to the caller) and paired with a retry path. None of them tear
//! down the session.

use serde::{Deserialize, Serialize};
use staybook_core::error::ValidationError;
use thiserror::Error;

/// Transport-level failure talking to an external service
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GatewayError {
    /// Request could not be sent or the connection failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be parsed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Service answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Request timed out
    #[error("Request timed out")]
    Timeout,
}

/// Loading the property's unavailable dates failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Could not load availability: {0}")]
pub struct AvailabilityError(pub GatewayError);

impl AvailabilityError {
    /// Message shown above the calendar with a retry button
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        "We couldn't load availability for this property. Please try again."
    }
}

/// Why the pricing service declined to price a stay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PricingUnavailable {
    /// Stay is shorter than the minimum for this check-in
    #[error("Minimum stay is {required} nights")]
    MinimumStay {
        /// Nights required
        required: u32,
    },

    /// Dates overlap an existing booking
    #[error("Selected dates are not available")]
    DateConflict,
}

/// Pricing lookup failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PricingError {
    /// The service answered but the stay cannot be priced
    #[error(transparent)]
    Unavailable(#[from] PricingUnavailable),

    /// The service could not be reached
    #[error("Could not load pricing: {0}")]
    Gateway(#[from] GatewayError),
}

impl PricingError {
    /// Message shown in place of the price breakdown
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unavailable(PricingUnavailable::MinimumStay { required }) => {
                format!("This property requires a minimum stay of {required} nights for these dates.")
            }
            Self::Unavailable(PricingUnavailable::DateConflict) => {
                "These dates are not available. Please choose different dates.".to_string()
            }
            Self::Gateway(_) => "We couldn't calculate pricing right now. Please try again.".to_string(),
        }
    }

    /// Transport failures are worth retrying as-is; the service's own
    /// refusals need different input
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway(_))
    }
}

/// Coupon could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CouponError {
    /// Code does not exist
    #[error("Invalid coupon code")]
    Invalid,

    /// Code exists but has expired
    #[error("This coupon has expired")]
    Expired,

    /// Code does not apply to the selected dates or property
    #[error("This coupon is not valid for the selected dates")]
    NotApplicable,

    /// Dates must be chosen before a coupon can be checked
    #[error("Please select your dates before applying a coupon")]
    MissingDates,

    /// The service rejected the code with its own message
    #[error("{0}")]
    Rejected(String),

    /// The validation service could not be reached
    #[error("Could not validate coupon: {0}")]
    Gateway(GatewayError),
}

impl CouponError {
    /// Map a service error message onto the taxonomy
    #[must_use]
    pub fn from_service_message(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if lowered.contains("expired") {
            Self::Expired
        } else if lowered.contains("not valid for") || lowered.contains("not applicable") {
            Self::NotApplicable
        } else if lowered.contains("invalid") || lowered.contains("not found") {
            Self::Invalid
        } else {
            Self::Rejected(message.to_string())
        }
    }
}

/// Creating a booking, hold or inquiry record failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RecordError {
    /// The service refused the record
    #[error("{0}")]
    Rejected(String),

    /// The service could not be reached
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Creating a payment checkout session failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PaymentSessionError {
    /// The payment provider refused the session
    #[error("{0}")]
    Rejected(String),

    /// Session was created but carried no redirect URL
    #[error("Payment session has no redirect URL")]
    MissingUrl,

    /// The service could not be reached
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Checkout failure surfaced to the caller
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum CheckoutError {
    /// Local preconditions failed; nothing was sent
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationError),

    /// The booking/hold/inquiry record could not be created
    #[error("Booking creation failed: {0}")]
    BookingCreationFailed(RecordError),

    /// The record exists but no payment session could be opened
    #[error("Checkout session failed: {0}")]
    CheckoutSessionFailed(PaymentSessionError),

    /// Anything else
    #[error("Unexpected checkout error: {0}")]
    Unexpected(String),
}

impl CheckoutError {
    /// Stable kind label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "validation-failed",
            Self::BookingCreationFailed(_) => "booking-creation-failed",
            Self::CheckoutSessionFailed(_) => "checkout-session-failed",
            Self::Unexpected(_) => "unexpected",
        }
    }

    /// Banner text shown to the visitor
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationFailed(error) => error.to_string(),
            Self::BookingCreationFailed(_) => {
                "We couldn't create your booking. You have not been charged. Please try again.".to_string()
            }
            Self::CheckoutSessionFailed(_) => {
                "We couldn't start the payment. You have not been charged. Please try again.".to_string()
            }
            Self::Unexpected(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Whether the banner offers a retry button
    ///
    /// Validation failures are fixed by editing the form instead.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::ValidationFailed(_))
    }
}

/// Store runtime errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store is shutting down and no longer accepts actions
    #[error("Store is shutting down")]
    ShutdownInProgress,

    /// Waiting for effects to settle timed out
    #[error("Timed out waiting for effects to settle")]
    Timeout,
}

/// Configuration could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable had a value that could not be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Rejected value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coupon_messages_map_to_kinds() {
        assert_eq!(CouponError::from_service_message("Coupon has expired"), CouponError::Expired);
        assert_eq!(
            CouponError::from_service_message("Coupon not valid for these dates"),
            CouponError::NotApplicable
        );
        assert_eq!(CouponError::from_service_message("Invalid coupon code"), CouponError::Invalid);
        assert_eq!(
            CouponError::from_service_message("Limit reached"),
            CouponError::Rejected("Limit reached".to_string())
        );
    }

    #[test]
    fn checkout_errors_have_distinct_messages() {
        let errors = [
            CheckoutError::ValidationFailed(ValidationError::MissingDates),
            CheckoutError::BookingCreationFailed(RecordError::Rejected("dup".to_string())),
            CheckoutError::CheckoutSessionFailed(PaymentSessionError::MissingUrl),
            CheckoutError::Unexpected("boom".to_string()),
        ];
        let messages: std::collections::HashSet<_> = errors.iter().map(CheckoutError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
        assert!(!errors[0].is_retryable());
        assert!(errors[1..].iter().all(CheckoutError::is_retryable));
        assert_eq!(errors[2].kind(), "checkout-session-failed");
    }

    #[test]
    fn minimum_stay_message_names_required_nights() {
        let error = PricingError::from(PricingUnavailable::MinimumStay { required: 5 });
        assert!(error.user_message().contains("5 nights"));
        assert!(!error.is_retryable());
    }
}
