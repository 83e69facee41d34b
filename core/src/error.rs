//! Error types shared by the pure domain modules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A date string could not be read as a calendar day
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{input}': expected YYYY-MM-DD")]
pub struct DateParseError {
    /// The rejected input
    pub input: String,
}

/// Why a check-in/check-out pair is not a legal stay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StayError {
    /// Check-out is on or before check-in
    #[error("check-out must be after check-in")]
    CheckOutNotAfterCheckIn,

    /// Stay is shorter than the property allows
    #[error("minimum stay is {minimum} nights (selected {nights})")]
    BelowMinimumStay {
        /// Nights selected
        nights: u32,
        /// Nights required
        minimum: u32,
    },

    /// Check-in date is blocked or in the past
    #[error("check-in date is not available")]
    CheckInUnavailable,

    /// Check-out date is disabled for this check-in
    #[error("check-out date is not available")]
    CheckOutUnavailable,

    /// A night inside the stay is already booked
    #[error("selected dates include unavailable nights")]
    RangeUnavailable,
}

/// A guest-info field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GuestField {
    /// First name
    FirstName,
    /// Last name
    LastName,
    /// Email address
    Email,
    /// Phone number
    Phone,
}

impl std::fmt::Display for GuestField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
        };
        f.write_str(name)
    }
}

/// Inline error shown next to a form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field
    pub field: GuestField,
    /// Message shown next to it
    pub message: String,
}

/// Local, pre-network validation failure
///
/// Blocks an action before any gateway is called.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// No checkout path chosen
    #[error("please choose how you would like to proceed")]
    NoActionSelected,

    /// The property does not offer paid holds
    #[error("this property does not offer holds")]
    HoldsUnavailable,

    /// Check-in or check-out missing
    #[error("please select check-in and check-out dates")]
    MissingDates,

    /// No pricing snapshot for the current selection
    #[error("pricing is not available for the selected stay")]
    MissingPricing,

    /// Selected dates do not form a legal stay
    #[error("{0}")]
    Stay(StayError),

    /// One or more guest fields are invalid
    #[error("please correct the highlighted fields")]
    Fields(Vec<FieldError>),

    /// Amount to charge is zero or negative
    #[error("amount to charge must be greater than zero")]
    NonPositiveAmount,
}

impl ValidationError {
    /// Field-level errors, empty for non-field failures
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Fields(errors) => errors,
            _ => &[],
        }
    }
}
