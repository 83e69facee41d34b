//! Guest contact details collected by the booking form.

use crate::error::{FieldError, GuestField, ValidationError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

static PHONE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ().\-]{6,20}$").ok());

/// Whether `email` looks like a deliverable address
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email.trim()))
}

/// Whether `phone` looks like a phone number
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(phone.trim()))
}

/// Guest contact details
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfo {
    /// First name
    #[serde(default)]
    pub first_name: String,
    /// Last name
    #[serde(default)]
    pub last_name: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Phone number
    #[serde(default)]
    pub phone: String,
    /// Free-form message to the host
    #[serde(default)]
    pub message: Option<String>,
}

/// A partial update from a form field change
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfoPatch {
    /// New first name
    pub first_name: Option<String>,
    /// New last name
    pub last_name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New phone
    pub phone: Option<String>,
    /// New message (`Some("")` clears it)
    pub message: Option<String>,
}

impl GuestInfo {
    /// Apply a partial update
    pub fn apply(&mut self, patch: GuestInfoPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(message) = patch.message {
            self.message = if message.trim().is_empty() {
                None
            } else {
                Some(message)
            };
        }
    }

    /// Full name for records and payment sessions
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Check the required fields. Phone is optional when `require_phone`
    /// is false (inquiries).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Fields`] listing every invalid field.
    pub fn validate(&self, require_phone: bool) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        let mut reject = |field, message: &str| {
            errors.push(FieldError {
                field,
                message: message.to_string(),
            });
        };

        if self.first_name.trim().is_empty() {
            reject(GuestField::FirstName, "First name is required");
        }
        if self.last_name.trim().is_empty() {
            reject(GuestField::LastName, "Last name is required");
        }
        if self.email.trim().is_empty() {
            reject(GuestField::Email, "Email is required");
        } else if !is_valid_email(&self.email) {
            reject(GuestField::Email, "Please enter a valid email address");
        }
        let phone = self.phone.trim();
        if phone.is_empty() {
            if require_phone {
                reject(GuestField::Phone, "Phone number is required");
            }
        } else if !is_valid_phone(phone) {
            reject(GuestField::Phone, "Please enter a valid phone number");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(errors))
        }
    }
}
