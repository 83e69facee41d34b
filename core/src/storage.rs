//! Persisted session keys.
//!
//! A booking session mirrors a handful of values into a per-property
//! key/value store so a reload resumes where the visitor left off. This
//! module only names the keys and describes writes; the storage port and
//! its scoping live in the booking crate.

use serde::{Deserialize, Serialize};

/// One persisted session value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKey {
    /// Check-in date (`YYYY-MM-DD`)
    CheckIn,
    /// Check-out date (`YYYY-MM-DD`)
    CheckOut,
    /// Guest count
    Guests,
    /// Selected checkout action
    Action,
    /// Guest contact details (JSON object)
    GuestInfo,
    /// Display currency code
    Currency,
}

impl SessionKey {
    /// Every key, in the order they are read on mount
    pub const ALL: [Self; 6] = [
        Self::CheckIn,
        Self::CheckOut,
        Self::Guests,
        Self::Action,
        Self::GuestInfo,
        Self::Currency,
    ];

    /// Key suffix used under the property scope
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "checkIn",
            Self::CheckOut => "checkOut",
            Self::Guests => "guests",
            Self::Action => "action",
            Self::GuestInfo => "guestInfo",
            Self::Currency => "currency",
        }
    }

    /// Fully scoped storage key for a property
    ///
    /// ```
    /// use staybook_core::storage::SessionKey;
    /// assert_eq!(SessionKey::Guests.scoped("villa-sol"), "booking:villa-sol:guests");
    /// ```
    #[must_use]
    pub fn scoped(self, property_slug: &str) -> String {
        format!("booking:{property_slug}:{}", self.as_str())
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single write to persisted session storage
///
/// `value: None` removes the key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionWrite {
    /// Which value
    pub key: SessionKey,
    /// Serialized value, or `None` to remove it
    pub value: Option<String>,
}

impl SessionWrite {
    /// Store `value` under `key`
    #[must_use]
    pub fn set(key: SessionKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: Some(value.into()),
        }
    }

    /// Remove `key`
    #[must_use]
    pub const fn remove(key: SessionKey) -> Self {
        Self { key, value: None }
    }
}
