//! Rental property settings the booking engine reads.

use crate::currency::CurrencyCode;
use serde::{Deserialize, Serialize};

/// Immutable property settings for one booking session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Backend identifier (sent to the pricing service)
    pub id: String,
    /// URL slug; also scopes persisted session storage
    pub slug: String,
    /// Display name
    pub name: String,
    /// Currency rates and fees are stored in
    pub base_currency: CurrencyCode,
    /// Guests included in the nightly rate
    pub base_occupancy: u32,
    /// Maximum guests allowed
    pub max_guests: u32,
    /// Default minimum stay in nights
    pub default_minimum_stay: u32,
    /// Hold fee in base currency
    pub hold_fee_amount: f64,
    /// How long a hold keeps the dates
    pub hold_duration_hours: u32,
    /// Whether the hold fee is credited/refunded on full booking
    pub hold_fee_refundable: bool,
}

impl Property {
    /// Clamp a requested guest count into `[1, max_guests]`
    #[must_use]
    pub fn clamp_guests(&self, requested: u32) -> u32 {
        requested.clamp(1, self.max_guests.max(1))
    }

    /// Whether the property offers paid holds
    #[must_use]
    pub fn supports_holds(&self) -> bool {
        self.hold_fee_amount > 0.0 && self.hold_duration_hours > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property() -> Property {
        Property {
            id: "prop-1".to_string(),
            slug: "villa-sol".to_string(),
            name: "Villa Sol".to_string(),
            base_currency: CurrencyCode::new("EUR"),
            base_occupancy: 4,
            max_guests: 6,
            default_minimum_stay: 2,
            hold_fee_amount: 50.0,
            hold_duration_hours: 24,
            hold_fee_refundable: true,
        }
    }

    #[test]
    fn guest_count_is_clamped() {
        let property = property();
        assert_eq!(property.clamp_guests(0), 1);
        assert_eq!(property.clamp_guests(5), 5);
        assert_eq!(property.clamp_guests(12), 6);
    }

    #[test]
    fn holds_need_fee_and_duration() {
        let mut property = property();
        assert!(property.supports_holds());
        property.hold_duration_hours = 0;
        assert!(!property.supports_holds());
    }
}
