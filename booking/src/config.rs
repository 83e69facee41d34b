//! Configuration for the booking engine.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use staybook_core::currency::CurrencyCode;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Base URL of the booking API (availability, pricing, records, payments)
    pub api_base_url: String,
    /// Public site URL used to build payment callback URLs
    pub site_url: String,
    /// Quiet period before auto-pricing fires, in milliseconds
    pub pricing_debounce_ms: u64,
    /// How many months of availability to load on mount
    pub availability_months: u32,
    /// Display currency when the visitor has not picked one
    pub default_currency: Option<CurrencyCode>,
    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            site_url: "http://localhost:3000".to_string(),
            pricing_debounce_ms: 500,
            availability_months: 12,
            default_currency: None,
            http_timeout_secs: 15,
        }
    }
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a numeric variable is set
    /// but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a numeric variable is set
    /// but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let base = |name| lookup(name).filter(|value: &String| !value.trim().is_empty());

        Ok(Self {
            api_base_url: base("STAYBOOK_API_BASE_URL").unwrap_or(defaults.api_base_url),
            site_url: base("STAYBOOK_SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            pricing_debounce_ms: parse_var(
                "STAYBOOK_PRICING_DEBOUNCE_MS",
                base("STAYBOOK_PRICING_DEBOUNCE_MS"),
                defaults.pricing_debounce_ms,
            )?,
            availability_months: parse_var(
                "STAYBOOK_AVAILABILITY_MONTHS",
                base("STAYBOOK_AVAILABILITY_MONTHS"),
                defaults.availability_months,
            )?,
            default_currency: base("STAYBOOK_DEFAULT_CURRENCY").map(CurrencyCode::new),
            http_timeout_secs: parse_var(
                "STAYBOOK_HTTP_TIMEOUT_SECS",
                base("STAYBOOK_HTTP_TIMEOUT_SECS"),
                defaults.http_timeout_secs,
            )?,
        })
    }

    /// Debounce window for auto-pricing
    #[must_use]
    pub const fn pricing_debounce(&self) -> Duration {
        Duration::from_millis(self.pricing_debounce_ms)
    }

    /// Per-request HTTP timeout
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}
