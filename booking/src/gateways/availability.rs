//! Unavailable-date lookup.

use super::GatewayFuture;
use crate::error::AvailabilityError;
use serde::Deserialize;
use staybook_core::dates::parse_iso_date;
use staybook_core::NaiveDate;
use std::collections::BTreeSet;

/// Availability gateway trait
///
/// Loaded once per session on mount; the result feeds the date rules.
pub trait AvailabilityGateway: Send + Sync {
    /// Fetch the blocked nights for a property over the next `months`
    ///
    /// # Errors
    ///
    /// Returns [`AvailabilityError`] when the service cannot be reached or
    /// answers with something unreadable
    fn unavailable_dates(
        &self,
        property_slug: &str,
        months: u32,
    ) -> GatewayFuture<BTreeSet<NaiveDate>, AvailabilityError>;
}

/// `GET /availability` response body
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    /// Blocked nights as `YYYY-MM-DD` strings
    #[serde(default)]
    pub unavailable_dates: Vec<String>,
}

impl AvailabilityResponse {
    /// Parse the date list, skipping (and logging) entries that are not dates
    #[must_use]
    pub fn into_dates(self) -> BTreeSet<NaiveDate> {
        self.unavailable_dates
            .iter()
            .filter_map(|raw| match parse_iso_date(raw) {
                Ok(date) => Some(date),
                Err(error) => {
                    tracing::warn!(%error, "Skipping malformed unavailable date");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_dates_and_skips_garbage() {
        let response: AvailabilityResponse = serde_json::from_str(
            r#"{"unavailableDates": ["2026-03-10", "2026-03-11T00:00:00.000Z", "soon", "2026-03-10"]}"#,
        )
        .unwrap();
        let dates = response.into_dates();
        assert_eq!(dates.len(), 2);
        assert!(dates.contains(&NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()));
    }

    #[test]
    fn missing_list_means_fully_open() {
        let response: AvailabilityResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_dates().is_empty());
    }
}
