//! Date constraint resolution.
//!
//! Decides which calendar days a visitor may pick as check-in and check-out
//! for a property, given its blocked nights, its minimum stay and today's
//! date. Everything works on [`NaiveDate`] so comparisons are by calendar
//! day and never drift with time zones or time of day.
//!
//! # Back-to-back turnover
//!
//! A blocked date `D` means the *night* of `D` is taken. A new guest may still
//! check out on `D` (they leave in the morning) and may check in on `D + 1`.
//! So blocked dates are disabled for check-in as-is, but for check-out they
//! are shifted forward one day: checking out on `D + 1` would require
//! sleeping the night of `D`.

use crate::error::{DateParseError, StayError};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Number of nights between two calendar days.
///
/// Negative when `check_out` precedes `check_in`.
#[must_use]
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

/// Parse a date-only string (`YYYY-MM-DD`).
///
/// Full ISO timestamps are accepted and truncated to their calendar day,
/// since availability feeds sometimes send `2026-03-10T00:00:00.000Z`.
///
/// # Errors
///
/// Returns [`DateParseError`] if the input is not a valid calendar day.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();
    let day = match trimmed.char_indices().nth(10) {
        Some((idx, 'T')) => &trimmed[..idx],
        _ => trimmed,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| DateParseError {
        input: input.to_string(),
    })
}

/// Format a calendar day as `YYYY-MM-DD`.
#[must_use]
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Date selection rules for one property on one day.
#[derive(Debug, Clone, Copy)]
pub struct DateConstraints<'a> {
    unavailable: &'a BTreeSet<NaiveDate>,
    today: NaiveDate,
    minimum_stay: u32,
}

impl<'a> DateConstraints<'a> {
    /// Build the rules. A minimum stay of zero is treated as one night.
    #[must_use]
    pub fn new(unavailable: &'a BTreeSet<NaiveDate>, today: NaiveDate, minimum_stay: u32) -> Self {
        Self {
            unavailable,
            today,
            minimum_stay: minimum_stay.max(1),
        }
    }

    /// Effective minimum stay in nights
    #[must_use]
    pub const fn minimum_stay(&self) -> u32 {
        self.minimum_stay
    }

    /// Whether `date` is blocked at the property level
    #[must_use]
    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.unavailable.contains(&date)
    }

    /// Check-in is disabled for blocked dates and dates before today.
    #[must_use]
    pub fn is_check_in_disabled(&self, date: NaiveDate) -> bool {
        date < self.today || self.is_blocked(date)
    }

    /// Check-out is disabled for:
    ///
    /// - the day after any blocked date (back-to-back shift)
    /// - with a check-in chosen: the check-in itself, anything before it, and
    ///   every day in `[check_in, check_in + minimum_stay)`
    /// - without a check-in: today and anything before it
    #[must_use]
    pub fn is_check_out_disabled(&self, date: NaiveDate, check_in: Option<NaiveDate>) -> bool {
        let after_blocked_night = date.pred_opt().is_some_and(|night| self.is_blocked(night));
        if after_blocked_night {
            return true;
        }

        match check_in {
            Some(check_in) => nights(check_in, date) < i64::from(self.minimum_stay),
            None => date <= self.today,
        }
    }

    /// A `[start, end)` stay is available iff none of its nights is blocked.
    #[must_use]
    pub fn is_range_available(&self, start: NaiveDate, end: NaiveDate) -> bool {
        if start >= end {
            return true;
        }
        self.unavailable.range(start..end).next().is_none()
    }

    /// Check that a pair of dates is a legal stay and return its nights.
    ///
    /// # Errors
    ///
    /// Returns the first [`StayError`] found, checking order first, then
    /// minimum stay, then blocked dates.
    pub fn validate_stay(&self, check_in: NaiveDate, check_out: NaiveDate) -> Result<u32, StayError> {
        let count = nights(check_in, check_out);
        if count <= 0 {
            return Err(StayError::CheckOutNotAfterCheckIn);
        }
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        if count < self.minimum_stay {
            return Err(StayError::BelowMinimumStay {
                nights: count,
                minimum: self.minimum_stay,
            });
        }
        if self.is_check_in_disabled(check_in) {
            return Err(StayError::CheckInUnavailable);
        }
        if self.is_check_out_disabled(check_out, Some(check_in)) {
            return Err(StayError::CheckOutUnavailable);
        }
        if !self.is_range_available(check_in, check_out) {
            return Err(StayError::RangeUnavailable);
        }
        Ok(count)
    }

    /// Disabled check-in days in `[from, to)`, for calendar rendering
    #[must_use]
    pub fn disabled_check_in_dates(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        from.iter_days()
            .take_while(|day| *day < to)
            .filter(|day| self.is_check_in_disabled(*day))
            .collect()
    }

    /// Disabled check-out days in `[from, to)`, for calendar rendering
    #[must_use]
    pub fn disabled_check_out_dates(
        &self,
        check_in: Option<NaiveDate>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<NaiveDate> {
        from.iter_days()
            .take_while(|day| *day < to)
            .filter(|day| self.is_check_out_disabled(*day, check_in))
            .collect()
    }

    /// Earliest day that completes a legal stay from `check_in`, looking at
    /// most `horizon_days` ahead.
    #[must_use]
    pub fn first_valid_check_out(&self, check_in: NaiveDate, horizon_days: u32) -> Option<NaiveDate> {
        check_in
            .iter_days()
            .skip(1)
            .take(horizon_days as usize)
            .find(|day| self.validate_stay(check_in, *day).is_ok())
    }
}
