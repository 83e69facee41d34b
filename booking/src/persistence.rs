//! Session persistence and rehydration.
//!
//! Selected values are mirrored into a per-property key/value store
//! (`booking:<slug>:<key>`) so a reload resumes the session. On mount the
//! URL query string wins over stored values, field by field.
//!
//! Both the storage and the URL query are ports, injected by the host.

use crate::state::SelectedAction;
use staybook_core::currency::CurrencyCode;
use staybook_core::dates::{format_iso_date, parse_iso_date};
use staybook_core::guest::{GuestInfo, GuestInfoPatch};
use staybook_core::storage::{SessionKey, SessionWrite};
use staybook_core::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Key/value storage scoped to the visitor's browsing session
pub trait SessionStorage: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str);

    /// Delete a value
    fn remove(&self, key: &str);
}

/// Read access to the page URL's query parameters
pub trait QueryParams: Send + Sync {
    /// First value of a parameter
    fn get(&self, name: &str) -> Option<String>;
}

/// In-process [`SessionStorage`]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored entry
    #[must_use]
    pub fn entries(&self) -> HashMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Parsed URL query string
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryString {
    params: HashMap<String, String>,
}

impl QueryString {
    /// Parse `a=1&b=2` (a leading `?` is ignored). The first occurrence of a
    /// repeated parameter wins.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = HashMap::new();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.entry(name.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { params }
    }
}

impl QueryParams for QueryString {
    fn get(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }
}

/// Session storage scoped to one property
#[derive(Clone)]
pub struct SessionPersistence {
    storage: Arc<dyn SessionStorage>,
    property_slug: String,
}

impl std::fmt::Debug for SessionPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPersistence")
            .field("property_slug", &self.property_slug)
            .finish_non_exhaustive()
    }
}

impl SessionPersistence {
    /// Scope `storage` to a property slug
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>, property_slug: impl Into<String>) -> Self {
        Self {
            storage,
            property_slug: property_slug.into(),
        }
    }

    /// Apply a write
    pub fn apply(&self, write: &SessionWrite) {
        let key = write.key.scoped(&self.property_slug);
        match &write.value {
            Some(value) => self.storage.set(&key, value),
            None => self.storage.remove(&key),
        }
    }

    /// Read a stored value
    #[must_use]
    pub fn read(&self, key: SessionKey) -> Option<String> {
        self.storage.get(&key.scoped(&self.property_slug))
    }

    /// Remove every value for this property
    pub fn clear(&self) {
        for key in SessionKey::ALL {
            self.apply(&SessionWrite::remove(key));
        }
    }
}

// ============================================================================
// Value encoding
// ============================================================================

/// Write for the check-in date
#[must_use]
pub fn check_in_write(date: Option<NaiveDate>) -> SessionWrite {
    date_write(SessionKey::CheckIn, date)
}

/// Write for the check-out date
#[must_use]
pub fn check_out_write(date: Option<NaiveDate>) -> SessionWrite {
    date_write(SessionKey::CheckOut, date)
}

fn date_write(key: SessionKey, date: Option<NaiveDate>) -> SessionWrite {
    date.map_or_else(
        || SessionWrite::remove(key),
        |date| SessionWrite::set(key, format_iso_date(date)),
    )
}

/// Write for the guest count
#[must_use]
pub fn guests_write(guests: u32) -> SessionWrite {
    SessionWrite::set(SessionKey::Guests, guests.to_string())
}

/// Write for the selected action
#[must_use]
pub fn action_write(action: SelectedAction) -> SessionWrite {
    match action {
        SelectedAction::None => SessionWrite::remove(SessionKey::Action),
        action => SessionWrite::set(SessionKey::Action, action.as_str()),
    }
}

/// Write for the guest contact details
#[must_use]
pub fn guest_info_write(info: &GuestInfo) -> SessionWrite {
    match serde_json::to_string(info) {
        Ok(json) => SessionWrite::set(SessionKey::GuestInfo, json),
        Err(error) => {
            tracing::warn!(%error, "Could not serialize guest info, dropping persisted copy");
            SessionWrite::remove(SessionKey::GuestInfo)
        }
    }
}

/// Write for the display currency
#[must_use]
pub fn currency_write(currency: &CurrencyCode) -> SessionWrite {
    SessionWrite::set(SessionKey::Currency, currency.as_str())
}

// ============================================================================
// Rehydration
// ============================================================================

/// Values recovered on mount, before any constraint is applied
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoredSession {
    /// Check-in day
    pub check_in: Option<NaiveDate>,
    /// Check-out day
    pub check_out: Option<NaiveDate>,
    /// Guest count
    pub guests: Option<u32>,
    /// Selected action
    pub action: Option<SelectedAction>,
    /// Guest contact details
    pub guest_info: Option<GuestInfo>,
    /// Display currency
    pub currency: Option<CurrencyCode>,
}

impl RestoredSession {
    /// Recover values from the URL first, then from storage, field by field.
    ///
    /// Unparseable values are skipped, so a bad URL parameter falls back to
    /// the stored value.
    #[must_use]
    pub fn rehydrate(query: &dyn QueryParams, persistence: &SessionPersistence) -> Self {
        let pick = |key: SessionKey| {
            let from_query = query.get(key.as_str()).filter(|value| !value.trim().is_empty());
            let from_storage = move || persistence.read(key);
            (from_query, from_storage)
        };

        let date = |key: SessionKey| {
            let (from_query, from_storage) = pick(key);
            from_query
                .and_then(|raw| parse_logged(key, &raw, |raw| parse_iso_date(raw).ok()))
                .or_else(|| from_storage().and_then(|raw| parse_logged(key, &raw, |raw| parse_iso_date(raw).ok())))
        };

        let guests = {
            let (from_query, from_storage) = pick(SessionKey::Guests);
            let parse = |raw: &str| raw.trim().parse::<u32>().ok();
            from_query
                .and_then(|raw| parse_logged(SessionKey::Guests, &raw, parse))
                .or_else(|| from_storage().and_then(|raw| parse_logged(SessionKey::Guests, &raw, parse)))
        };

        let action = {
            let (from_query, from_storage) = pick(SessionKey::Action);
            from_query
                .and_then(|raw| parse_logged(SessionKey::Action, &raw, SelectedAction::parse))
                .or_else(|| {
                    from_storage().and_then(|raw| parse_logged(SessionKey::Action, &raw, SelectedAction::parse))
                })
        };

        let currency = {
            let (from_query, from_storage) = pick(SessionKey::Currency);
            let parse = |raw: &str| {
                let code = CurrencyCode::new(raw);
                (code.as_str().len() == 3 && code.as_str().chars().all(|c| c.is_ascii_alphabetic()))
                    .then_some(code)
            };
            from_query
                .and_then(|raw| parse_logged(SessionKey::Currency, &raw, parse))
                .or_else(|| from_storage().and_then(|raw| parse_logged(SessionKey::Currency, &raw, parse)))
        };

        Self {
            check_in: date(SessionKey::CheckIn),
            check_out: date(SessionKey::CheckOut),
            guests,
            action,
            guest_info: restore_guest_info(query, persistence),
            currency,
        }
    }
}

fn parse_logged<T>(key: SessionKey, raw: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(raw);
    if parsed.is_none() {
        tracing::debug!(key = %key, value = raw, "Ignoring unreadable session value");
    }
    parsed
}

/// Stored guest info with any URL-provided fields laid over it
fn restore_guest_info(query: &dyn QueryParams, persistence: &SessionPersistence) -> Option<GuestInfo> {
    let stored = persistence
        .read(SessionKey::GuestInfo)
        .and_then(|json| match serde_json::from_str::<GuestInfo>(&json) {
            Ok(info) => Some(info),
            Err(error) => {
                tracing::warn!(%error, "Ignoring malformed stored guest info");
                None
            }
        });

    let patch = GuestInfoPatch {
        first_name: query.get("firstName"),
        last_name: query.get("lastName"),
        email: query.get("email"),
        phone: query.get("phone"),
        message: query.get("message"),
    };
    let has_query_fields = patch != GuestInfoPatch::default();

    match (stored, has_query_fields) {
        (None, false) => None,
        (stored, _) => {
            let mut info = stored.unwrap_or_default();
            info.apply(patch);
            Some(info)
        }
    }
}
