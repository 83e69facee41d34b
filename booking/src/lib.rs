//! # Staybook Booking
//!
//! Booking orchestration engine for a single property's booking page.
//!
//! Takes a visitor from date selection to a hosted payment page:
//!
//! - **Dates**: blocked nights, minimum stay and range checks
//! - **Pricing**: debounced server quotes, guarded against stale replies
//! - **Coupons / currency**: applied on top of the server quote
//! - **Persistence**: selection survives reloads (URL first, then storage)
//! - **Checkout**: book, hold or contact, with at most one submission in
//!   flight
//!
//! ## Core Components
//!
//! - [`BookingStore`]: runs the [`BookingReducer`] and its effects
//! - [`BookingEnvironment`]: the clock, gateways and configuration it runs with
//! - [`CheckoutOrchestrator`]: record creation, payment session and redirect
//!
//! ## Example
//!
//! ```ignore
//! use staybook_booking::{BookingAction, BookingConfig, BookingEnvironment, BookingState, BookingStore};
//! use staybook_booking::gateways::HttpBookingApi;
//!
//! let config = BookingConfig::from_env()?;
//! let api = HttpBookingApi::from_config(&config)?;
//! let env = BookingEnvironment::new(Gateways::http(api), navigator, Arc::new(SystemClock), config);
//!
//! let store = BookingStore::new(BookingState::new(property), env, storage);
//! store.mount(&QueryString::parse(query)).await?;
//! store.send(BookingAction::SetGuestCount(3)).await?;
//! ```

pub mod actions;
pub mod checkout;
pub mod config;
pub mod environment;
pub mod error;
pub mod gateways;
pub mod mocks;
pub mod persistence;
pub mod reducer;
pub mod scheduler;
pub mod state;
pub mod store;

pub use actions::BookingAction;
pub use checkout::{CheckoutOrchestrator, Navigator};
pub use config::BookingConfig;
pub use environment::{BookingEnvironment, Gateways};
pub use error::{CheckoutError, StoreError};
pub use reducer::BookingReducer;
pub use state::{BookingState, CheckoutOutcome, CheckoutPhase, SelectedAction};
pub use store::BookingStore;
