//! Checkout: validation, record creation, payment handoff.

mod navigator;
mod orchestrator;
mod request;
mod urls;

pub use navigator::{Navigator, RedirectLog};
pub use orchestrator::CheckoutOrchestrator;
pub use request::{CheckoutDraft, CheckoutKind, CheckoutRequest};
pub use urls::{CallbackUrls, CHECKOUT_SESSION_PLACEHOLDER};
