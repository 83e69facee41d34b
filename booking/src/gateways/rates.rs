//! Exchange-rate table lookup.

use super::GatewayFuture;
use crate::error::GatewayError;
use serde::Deserialize;
use staybook_core::currency::ExchangeRates;

/// `GET /exchange-rates` response body
#[derive(Clone, Debug, Deserialize)]
pub struct ExchangeRatesResponse {
    /// Rates against a common base
    pub rates: ExchangeRates,
}

/// Exchange-rate gateway trait
///
/// Loaded once on mount. A failure leaves prices in the base currency.
pub trait ExchangeRateGateway: Send + Sync {
    /// Fetch the current rate table
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the service cannot be reached
    fn latest(&self) -> GatewayFuture<ExchangeRates, GatewayError>;
}
