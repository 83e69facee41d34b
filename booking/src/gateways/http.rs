//! HTTP adapter implementing every gateway port against the booking API.

use super::availability::{AvailabilityGateway, AvailabilityResponse};
use super::coupon::{CouponGateway, CouponRequest, CouponResponse};
use super::payment::{PaymentSession, PaymentSessionGateway, PaymentSessionRequest, PaymentSessionResponse};
use super::pricing::{PricingGateway, PricingRequest, PricingResponse};
use super::rates::{ExchangeRateGateway, ExchangeRatesResponse};
use super::records::{BookingId, BookingRecord, BookingRecordGateway, HoldRecord, InquiryRecord, RecordResponse};
use super::GatewayFuture;
use crate::config::BookingConfig;
use crate::error::{
    AvailabilityError, CouponError, GatewayError, PaymentSessionError, PricingError, RecordError,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use staybook_core::currency::ExchangeRates;
use staybook_core::pricing::PricingSnapshot;
use staybook_core::NaiveDate;
use std::collections::BTreeSet;
use std::time::Duration;

/// Minimum stay assumed when the pricing service omits the count
const DEFAULT_MINIMUM_STAY: u32 = 1;

/// Booking API client
#[derive(Clone, Debug)]
pub struct HttpBookingApi {
    client: Client,
    base_url: String,
}

/// Error body returned alongside 4xx statuses
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// What a request produced once transport errors are ruled out
enum Reply<T> {
    /// 2xx with a parsed body
    Body(T),
    /// 4xx with an `{error}` body
    Rejected(String),
}

impl HttpBookingApi {
    /// Create a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RequestFailed`] if the HTTP client cannot be
    /// built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the engine configuration
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RequestFailed`] if the HTTP client cannot be
    /// built
    pub fn from_config(config: &BookingConfig) -> Result<Self, GatewayError> {
        Self::new(config.api_base_url.clone(), config.http_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and sort the reply into body, rejection or transport error
    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<Reply<T>, GatewayError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map(Reply::Body)
                .map_err(|e| GatewayError::ResponseParseFailed(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(&body) {
                return Ok(Reply::Rejected(error));
            }
        }

        tracing::warn!(status = status.as_u16(), "Booking API returned an error status");
        Err(GatewayError::Api {
            status: status.as_u16(),
            message: body,
        })
    }

    /// Like [`Self::execute`] for endpoints without a domain rejection
    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GatewayError> {
        match Self::execute(request).await? {
            Reply::Body(body) => Ok(body),
            Reply::Rejected(message) => Err(GatewayError::Api { status: 400, message }),
        }
    }

    async fn create_record(request: RequestBuilder) -> Result<BookingId, RecordError> {
        match Self::execute::<RecordResponse>(request).await? {
            Reply::Body(body) => body.into_id(),
            Reply::Rejected(message) => Err(RecordError::Rejected(message)),
        }
    }
}

impl AvailabilityGateway for HttpBookingApi {
    fn unavailable_dates(
        &self,
        property_slug: &str,
        months: u32,
    ) -> GatewayFuture<BTreeSet<NaiveDate>, AvailabilityError> {
        let request = self
            .client
            .get(self.url("/availability"))
            .query(&[("propertySlug", property_slug.to_string()), ("months", months.to_string())]);

        Box::pin(async move {
            Self::fetch::<AvailabilityResponse>(request)
                .await
                .map(AvailabilityResponse::into_dates)
                .map_err(AvailabilityError)
        })
    }
}

impl PricingGateway for HttpBookingApi {
    fn quote(&self, request: PricingRequest) -> GatewayFuture<PricingSnapshot, PricingError> {
        let builder = self.client.post(self.url("/pricing")).json(&request);

        Box::pin(async move {
            match Self::execute::<PricingResponse>(builder).await? {
                Reply::Body(response) => response.into_snapshot(DEFAULT_MINIMUM_STAY),
                Reply::Rejected(message) => Err(GatewayError::Api { status: 400, message }.into()),
            }
        })
    }
}

impl CouponGateway for HttpBookingApi {
    fn validate(&self, request: CouponRequest) -> GatewayFuture<f64, CouponError> {
        let builder = self.client.post(self.url("/coupons/validate")).json(&request);

        Box::pin(async move {
            match Self::execute::<CouponResponse>(builder).await {
                Ok(Reply::Body(response)) => response.into_percentage(),
                Ok(Reply::Rejected(message)) => Err(CouponError::from_service_message(&message)),
                Err(error) => Err(CouponError::Gateway(error)),
            }
        })
    }
}

impl ExchangeRateGateway for HttpBookingApi {
    fn latest(&self) -> GatewayFuture<ExchangeRates, GatewayError> {
        let request = self.client.get(self.url("/exchange-rates"));

        Box::pin(async move {
            Self::fetch::<ExchangeRatesResponse>(request)
                .await
                .map(|response| response.rates)
        })
    }
}

impl BookingRecordGateway for HttpBookingApi {
    fn create_booking(&self, record: BookingRecord) -> GatewayFuture<BookingId, RecordError> {
        let request = self.client.post(self.url("/bookings")).json(&record);
        Box::pin(Self::create_record(request))
    }

    fn create_hold(&self, record: HoldRecord) -> GatewayFuture<BookingId, RecordError> {
        let request = self.client.post(self.url("/bookings/hold")).json(&record);
        Box::pin(Self::create_record(request))
    }

    fn create_inquiry(&self, record: InquiryRecord) -> GatewayFuture<BookingId, RecordError> {
        let request = self.client.post(self.url("/inquiries")).json(&record);
        Box::pin(Self::create_record(request))
    }
}

impl PaymentSessionGateway for HttpBookingApi {
    fn create_session(
        &self,
        request: PaymentSessionRequest,
    ) -> GatewayFuture<PaymentSession, PaymentSessionError> {
        let builder = self.client.post(self.url("/checkout/sessions")).json(&request);

        Box::pin(async move {
            match Self::execute::<PaymentSessionResponse>(builder).await? {
                Reply::Body(response) => response.into_session(),
                Reply::Rejected(message) => Err(PaymentSessionError::Rejected(message)),
            }
        })
    }
}
