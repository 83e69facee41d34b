//! Headless booking session.
//!
//! Mounts a session, picks dates two weeks out, applies a coupon, switches
//! the display currency and books. Runs against in-memory gateways unless
//! `STAYBOOK_DEMO_BACKEND=http`, in which case every call goes to
//! `STAYBOOK_API_BASE_URL`.
//!
//! The first argument, if any, is treated as the page's query string
//! (for example `checkIn=2026-07-01&checkOut=2026-07-05&guests=3`).

use anyhow::Context;
use staybook_booking::checkout::RedirectLog;
use staybook_booking::gateways::HttpBookingApi;
use staybook_booking::mocks::MockServices;
use staybook_booking::persistence::{MemoryStorage, QueryString};
use staybook_booking::{
    BookingAction, BookingConfig, BookingEnvironment, BookingState, BookingStore, Gateways, SelectedAction,
};
use staybook_core::currency::CurrencyCode;
use staybook_core::environment::{Clock, SystemClock};
use staybook_core::guest::GuestInfoPatch;
use staybook_core::property::Property;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

fn demo_property() -> Property {
    Property {
        id: std::env::var("STAYBOOK_DEMO_PROPERTY_ID").unwrap_or_else(|_| "prop-1".to_string()),
        slug: std::env::var("STAYBOOK_DEMO_PROPERTY_SLUG").unwrap_or_else(|_| "villa-sol".to_string()),
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staybook=info,staybook_booking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BookingConfig::from_env().context("loading configuration")?;
    info!(api = %config.api_base_url, site = %config.site_url, "Configuration loaded");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let navigator = Arc::new(RedirectLog::new());
    let gateways = if std::env::var("STAYBOOK_DEMO_BACKEND").is_ok_and(|backend| backend == "http") {
        info!("Using HTTP gateways");
        Gateways::http(HttpBookingApi::from_config(&config).context("building HTTP client")?)
    } else {
        info!("Using in-memory gateways");
        MockServices::new().gateways()
    };
    let environment = BookingEnvironment::new(gateways, navigator.clone(), Arc::clone(&clock), config);

    let store = BookingStore::new(
        BookingState::new(demo_property()),
        environment,
        Arc::new(MemoryStorage::new()),
    );

    let query = std::env::args().nth(1).unwrap_or_default();
    store.mount(&QueryString::parse(&query)).await?;
    store.settle(SETTLE_TIMEOUT).await?;

    if store.state(|s| s.stay().is_none()).await {
        let check_in = clock.today() + chrono::Duration::days(14);
        store.send(BookingAction::SetCheckIn(Some(check_in))).await?;
        store
            .send(BookingAction::SetCheckOut(Some(check_in + chrono::Duration::days(3))))
            .await?;
        store.send(BookingAction::SetGuestCount(2)).await?;
    }
    store.settle(SETTLE_TIMEOUT).await?;

    store
        .send(BookingAction::ApplyCoupon {
            code: "SUMMER10".to_string(),
        })
        .await?;
    store.send(BookingAction::SetCurrency(CurrencyCode::new("USD"))).await?;
    store.settle(SETTLE_TIMEOUT).await?;

    let (quote, pricing_error, coupon_error) = store
        .state(|s| (s.display_quote(), s.pricing_error.clone(), s.coupon_error.clone()))
        .await;
    if let Some(error) = pricing_error {
        anyhow::bail!("pricing failed: {}", error.user_message());
    }
    if let Some(error) = coupon_error {
        info!(%error, "Coupon not applied");
    }
    let quote = quote.context("no quote after settling")?;
    info!(
        nights = quote.number_of_nights,
        total = %quote.total_amount().formatted(),
        "Quote ready"
    );

    store.send(BookingAction::SetSelectedAction(SelectedAction::Book)).await?;
    store
        .send(BookingAction::UpdateGuestInfo(GuestInfoPatch {
            first_name: Some("Ana".to_string()),
            last_name: Some("Popescu".to_string()),
            email: Some("ana@example.com".to_string()),
            phone: Some("+40 721 000 111".to_string()),
            message: None,
        }))
        .await?;
    store.send(BookingAction::SubmitCheckout).await?;
    store.settle(SETTLE_TIMEOUT).await?;

    let checkout = store.state(|s| s.checkout.clone()).await;
    match (checkout.last_outcome, checkout.error) {
        (_, Some(error)) => anyhow::bail!("checkout failed: {}", error.user_message()),
        (Some(outcome), None) => info!(?outcome, redirect = ?navigator.last(), "Checkout complete"),
        (None, None) => info!(phase = ?checkout.phase, "Checkout did not finish"),
    }

    store.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
