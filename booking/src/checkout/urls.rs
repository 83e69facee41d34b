//! Payment callback URLs.

use crate::gateways::payment::PaymentKind;
use crate::gateways::records::BookingId;

/// Placeholder the payment processor substitutes with its session id
pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Builds the success and cancel URLs handed to the payment processor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackUrls {
    site_url: String,
}

impl CallbackUrls {
    /// URLs rooted at the public site URL
    #[must_use]
    pub fn new(site_url: &str) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// Where the visitor lands after paying
    ///
    /// ```
    /// use staybook_booking::checkout::CallbackUrls;
    /// use staybook_booking::gateways::{BookingId, PaymentKind};
    ///
    /// let urls = CallbackUrls::new("https://stay.example.com");
    /// assert_eq!(
    ///     urls.success(&BookingId::new("bk_1"), PaymentKind::Booking),
    ///     "https://stay.example.com/booking/success?booking_id=bk_1&session_id={CHECKOUT_SESSION_ID}"
    /// );
    /// ```
    #[must_use]
    pub fn success(&self, booking_id: &BookingId, kind: PaymentKind) -> String {
        let path = match kind {
            PaymentKind::Booking => "success",
            PaymentKind::Hold => "hold-success",
        };
        format!(
            "{}/booking/{path}?booking_id={}&session_id={CHECKOUT_SESSION_PLACEHOLDER}",
            self.site_url,
            encode(booking_id.as_str()),
        )
    }

    /// Where the visitor lands after backing out of the payment page
    #[must_use]
    pub fn cancel(&self, property_slug: &str, booking_id: &BookingId, kind: PaymentKind) -> String {
        let kind = match kind {
            PaymentKind::Booking => "booking",
            PaymentKind::Hold => "hold",
        };
        format!(
            "{}/booking/cancel?booking_id={}&property={}&kind={kind}",
            self.site_url,
            encode(booking_id.as_str()),
            encode(property_slug),
        )
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
