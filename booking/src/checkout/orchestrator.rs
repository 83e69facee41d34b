//! The checkout orchestrator.
//!
//! One orchestrator serves all three paths:
//!
//! ```text
//! Idle → Validating → CreatingRecord → CreatingPaymentSession → Redirecting   (book, hold)
//! Idle → Validating → CreatingRecord → Completed                             (contact)
//!                  ↘ Failed (from any phase)
//! ```
//!
//! At most one submission runs at a time; a second `submit` while one is in
//! flight returns [`CheckoutOutcome::AlreadySubmitting`] without touching any
//! gateway. The record is always created before the payment session.

use super::navigator::Navigator;
use super::request::{CheckoutDraft, CheckoutKind, CheckoutRequest};
use super::urls::CallbackUrls;
use crate::error::CheckoutError;
use crate::gateways::payment::{PaymentKind, PaymentSession, PaymentSessionGateway, PaymentSessionRequest};
use crate::gateways::records::{BookingId, BookingRecord, BookingRecordGateway, HoldRecord, InquiryRecord};
use crate::state::{CheckoutOutcome, CheckoutPhase};
use staybook_core::currency::ConvertedAmount;
use staybook_core::environment::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Releases the in-flight flag when dropped, on every exit path
struct SubmissionGuard<'a>(&'a AtomicBool);

impl<'a> SubmissionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs checkout submissions against the record and payment gateways
pub struct CheckoutOrchestrator {
    records: Arc<dyn BookingRecordGateway>,
    payments: Arc<dyn PaymentSessionGateway>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    urls: CallbackUrls,
    submitting: AtomicBool,
    phase: watch::Sender<CheckoutPhase>,
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("urls", &self.urls)
            .field("submitting", &self.is_submitting())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(
        records: Arc<dyn BookingRecordGateway>,
        payments: Arc<dyn PaymentSessionGateway>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        urls: CallbackUrls,
    ) -> Self {
        let (phase, _) = watch::channel(CheckoutPhase::Idle);
        Self {
            records,
            payments,
            navigator,
            clock,
            urls,
            submitting: AtomicBool::new(false),
            phase,
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        *self.phase.borrow()
    }

    /// Observe phase changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutPhase> {
        self.phase.subscribe()
    }

    /// Whether a submission is in flight
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Record a submission that died without returning, so observers do
    /// not wait on a phase that will never advance
    pub(crate) fn abandon(&self, action: &'static str) {
        metrics::counter!("booking.checkout.submissions", "action" => action, "outcome" => "unexpected")
            .increment(1);
        self.set_phase(CheckoutPhase::Failed);
    }

    fn set_phase(&self, phase: CheckoutPhase) {
        tracing::debug!(?phase, "Checkout phase");
        self.phase.send_replace(phase);
    }

    /// Submit a checkout.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::ValidationFailed`]: a local precondition failed; no
    ///   gateway was called
    /// - [`CheckoutError::BookingCreationFailed`]: the record could not be
    ///   created; no payment session was opened
    /// - [`CheckoutError::CheckoutSessionFailed`]: the record exists but the
    ///   payment session could not be opened
    #[tracing::instrument(
        skip(self, draft),
        name = "checkout_submit",
        fields(action = %draft.action, property = %draft.property.slug)
    )]
    pub async fn submit(&self, draft: CheckoutDraft) -> Result<CheckoutOutcome, CheckoutError> {
        let Some(_guard) = SubmissionGuard::acquire(&self.submitting) else {
            tracing::debug!("Checkout already in flight, ignoring submission");
            metrics::counter!(
                "booking.checkout.submissions",
                "action" => draft.action.as_str(),
                "outcome" => "ignored"
            )
            .increment(1);
            return Ok(CheckoutOutcome::AlreadySubmitting);
        };

        let action = draft.action.as_str();
        let result = self.run(draft).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(error) => {
                self.set_phase(CheckoutPhase::Failed);
                if matches!(error, CheckoutError::ValidationFailed(_)) {
                    tracing::debug!(%error, "Checkout blocked by validation");
                } else {
                    tracing::error!(%error, kind = error.kind(), "Checkout failed");
                }
                error.kind()
            }
        };
        metrics::counter!("booking.checkout.submissions", "action" => action, "outcome" => outcome).increment(1);

        result
    }

    async fn run(&self, draft: CheckoutDraft) -> Result<CheckoutOutcome, CheckoutError> {
        self.set_phase(CheckoutPhase::Validating);
        let request = draft
            .validate(self.clock.today())
            .map_err(CheckoutError::ValidationFailed)?;

        match request.kind {
            CheckoutKind::Book => self.book(request).await,
            CheckoutKind::Hold => self.hold(request).await,
            CheckoutKind::Contact => self.contact(request).await,
        }
    }

    async fn book(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, CheckoutError> {
        self.set_phase(CheckoutPhase::CreatingRecord);
        let record = BookingRecord {
            property_slug: request.property.slug.clone(),
            property_id: request.property.id.clone(),
            guest_info: request.guest_info.clone(),
            check_in: request.check_in,
            check_out: request.check_out,
            guests: request.guest_count,
            pricing: request.quote.clone(),
            coupon_code: request.coupon.as_ref().map(|coupon| coupon.code.clone()),
        };
        let booking_id = self
            .records
            .create_booking(record)
            .await
            .map_err(CheckoutError::BookingCreationFailed)?;
        tracing::info!(%booking_id, "Pending booking created");

        let description = format!(
            "{}: {} nights, {} to {}",
            request.property.name, request.quote.number_of_nights, request.check_in, request.check_out
        );
        let charge = request.quote.total_amount();
        let session = self
            .open_session(&request, &booking_id, &charge, PaymentKind::Booking, description)
            .await?;

        Ok(self.redirect(booking_id, session))
    }

    async fn hold(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, CheckoutError> {
        self.set_phase(CheckoutPhase::CreatingRecord);
        let hours = request.property.hold_duration_hours;
        let record = HoldRecord {
            property_slug: request.property.slug.clone(),
            property_id: request.property.id.clone(),
            guest_info: request.guest_info.clone(),
            check_in: request.check_in,
            check_out: request.check_out,
            guests: request.guest_count,
            hold_fee: request.hold_fee.amount,
            currency: request.hold_fee.currency.clone(),
            hold_until: self.clock.now() + chrono::Duration::hours(i64::from(hours)),
            refundable: request.property.hold_fee_refundable,
        };
        let booking_id = self
            .records
            .create_hold(record)
            .await
            .map_err(CheckoutError::BookingCreationFailed)?;
        tracing::info!(%booking_id, "Hold created");

        let description = format!(
            "{}: {hours}-hour hold, {} to {}",
            request.property.name, request.check_in, request.check_out
        );
        let session = self
            .open_session(&request, &booking_id, &request.hold_fee, PaymentKind::Hold, description)
            .await?;

        Ok(self.redirect(booking_id, session))
    }

    async fn contact(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, CheckoutError> {
        self.set_phase(CheckoutPhase::CreatingRecord);
        let record = InquiryRecord {
            property_slug: request.property.slug.clone(),
            property_id: request.property.id.clone(),
            guest_info: request.guest_info.clone(),
            check_in: request.check_in,
            check_out: request.check_out,
            guests: request.guest_count,
            message: request.guest_info.message.clone(),
            estimated_total: request.quote.total_amount(),
        };
        let inquiry_id = self
            .records
            .create_inquiry(record)
            .await
            .map_err(CheckoutError::BookingCreationFailed)?;
        tracing::info!(%inquiry_id, "Inquiry sent");

        self.set_phase(CheckoutPhase::Completed);
        Ok(CheckoutOutcome::InquirySent { inquiry_id })
    }

    async fn open_session(
        &self,
        request: &CheckoutRequest,
        booking_id: &BookingId,
        charge: &ConvertedAmount,
        kind: PaymentKind,
        description: String,
    ) -> Result<PaymentSession, CheckoutError> {
        self.set_phase(CheckoutPhase::CreatingPaymentSession);
        let session_request = PaymentSessionRequest::new(
            &request.property.slug,
            booking_id.clone(),
            charge,
            &request.guest_info.email,
            self.urls.success(booking_id, kind),
            self.urls.cancel(&request.property.slug, booking_id, kind),
            kind,
            description,
        );
        tracing::debug!(
            unit_amount = session_request.unit_amount,
            currency = %session_request.currency,
            "Opening payment session"
        );

        self.payments
            .create_session(session_request)
            .await
            .map_err(CheckoutError::CheckoutSessionFailed)
    }

    fn redirect(&self, booking_id: BookingId, session: PaymentSession) -> CheckoutOutcome {
        self.set_phase(CheckoutPhase::Redirecting);
        self.navigator.redirect(&session.session_url);
        CheckoutOutcome::Redirected {
            booking_id,
            session_id: session.session_id,
            url: session.session_url,
        }
    }
}
