//! The booking session reducer.
//!
//! Pure state transitions for the session. Everything asynchronous (gateway
//! calls, the pricing debounce, checkout) leaves this module as an
//! [`Effect`] and comes back as a feedback action.
//!
//! Pricing is kept honest with a generation counter: every date or guest
//! mutation clears the snapshot and bumps `pricing_generation`, and any
//! pricing reply tagged with an older generation is dropped.

use crate::actions::BookingAction;
use crate::checkout::CheckoutDraft;
use crate::environment::BookingEnvironment;
use crate::error::CheckoutError;
use crate::gateways::{CouponRequest, PricingRequest};
use crate::persistence::{
    action_write, check_in_write, check_out_write, currency_write, guest_info_write, guests_write,
    RestoredSession,
};
use crate::state::{BookingState, CheckoutOutcome, CheckoutPhase, CheckoutStatus, SelectedAction};
use staybook_core::effect::{Effect, TimerKey};
use staybook_core::error::{GuestField, StayError};
use staybook_core::guest::GuestInfoPatch;
use staybook_core::pricing::AppliedCoupon;
use staybook_core::reducer::Reducer;
use staybook_core::storage::{SessionKey, SessionWrite};
use staybook_core::{smallvec, NaiveDate, SmallVec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<BookingAction>; 4]>;

/// Reducer for a booking session
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Create a new reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    // ========================================================================
    // Pricing
    // ========================================================================

    /// Drop the snapshot and make every in-flight reply stale
    fn invalidate_pricing(state: &mut BookingState) {
        state.pricing = None;
        state.pricing_error = None;
        state.is_loading_pricing = false;
        state.pricing_generation = state.pricing_generation.wrapping_add(1);
    }

    /// (Re)arm the debounce timer when the stay can be priced, otherwise
    /// disarm it. Pricing waits for availability to finish loading.
    fn schedule_pricing(state: &BookingState, env: &BookingEnvironment) -> Effect<BookingAction> {
        if state.is_priceable() && state.pricing.is_none() && !state.is_loading_unavailable {
            Effect::Debounce {
                key: TimerKey::Pricing,
                duration: env.config.pricing_debounce(),
                action: Box::new(BookingAction::PricingDebounceElapsed {
                    generation: state.pricing_generation,
                }),
            }
        } else {
            Effect::Cancel(TimerKey::Pricing)
        }
    }

    fn fetch_pricing(state: &BookingState, env: &BookingEnvironment) -> Effect<BookingAction> {
        let Some((check_in, check_out)) = state.stay() else {
            return Effect::None;
        };
        let request = PricingRequest {
            property_id: state.property.id.clone(),
            check_in,
            check_out,
            guests: state.guest_count,
        };
        let generation = state.pricing_generation;
        let gateway = Arc::clone(&env.pricing);
        metrics::counter!("booking.pricing.requests").increment(1);

        Effect::future(async move {
            Some(match gateway.quote(request).await {
                Ok(outcome) => BookingAction::PricingLoaded { generation, outcome },
                Err(error) => BookingAction::PricingFailed { generation, error },
            })
        })
    }

    fn is_stale(state: &BookingState, generation: u64) -> bool {
        if generation == state.pricing_generation {
            return false;
        }
        tracing::debug!(
            reply_generation = generation,
            current_generation = state.pricing_generation,
            "Dropping stale pricing reply"
        );
        metrics::counter!("booking.pricing.stale_dropped").increment(1);
        true
    }

    // ========================================================================
    // Coupons
    // ========================================================================

    /// Make any in-flight coupon validation stale
    fn supersede_coupon_reply(state: &mut BookingState) {
        state.coupon_generation = state.coupon_generation.wrapping_add(1);
        state.is_validating_coupon = false;
    }

    fn is_stale_coupon(state: &BookingState, generation: u64) -> bool {
        if generation == state.coupon_generation {
            return false;
        }
        tracing::debug!(
            reply_generation = generation,
            current_generation = state.coupon_generation,
            "Dropping stale coupon reply"
        );
        true
    }

    // ========================================================================
    // Availability and rates
    // ========================================================================

    fn fetch_availability(state: &BookingState, env: &BookingEnvironment) -> Effect<BookingAction> {
        let gateway = Arc::clone(&env.availability);
        let slug = state.property.slug.clone();
        let months = env.config.availability_months;

        Effect::future(async move {
            Some(match gateway.unavailable_dates(&slug, months).await {
                Ok(dates) => BookingAction::SetUnavailableDates(dates),
                Err(error) => BookingAction::UnavailableDatesFailed(error),
            })
        })
    }

    fn fetch_rates(env: &BookingEnvironment) -> Effect<BookingAction> {
        let gateway = Arc::clone(&env.rates);

        Effect::future(async move {
            Some(match gateway.latest().await {
                Ok(rates) => BookingAction::SetExchangeRates(rates),
                Err(error) => BookingAction::ExchangeRatesFailed(error),
            })
        })
    }

    // ========================================================================
    // Date selection
    // ========================================================================

    /// Apply a check-in pick. Returns `false` when the day is disabled and
    /// nothing changed.
    fn select_check_in(state: &mut BookingState, date: NaiveDate, today: NaiveDate) -> bool {
        let constraints = state.constraints(today);
        if constraints.is_check_in_disabled(date) {
            state.date_error = Some(StayError::CheckInUnavailable);
            return false;
        }
        let verdict = state
            .check_out
            .map(|check_out| constraints.validate_stay(date, check_out));

        state.check_in = Some(date);
        state.date_error = None;
        state.show_min_stay_warning = false;

        match verdict {
            None | Some(Ok(_)) => {}
            Some(Err(StayError::CheckOutNotAfterCheckIn | StayError::BelowMinimumStay { .. })) => {
                state.check_out = None;
                state.show_min_stay_warning = true;
            }
            Some(Err(error)) => {
                state.check_out = None;
                state.date_error = Some(error);
            }
        }
        true
    }

    /// Apply a check-out pick. Returns `false` when the day is disabled and
    /// nothing changed.
    fn select_check_out(state: &mut BookingState, date: NaiveDate, today: NaiveDate) -> bool {
        let constraints = state.constraints(today);
        let verdict = match state.check_in {
            Some(check_in) => constraints.validate_stay(check_in, date).map(|_| ()),
            None if constraints.is_check_out_disabled(date, None) => Err(StayError::CheckOutUnavailable),
            None => Ok(()),
        };

        match verdict {
            Ok(()) => {
                state.check_out = Some(date);
                state.date_error = None;
                state.show_min_stay_warning = false;
                true
            }
            Err(error) => {
                state.show_min_stay_warning = matches!(
                    error,
                    StayError::BelowMinimumStay { .. } | StayError::CheckOutNotAfterCheckIn
                );
                state.date_error = Some(error);
                false
            }
        }
    }

    /// Re-check the selection against freshly loaded blocked nights,
    /// clearing whatever no longer holds. Returns whether anything changed.
    fn revalidate_selection(state: &mut BookingState, today: NaiveDate) -> bool {
        let constraints = state.constraints(today);
        let check_in_blocked = state
            .check_in
            .is_some_and(|check_in| constraints.is_check_in_disabled(check_in));
        let stay_error = state
            .stay()
            .and_then(|(check_in, check_out)| constraints.validate_stay(check_in, check_out).err());

        if check_in_blocked {
            state.check_in = None;
            state.check_out = None;
            state.date_error = Some(StayError::CheckInUnavailable);
            true
        } else if let Some(error) = stay_error {
            state.check_out = None;
            state.date_error = Some(error);
            true
        } else {
            false
        }
    }

    fn persist_dates(state: &BookingState) -> [Effect<BookingAction>; 2] {
        [
            Effect::Persist(check_in_write(state.check_in)),
            Effect::Persist(check_out_write(state.check_out)),
        ]
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    fn mount(state: &mut BookingState, restored: RestoredSession, env: &BookingEnvironment) -> Effects {
        let today = env.clock.today();

        if let Some(currency) = restored.currency.or_else(|| env.config.default_currency.clone()) {
            state.selected_currency = currency;
        }
        if let Some(guests) = restored.guests {
            state.guest_count = state.property.clamp_guests(guests);
        }
        if let Some(info) = restored.guest_info {
            state.guest_info = info;
        }
        if let Some(action) = restored.action {
            state.selected_action = action;
        }
        if let Some(check_in) = restored.check_in {
            Self::select_check_in(state, check_in, today);
        }
        if let Some(check_out) = restored.check_out {
            Self::select_check_out(state, check_out, today);
        }
        // A restored pair that fails the rules is dropped silently.
        state.date_error = None;
        state.show_min_stay_warning = false;

        Self::invalidate_pricing(state);
        state.is_loading_unavailable = true;
        state.unavailable_error = None;

        tracing::debug!(
            property = %state.property.slug,
            check_in = ?state.check_in,
            check_out = ?state.check_out,
            guests = state.guest_count,
            "Booking session mounted"
        );

        let [persist_check_in, persist_check_out] = Self::persist_dates(state);
        smallvec![
            Self::fetch_availability(state, env),
            Self::fetch_rates(env),
            persist_check_in,
            persist_check_out,
            Effect::Persist(guests_write(state.guest_count)),
            Effect::Persist(action_write(state.selected_action)),
            Effect::Persist(guest_info_write(&state.guest_info)),
            Effect::Persist(currency_write(&state.selected_currency)),
            Self::schedule_pricing(state, env),
        ]
    }

    fn reset(state: &mut BookingState) -> Effects {
        let mut fresh = BookingState::new(state.property.clone());
        fresh.unavailable_dates = std::mem::take(&mut state.unavailable_dates);
        fresh.unavailable_error = state.unavailable_error.take();
        fresh.is_loading_unavailable = state.is_loading_unavailable;
        fresh.exchange_rates = state.exchange_rates.take();
        fresh.selected_currency = state.selected_currency.clone();
        fresh.pricing_generation = state.pricing_generation.wrapping_add(1);
        fresh.coupon_generation = state.coupon_generation.wrapping_add(1);
        if state.checkout.is_submitting {
            fresh.checkout = std::mem::take(&mut state.checkout);
        }
        *state = fresh;

        smallvec![
            Effect::Cancel(TimerKey::Pricing),
            Effect::Persist(SessionWrite::remove(SessionKey::CheckIn)),
            Effect::Persist(SessionWrite::remove(SessionKey::CheckOut)),
            Effect::Persist(SessionWrite::remove(SessionKey::Guests)),
            Effect::Persist(SessionWrite::remove(SessionKey::Action)),
            Effect::Persist(SessionWrite::remove(SessionKey::GuestInfo)),
        ]
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    fn submit(state: &mut BookingState, env: &BookingEnvironment) -> Effects {
        if state.checkout.is_submitting {
            tracing::debug!("Checkout already in flight, ignoring submit");
            return SmallVec::new();
        }

        let draft = CheckoutDraft::from_state(state);
        if let Err(error) = draft.clone().validate(env.clock.today()) {
            metrics::counter!(
                "booking.checkout.submissions",
                "action" => draft.action.as_str(),
                "outcome" => "validation-failed"
            )
            .increment(1);
            state.checkout.field_errors = error.field_errors().to_vec();
            state.checkout.error = Some(CheckoutError::ValidationFailed(error));
            state.checkout.phase = CheckoutPhase::Failed;
            return SmallVec::new();
        }

        state.checkout = CheckoutStatus {
            is_submitting: true,
            phase: CheckoutPhase::Validating,
            ..CheckoutStatus::default()
        };

        // The submission runs in its own task so a panic inside a gateway
        // still ends in `CheckoutFinished` and releases `is_submitting`.
        let orchestrator = Arc::clone(&env.checkout);
        let action = draft.action.as_str();
        smallvec![Effect::future(async move {
            let submission = tokio::spawn({
                let orchestrator = Arc::clone(&orchestrator);
                async move { orchestrator.submit(draft).await }
            });
            let result = submission.await.unwrap_or_else(|error| {
                tracing::error!(%error, action, "Checkout task did not complete");
                orchestrator.abandon(action);
                Err(CheckoutError::Unexpected(error.to_string()))
            });
            Some(BookingAction::CheckoutFinished(result))
        })]
    }

    fn finish_checkout(state: &mut BookingState, result: Result<CheckoutOutcome, CheckoutError>) {
        state.checkout.is_submitting = false;
        match result {
            Ok(CheckoutOutcome::AlreadySubmitting) => {}
            Ok(outcome) => {
                state.checkout.phase = match outcome {
                    CheckoutOutcome::InquirySent { .. } => CheckoutPhase::Completed,
                    _ => CheckoutPhase::Redirecting,
                };
                state.checkout.error = None;
                state.checkout.last_outcome = Some(outcome);
            }
            Err(error) => {
                if let CheckoutError::ValidationFailed(validation) = &error {
                    state.checkout.field_errors = validation.field_errors().to_vec();
                }
                state.checkout.phase = CheckoutPhase::Failed;
                state.checkout.error = Some(error);
            }
        }
    }

    fn touched_fields(patch: &GuestInfoPatch) -> Vec<GuestField> {
        [
            (patch.first_name.is_some(), GuestField::FirstName),
            (patch.last_name.is_some(), GuestField::LastName),
            (patch.email.is_some(), GuestField::Email),
            (patch.phone.is_some(), GuestField::Phone),
        ]
        .into_iter()
        .filter_map(|(touched, field)| touched.then_some(field))
        .collect()
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            // ========== Lifecycle ==========
            BookingAction::Mounted { restored } => Self::mount(state, restored, env),

            BookingAction::Reset => Self::reset(state),

            // ========== Dates and guests ==========
            BookingAction::SetCheckIn(Some(date)) => {
                if !Self::select_check_in(state, date, env.clock.today()) {
                    return SmallVec::new();
                }
                Self::invalidate_pricing(state);
                Self::supersede_coupon_reply(state);
                let [check_in, check_out] = Self::persist_dates(state);
                smallvec![check_in, check_out, Self::schedule_pricing(state, env)]
            }

            BookingAction::SetCheckIn(None) => {
                state.check_in = None;
                state.date_error = None;
                Self::invalidate_pricing(state);
                Self::supersede_coupon_reply(state);
                smallvec![
                    Effect::Persist(check_in_write(None)),
                    Self::schedule_pricing(state, env)
                ]
            }

            BookingAction::SetCheckOut(Some(date)) => {
                if !Self::select_check_out(state, date, env.clock.today()) {
                    return SmallVec::new();
                }
                Self::invalidate_pricing(state);
                Self::supersede_coupon_reply(state);
                smallvec![
                    Effect::Persist(check_out_write(state.check_out)),
                    Self::schedule_pricing(state, env)
                ]
            }

            BookingAction::SetCheckOut(None) => {
                state.check_out = None;
                state.date_error = None;
                Self::invalidate_pricing(state);
                Self::supersede_coupon_reply(state);
                smallvec![
                    Effect::Persist(check_out_write(None)),
                    Self::schedule_pricing(state, env)
                ]
            }

            BookingAction::SetGuestCount(requested) => {
                state.guest_count = state.property.clamp_guests(requested);
                Self::invalidate_pricing(state);
                smallvec![
                    Effect::Persist(guests_write(state.guest_count)),
                    Self::schedule_pricing(state, env)
                ]
            }

            BookingAction::DismissMinStayWarning => {
                state.show_min_stay_warning = false;
                SmallVec::new()
            }

            // ========== Availability ==========
            BookingAction::SetUnavailableDates(dates) => {
                state.unavailable_dates = dates;
                state.is_loading_unavailable = false;
                state.unavailable_error = None;

                let mut effects = Effects::new();
                if Self::revalidate_selection(state, env.clock.today()) {
                    Self::invalidate_pricing(state);
                    Self::supersede_coupon_reply(state);
                    effects.extend(Self::persist_dates(state));
                }
                effects.push(Self::schedule_pricing(state, env));
                effects
            }

            BookingAction::UnavailableDatesFailed(error) => {
                tracing::warn!(%error, property = %state.property.slug, "Unavailable dates failed to load");
                state.is_loading_unavailable = false;
                state.unavailable_error = Some(error);
                smallvec![Self::schedule_pricing(state, env)]
            }

            BookingAction::RetryAvailability => {
                if state.is_loading_unavailable {
                    return SmallVec::new();
                }
                state.is_loading_unavailable = true;
                state.unavailable_error = None;
                smallvec![
                    Effect::Cancel(TimerKey::Pricing),
                    Self::fetch_availability(state, env)
                ]
            }

            // ========== Pricing ==========
            BookingAction::SetPricing(snapshot) => {
                state.pricing = snapshot;
                state.pricing_error = None;
                state.is_loading_pricing = false;
                SmallVec::new()
            }

            BookingAction::PricingDebounceElapsed { generation } => {
                if generation != state.pricing_generation
                    || state.pricing.is_some()
                    || !state.is_priceable()
                {
                    tracing::trace!(generation, "Ignoring outdated pricing timer");
                    return SmallVec::new();
                }
                state.is_loading_pricing = true;
                state.pricing_error = None;
                smallvec![Self::fetch_pricing(state, env)]
            }

            BookingAction::PricingLoaded { generation, outcome } => {
                if Self::is_stale(state, generation) {
                    return SmallVec::new();
                }
                state.pricing = Some(outcome);
                state.pricing_error = None;
                state.is_loading_pricing = false;
                SmallVec::new()
            }

            BookingAction::PricingFailed { generation, error } => {
                if Self::is_stale(state, generation) {
                    return SmallVec::new();
                }
                tracing::warn!(%error, "Pricing failed");
                state.pricing_error = Some(error);
                state.is_loading_pricing = false;
                SmallVec::new()
            }

            BookingAction::RetryPricing => {
                if state.is_loading_pricing || state.pricing.is_some() || !state.is_priceable() {
                    return SmallVec::new();
                }
                state.is_loading_pricing = true;
                state.pricing_error = None;
                smallvec![
                    Effect::Cancel(TimerKey::Pricing),
                    Self::fetch_pricing(state, env)
                ]
            }

            // ========== Checkout path and guest ==========
            BookingAction::SetSelectedAction(selected) => {
                state.selected_action = selected;
                if !state.checkout.is_submitting {
                    state.checkout.error = None;
                    state.checkout.field_errors.clear();
                }
                smallvec![Effect::Persist(action_write(selected))]
            }

            BookingAction::UpdateGuestInfo(patch) => {
                let touched = Self::touched_fields(&patch);
                state.guest_info.apply(patch);
                state
                    .checkout
                    .field_errors
                    .retain(|error| !touched.contains(&error.field));
                smallvec![Effect::Persist(guest_info_write(&state.guest_info))]
            }

            // ========== Coupons ==========
            BookingAction::ApplyCoupon { code } => {
                let code = code.trim().to_string();
                if state.is_validating_coupon {
                    return SmallVec::new();
                }
                if code.is_empty() {
                    state.coupon_error = Some(crate::error::CouponError::Invalid);
                    return SmallVec::new();
                }
                let Some((check_in, check_out)) = state.stay() else {
                    state.coupon_error = Some(crate::error::CouponError::MissingDates);
                    return SmallVec::new();
                };

                Self::supersede_coupon_reply(state);
                state.is_validating_coupon = true;
                state.coupon_error = None;
                let generation = state.coupon_generation;

                let request = CouponRequest {
                    code: code.clone(),
                    check_in_date: check_in,
                    check_out_date: check_out,
                    property_slug: state.property.slug.clone(),
                };
                let gateway = Arc::clone(&env.coupons);
                smallvec![Effect::future(async move {
                    Some(match gateway.validate(request).await {
                        Ok(discount_percentage) => BookingAction::CouponValidated {
                            generation,
                            code,
                            discount_percentage,
                        },
                        Err(error) => BookingAction::CouponRejected { generation, error },
                    })
                })]
            }

            BookingAction::CouponValidated {
                generation,
                code,
                discount_percentage,
            } => {
                if Self::is_stale_coupon(state, generation) {
                    return SmallVec::new();
                }
                state.is_validating_coupon = false;
                state.coupon_error = None;
                state.applied_coupon = Some(AppliedCoupon::new(&code, discount_percentage));
                SmallVec::new()
            }

            BookingAction::CouponRejected { generation, error } => {
                if Self::is_stale_coupon(state, generation) {
                    return SmallVec::new();
                }
                tracing::debug!(%error, "Coupon rejected");
                state.is_validating_coupon = false;
                state.coupon_error = Some(error);
                SmallVec::new()
            }

            BookingAction::SetCoupon(coupon) => {
                Self::supersede_coupon_reply(state);
                state.applied_coupon = coupon;
                state.coupon_error = None;
                SmallVec::new()
            }

            BookingAction::RemoveCoupon => {
                Self::supersede_coupon_reply(state);
                state.applied_coupon = None;
                state.coupon_error = None;
                SmallVec::new()
            }

            // ========== Currency ==========
            BookingAction::SetCurrency(currency) => {
                state.selected_currency = currency;
                smallvec![Effect::Persist(currency_write(&state.selected_currency))]
            }

            BookingAction::SetExchangeRates(rates) => {
                state.exchange_rates = Some(rates);
                SmallVec::new()
            }

            BookingAction::ExchangeRatesFailed(error) => {
                tracing::warn!(%error, "Exchange rates unavailable, prices stay in base currency");
                state.exchange_rates = None;
                SmallVec::new()
            }

            // ========== Checkout ==========
            BookingAction::SubmitCheckout => Self::submit(state, env),

            BookingAction::CheckoutFinished(result) => {
                Self::finish_checkout(state, result);
                SmallVec::new()
            }

            BookingAction::DismissCheckoutError => {
                state.checkout.error = None;
                state.checkout.field_errors.clear();
                if state.checkout.phase == CheckoutPhase::Failed {
                    state.checkout.phase = CheckoutPhase::Idle;
                }
                SmallVec::new()
            }
        }
    }
}

/// Whether the visitor can proceed to checkout with the current session
///
/// Mirrors the reducer's own pre-submit check, for enabling the submit
/// button.
#[must_use]
pub fn can_submit(state: &BookingState, today: NaiveDate) -> bool {
    state.selected_action != SelectedAction::None
        && !state.checkout.is_submitting
        && CheckoutDraft::from_state(state).validate(today).is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BookingConfig;
    use crate::mocks::MockServices;
    use staybook_testing::{assertions, day as d, fixtures, test_clock, ReducerTest};

    fn env() -> BookingEnvironment {
        MockServices::new().environment(Arc::new(test_clock()), BookingConfig::default())
    }

    fn fresh_state() -> BookingState {
        BookingState::new(fixtures::property())
    }

    fn priced_state() -> BookingState {
        let mut state = fresh_state();
        state.check_in = Some(d(10));
        state.check_out = Some(d(13));
        state.guest_count = 2;
        state.pricing = Some(fixtures::snapshot(3, 300.0));
        state.pricing_generation = 7;
        state
    }

    #[test]
    fn check_in_clearing_short_check_out_raises_warning() {
        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(priced_state())
            .when_action(BookingAction::SetCheckIn(Some(d(12))))
            .then_state(|state| {
                assert_eq!(state.check_in, Some(d(12)));
                assert_eq!(state.check_out, None);
                assert!(state.show_min_stay_warning);
                assert!(state.pricing.is_none());
                assert_eq!(state.pricing_generation, 8);
            })
            .then_effects(|effects| {
                assertions::assert_cancels(effects, TimerKey::Pricing);
                assert_eq!(assertions::persisted(effects, SessionKey::CheckOut), Some(None));
            })
            .run();
    }

    #[test]
    fn disabled_check_in_changes_nothing() {
        let mut state = priced_state();
        state.unavailable_dates.insert(d(20));

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::SetCheckIn(Some(d(20))))
            .then_state(|state| {
                assert_eq!(state.check_in, Some(d(10)));
                assert!(state.pricing.is_some());
                assert_eq!(state.date_error, Some(StayError::CheckInUnavailable));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn complete_selection_arms_debounce_for_current_generation() {
        let mut state = fresh_state();
        state.check_in = Some(d(10));
        state.guest_count = 2;

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::SetCheckOut(Some(d(13))))
            .then_effects(|effects| {
                let (duration, action) = assertions::debounced(effects, TimerKey::Pricing);
                assert_eq!(duration, std::time::Duration::from_millis(500));
                assert_eq!(action, BookingAction::PricingDebounceElapsed { generation: 1 });
            })
            .run();
    }

    #[test]
    fn too_short_check_out_is_refused() {
        let mut state = fresh_state();
        state.check_in = Some(d(10));

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::SetCheckOut(Some(d(11))))
            .then_state(|state| {
                assert_eq!(state.check_out, None);
                assert!(state.show_min_stay_warning);
                assert!(matches!(state.date_error, Some(StayError::BelowMinimumStay { .. })));
            })
            .run();
    }

    #[test]
    fn stale_pricing_reply_is_dropped() {
        let mut state = priced_state();
        state.pricing = None;
        state.is_loading_pricing = true;

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::PricingLoaded {
                generation: 6,
                outcome: fixtures::snapshot(3, 999.0),
            })
            .then_state(|state| {
                assert!(state.pricing.is_none());
                assert!(state.is_loading_pricing);
            })
            .run();
    }

    #[test]
    fn current_pricing_reply_is_stored() {
        let mut state = priced_state();
        state.pricing = None;
        state.is_loading_pricing = true;

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::PricingLoaded {
                generation: 7,
                outcome: fixtures::snapshot(3, 300.0),
            })
            .then_state(|state| {
                assert!((state.pricing.as_ref().unwrap().total - 350.0).abs() < 1e-9);
                assert!(!state.is_loading_pricing);
            })
            .run();
    }

    #[test]
    fn guest_count_is_clamped_and_persisted() {
        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(priced_state())
            .when_action(BookingAction::SetGuestCount(40))
            .then_state(|state| {
                assert_eq!(state.guest_count, 6);
                assert!(state.pricing.is_none());
            })
            .then_effects(|effects| {
                assert_eq!(
                    assertions::persisted(effects, SessionKey::Guests),
                    Some(Some("6".to_string()))
                );
            })
            .run();
    }

    #[test]
    fn coupon_needs_dates() {
        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(fresh_state())
            .when_action(BookingAction::ApplyCoupon { code: "SUMMER".to_string() })
            .then_state(|state| {
                assert_eq!(state.coupon_error, Some(crate::error::CouponError::MissingDates));
                assert!(!state.is_validating_coupon);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    fn summer10_validated(generation: u64) -> BookingAction {
        BookingAction::CouponValidated {
            generation,
            code: "SUMMER10".to_string(),
            discount_percentage: 10.0,
        }
    }

    #[test]
    fn current_coupon_reply_is_applied() {
        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(priced_state())
            .when_action(BookingAction::ApplyCoupon { code: "summer10".to_string() })
            .when_action(summer10_validated(1))
            .then_state(|state| {
                assert_eq!(state.coupon_generation, 1);
                assert!(!state.is_validating_coupon);
                assert_eq!(state.applied_coupon, Some(AppliedCoupon::new("SUMMER10", 10.0)));
            })
            .run();
    }

    #[test]
    fn coupon_removed_while_validating_stays_removed() {
        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(priced_state())
            .when_action(BookingAction::ApplyCoupon { code: "summer10".to_string() })
            .when_action(BookingAction::RemoveCoupon)
            .when_action(summer10_validated(1))
            .then_state(|state| {
                assert_eq!(state.coupon_generation, 2);
                assert!(!state.is_validating_coupon);
                assert!(state.applied_coupon.is_none());
                assert!(state.coupon_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn coupon_reply_for_previous_dates_is_dropped() {
        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(priced_state())
            .when_action(BookingAction::ApplyCoupon { code: "summer10".to_string() })
            .when_action(BookingAction::SetCheckOut(Some(d(14))))
            .when_action(summer10_validated(1))
            .then_state(|state| {
                assert_eq!(state.stay(), Some((d(10), d(14))));
                assert!(!state.is_validating_coupon);
                assert!(state.applied_coupon.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn late_rejection_does_not_surface_after_removal() {
        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(priced_state())
            .when_action(BookingAction::ApplyCoupon { code: "old".to_string() })
            .when_action(BookingAction::RemoveCoupon)
            .when_action(BookingAction::CouponRejected {
                generation: 1,
                error: crate::error::CouponError::Expired,
            })
            .then_state(|state| {
                assert!(state.coupon_error.is_none());
                assert!(!state.is_validating_coupon);
            })
            .run();
    }

    #[test]
    fn coupon_can_be_applied_again_after_removal_mid_validation() {
        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(priced_state())
            .when_action(BookingAction::ApplyCoupon { code: "summer10".to_string() })
            .when_action(BookingAction::RemoveCoupon)
            .when_action(BookingAction::ApplyCoupon { code: "summer10".to_string() })
            .then_state(|state| {
                assert_eq!(state.coupon_generation, 3);
                assert!(state.is_validating_coupon);
            })
            .then_effects(|effects| assert_eq!(effects.len(), 1))
            .run();
    }

    #[test]
    fn invalid_checkout_is_blocked_before_any_effect() {
        let mut state = priced_state();
        state.selected_action = SelectedAction::Book;

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::SubmitCheckout)
            .then_state(|state| {
                assert!(!state.checkout.is_submitting);
                assert_eq!(state.checkout.phase, CheckoutPhase::Failed);
                assert!(!state.checkout.field_errors.is_empty());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn second_submit_while_in_flight_is_ignored() {
        let mut state = priced_state();
        state.selected_action = SelectedAction::Book;
        state.guest_info = fixtures::guest_info();
        state.checkout.is_submitting = true;

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::SubmitCheckout)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let mut state = priced_state();
        state.checkout.field_errors = vec![
            staybook_core::error::FieldError {
                field: GuestField::Email,
                message: "bad".to_string(),
            },
            staybook_core::error::FieldError {
                field: GuestField::Phone,
                message: "bad".to_string(),
            },
        ];

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::UpdateGuestInfo(GuestInfoPatch {
                email: Some("ana@example.com".to_string()),
                ..GuestInfoPatch::default()
            }))
            .then_state(|state| {
                assert_eq!(state.checkout.field_errors.len(), 1);
                assert_eq!(state.checkout.field_errors[0].field, GuestField::Phone);
            })
            .run();
    }

    #[test]
    fn reset_keeps_session_data_but_clears_selection() {
        let mut state = priced_state();
        state.unavailable_dates.insert(d(20));
        state.applied_coupon = Some(AppliedCoupon::new("x", 10.0));

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::Reset)
            .then_state(|state| {
                assert!(state.check_in.is_none());
                assert!(state.applied_coupon.is_none());
                assert!(state.pricing.is_none());
                assert!(state.unavailable_dates.contains(&d(20)));
                assert_eq!(state.pricing_generation, 8);
            })
            .then_effects(|effects| assert_eq!(effects.len(), 6))
            .run();
    }

    #[test]
    fn loaded_blocked_nights_clear_conflicting_check_out() {
        let mut state = priced_state();
        state.pricing = None;
        state.is_loading_unavailable = true;

        ReducerTest::new(BookingReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::SetUnavailableDates([d(11)].into()))
            .then_state(|state| {
                assert_eq!(state.check_in, Some(d(10)));
                assert_eq!(state.check_out, None);
                assert_eq!(state.date_error, Some(StayError::RangeUnavailable));
                assert!(!state.is_loading_unavailable);
            })
            .run();
    }

    fn mutation() -> impl proptest::strategy::Strategy<Value = BookingAction> {
        use proptest::prelude::*;
        use staybook_testing::strategies;

        prop_oneof![
            proptest::option::of(strategies::future_day()).prop_map(BookingAction::SetCheckIn),
            proptest::option::of(strategies::future_day()).prop_map(BookingAction::SetCheckOut),
            strategies::guest_count().prop_map(BookingAction::SetGuestCount),
        ]
    }

    proptest::proptest! {
        /// Whatever the input order, a changed selection never keeps a quote
        /// and a reply for an older selection never lands
        #[test]
        fn selection_changes_always_drop_the_quote(
            mutations in proptest::collection::vec(mutation(), 1..24),
        ) {
            let env = env();
            let reducer = BookingReducer::new();
            let mut state = fresh_state();
            let minimum_stay = i64::from(state.property.default_minimum_stay);

            for action in mutations {
                state.pricing = Some(fixtures::snapshot(3, 300.0));
                let before = (state.check_in, state.check_out, state.guest_count);
                let generation = state.pricing_generation;

                let _ = reducer.reduce(&mut state, action, &env);

                let after = (state.check_in, state.check_out, state.guest_count);
                if after != before {
                    proptest::prop_assert!(state.pricing.is_none());
                    proptest::prop_assert_ne!(state.pricing_generation, generation);

                    let _ = reducer.reduce(
                        &mut state,
                        BookingAction::PricingLoaded {
                            generation,
                            outcome: fixtures::snapshot(3, 300.0),
                        },
                        &env,
                    );
                    proptest::prop_assert!(state.pricing.is_none());
                }
                if let Some((check_in, check_out)) = state.stay() {
                    proptest::prop_assert!((check_out - check_in).num_days() >= minimum_stay);
                }
                proptest::prop_assert!((1..=state.property.max_guests).contains(&state.guest_count));
            }
        }
    }
}
