//! Ticket checkout: order summary, payment and the pending/failed states
//! around it.
//!
//! Payment runs as a cancellable effect registered under
//! [`CHECKOUT_EFFECT`]. Its outcome is fed back as
//! [`CheckoutAction::PaymentSettled`] or [`CheckoutAction::PaymentFailed`];
//! a settlement completes the purchase inside the same reducer call.

use crate::app::{self, AppAction, AppEnvironment, AppState};
use crate::routing::Page;
use crate::types::{EventId, Money, UserId};
use bashi_core::environment::{Clock, SystemClock};
use bashi_core::{async_effect, cancellable, effect::Effect, effect::EffectId, smallvec, DateTime, SmallVec, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Id under which the in-flight payment effect is registered
pub const CHECKOUT_EFFECT: &str = "checkout";

/// Processing fee added to every order
pub const DEFAULT_PROCESSING_FEE: Money = Money::from_cents(250);

/// Checkout tuning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// How long the simulated gateway takes to answer
    pub payment_delay: Duration,
    /// Upper bound on any gateway call
    pub payment_timeout: Duration,
    /// Fee shown on the order summary
    pub processing_fee: Money,
    /// Reject purchases for sold-out events
    pub enforce_capacity: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            payment_delay: Duration::from_millis(2000),
            payment_timeout: Duration::from_secs(30),
            processing_fee: DEFAULT_PROCESSING_FEE,
            enforce_capacity: false,
        }
    }
}

// ============================================================================
// Order summary
// ============================================================================

/// Price breakdown shown next to the pay button
///
/// Presentation only: nothing here is stored on the issued ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderSummary {
    /// Ticket price
    pub unit_price: Money,
    /// Processing fee
    pub processing_fee: Money,
    /// Amount charged
    pub total: Money,
}

impl OrderSummary {
    /// Summary for one ticket at `unit_price`
    #[must_use]
    pub fn new(unit_price: Money, processing_fee: Money) -> Self {
        Self {
            unit_price,
            processing_fee,
            total: Money::sum([unit_price, processing_fee]),
        }
    }
}

// ============================================================================
// Payment gateway
// ============================================================================

/// A charge for one ticket
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Event the ticket is for
    pub event_id: EventId,
    /// Paying member
    pub user_id: UserId,
    /// Amount to charge
    pub amount: Money,
}

/// Proof of a successful charge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Gateway transaction id
    pub transaction_id: String,
    /// Amount charged
    pub amount: Money,
}

/// Payment failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The gateway refused the charge
    #[error("Payment declined: {reason}")]
    Declined {
        /// Decline reason
        reason: String,
    },
    /// The gateway did not answer in time
    #[error("Payment timed out after {0:?}")]
    Timeout(Duration),
    /// The gateway could not be reached
    #[error("Payment service unavailable: {0}")]
    Unavailable(String),
}

/// Boxed future returned by [`PaymentGateway::charge`]
pub type PaymentFuture = Pin<Box<dyn Future<Output = Result<PaymentReceipt, PaymentError>> + Send>>;

/// Payment processor abstraction
pub trait PaymentGateway: Send + Sync {
    /// Charge for one ticket
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError`] if the charge does not go through.
    fn charge(&self, request: PaymentRequest) -> PaymentFuture;
}

/// Gateway that waits a fixed delay and then always approves
#[derive(Clone)]
pub struct SimulatedPaymentGateway {
    delay: Duration,
    clock: Arc<dyn Clock>,
}

impl SimulatedPaymentGateway {
    /// Creates a gateway answering after `delay`
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            clock: Arc::new(SystemClock),
        }
    }

    /// Stamps transaction ids from `clock`
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(delay: Duration) -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new(delay))
    }
}

impl std::fmt::Debug for SimulatedPaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedPaymentGateway")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Default for SimulatedPaymentGateway {
    fn default() -> Self {
        Self::new(CheckoutConfig::default().payment_delay)
    }
}

impl PaymentGateway for SimulatedPaymentGateway {
    fn charge(&self, request: PaymentRequest) -> PaymentFuture {
        let delay = self.delay;
        let clock = Arc::clone(&self.clock);
        Box::pin(async move {
            tokio::time::sleep(delay).await;

            let transaction_id = format!(
                "sim_txn_{}_{}_{}",
                request.event_id,
                request.user_id,
                clock.now().timestamp_millis()
            );

            tracing::info!(
                event_id = %request.event_id,
                amount = request.amount.cents(),
                transaction_id = %transaction_id,
                "Simulated payment approved"
            );

            Ok(PaymentReceipt {
                transaction_id,
                amount: request.amount,
            })
        })
    }
}

// ============================================================================
// State machine
// ============================================================================

/// Where the checkout flow is
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// Nothing in progress; the pay button is enabled
    #[default]
    Idle,
    /// Waiting for the gateway; the pay button is disabled
    Pending {
        /// Event being purchased
        event_id: EventId,
        /// When payment started
        started_at: DateTime<Utc>,
    },
    /// The last attempt failed
    Failed {
        /// Event that was being purchased
        event_id: EventId,
        /// Why
        reason: String,
    },
}

impl CheckoutPhase {
    /// Whether a payment is in flight
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    fn pending_event(&self) -> Option<&EventId> {
        match self {
            Self::Pending { event_id, .. } => Some(event_id),
            Self::Idle | Self::Failed { .. } => None,
        }
    }
}

/// Checkout inputs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutAction {
    /// The member pressed "Pay Now"
    Submit {
        /// Event to buy a ticket for
        event_id: EventId,
    },
    /// The gateway approved the charge
    PaymentSettled {
        /// Event the charge was for
        event_id: EventId,
        /// Gateway transaction id
        transaction_id: String,
    },
    /// The gateway refused the charge or timed out
    PaymentFailed {
        /// Event the charge was for
        event_id: EventId,
        /// Why
        reason: String,
    },
    /// Abandon the in-flight payment
    Cancel,
    /// Clear a failure
    Reset,
}

/// Apply a checkout action to the application state
pub(crate) fn reduce(
    state: &mut AppState,
    action: CheckoutAction,
    env: &AppEnvironment,
) -> SmallVec<[Effect<AppAction>; 4]> {
    match action {
        CheckoutAction::Submit { event_id } => submit(state, event_id, env),

        CheckoutAction::PaymentSettled {
            event_id,
            transaction_id,
        } => {
            if state.checkout.pending_event() != Some(&event_id) {
                tracing::debug!(event_id = %event_id, "Ignoring settlement for a payment that is not pending");
                return smallvec![Effect::None];
            }
            tracing::info!(event_id = %event_id, transaction_id = %transaction_id, "Payment settled");
            state.checkout = CheckoutPhase::Idle;
            app::purchase_ticket(state, &event_id, env);
            smallvec![Effect::None]
        },

        CheckoutAction::PaymentFailed { event_id, reason } => {
            if state.checkout.pending_event() != Some(&event_id) {
                tracing::debug!(event_id = %event_id, "Ignoring failure for a payment that is not pending");
                return smallvec![Effect::None];
            }
            tracing::warn!(event_id = %event_id, reason = %reason, "Payment failed");
            state.checkout = CheckoutPhase::Failed { event_id, reason };
            smallvec![Effect::None]
        },

        CheckoutAction::Cancel => {
            if !state.checkout.is_pending() {
                return smallvec![Effect::None];
            }
            tracing::info!("Checkout cancelled");
            state.checkout = CheckoutPhase::Idle;
            smallvec![Effect::Cancel(EffectId::new(CHECKOUT_EFFECT))]
        },

        CheckoutAction::Reset => {
            if matches!(state.checkout, CheckoutPhase::Failed { .. }) {
                state.checkout = CheckoutPhase::Idle;
            }
            smallvec![Effect::None]
        },
    }
}

fn submit(
    state: &mut AppState,
    event_id: EventId,
    env: &AppEnvironment,
) -> SmallVec<[Effect<AppAction>; 4]> {
    if state.checkout.is_pending() {
        tracing::debug!(event_id = %event_id, "Payment already in progress");
        return smallvec![Effect::None];
    }

    let Some(user_id) = state.user.as_ref().map(|u| u.id.clone()) else {
        state.router.navigate_to(Page::Login, None);
        return smallvec![Effect::None];
    };

    let Some(event) = state.event(&event_id) else {
        tracing::debug!(event_id = %event_id, "Checkout for unknown event");
        return smallvec![Effect::None];
    };

    if env.checkout.enforce_capacity && event.is_sold_out() {
        state.checkout = CheckoutPhase::Failed {
            event_id,
            reason: "This event is sold out".to_string(),
        };
        return smallvec![Effect::None];
    }

    let summary = OrderSummary::new(event.price, env.checkout.processing_fee);
    let request = PaymentRequest {
        event_id: event_id.clone(),
        user_id,
        amount: summary.total,
    };

    state.checkout = CheckoutPhase::Pending {
        event_id,
        started_at: env.clock.now(),
    };

    let gateway = Arc::clone(&env.payments);
    let timeout = env.checkout.payment_timeout;

    let payment = async_effect! {
        let event_id = request.event_id.clone();
        let outcome = tokio::time::timeout(timeout, gateway.charge(request))
            .await
            .unwrap_or(Err(PaymentError::Timeout(timeout)));

        Some(AppAction::Checkout(match outcome {
            Ok(receipt) => CheckoutAction::PaymentSettled {
                event_id,
                transaction_id: receipt.transaction_id,
            },
            Err(error) => CheckoutAction::PaymentFailed {
                event_id,
                reason: error.to_string(),
            },
        }))
    };

    smallvec![cancellable! {
        id: CHECKOUT_EFFECT,
        effect: payment
    }]
}
