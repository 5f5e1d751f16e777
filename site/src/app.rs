//! Application state store: the single owner of the session, the catalog and
//! issued tickets.
//!
//! Every mutation goes through [`AppReducer`]. The runtime applies one
//! action at a time under its write lock, so a purchase (new ticket plus
//! the event's `sold` increment) is observed entirely or not at all.

use crate::checkout::{self, CheckoutAction, CheckoutConfig, CheckoutPhase, PaymentGateway};
use crate::data::{DataError, DataService};
use crate::routing::{Page, Router};
use crate::types::{BlogPost, Event, EventId, Ticket, TicketId, TicketStatus, User};
use bashi_core::{
    async_effect,
    effect::Effect,
    environment::{Clock, IdGenerator, SystemClock},
    reducer::Reducer,
    smallvec, SmallVec,
};
use rand::Rng;
use std::sync::Arc;

/// Confirmation shown after a successful purchase
pub const PURCHASE_CONFIRMATION: &str = "Ticket purchased successfully! Redirecting to your dashboard.";

// ============================================================================
// State
// ============================================================================

/// Severity of a [`Notice`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Something completed
    Success,
    /// Something was refused
    Error,
}

/// Non-blocking message for the user, shown until dismissed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub kind: NoticeKind,
    /// Text
    pub message: String,
}

/// Everything the views render from
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Current location
    pub router: Router,
    /// Signed-in member
    pub user: Option<User>,
    /// Event catalog
    pub events: Vec<Event>,
    /// News posts
    pub posts: Vec<BlogPost>,
    /// Tickets issued this session, in purchase order
    pub tickets: Vec<Ticket>,
    /// Whether the catalog is being fetched
    pub is_loading: bool,
    /// Checkout progress
    pub checkout: CheckoutPhase,
    /// Pending notices, oldest first
    pub notices: Vec<Notice>,
}

impl AppState {
    /// State positioned at `fragment` with no data loaded
    #[must_use]
    pub fn at(fragment: &str) -> Self {
        Self {
            router: Router::at(fragment),
            ..Self::default()
        }
    }

    /// State with an already-loaded catalog
    #[must_use]
    pub fn with_data(events: Vec<Event>, posts: Vec<BlogPost>) -> Self {
        Self {
            events,
            posts,
            ..Self::at("")
        }
    }

    /// Event by id
    #[must_use]
    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Tickets owned by the signed-in member
    #[must_use]
    pub fn my_tickets(&self) -> Vec<&Ticket> {
        self.user.as_ref().map_or_else(Vec::new, |user| {
            self.tickets.iter().filter(|t| t.user_id == user.id).collect()
        })
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs to the application store
#[derive(Clone, Debug)]
pub enum AppAction {
    /// The location fragment changed (including the initial location)
    LocationChanged {
        /// New fragment, with or without the leading `#`
        fragment: String,
    },
    /// Go to a page
    Navigate {
        /// Destination
        page: Page,
        /// Selected entity
        entity_id: Option<String>,
    },
    /// Fetch events and posts
    LoadData,
    /// Fetch succeeded
    DataLoaded {
        /// Events
        events: Vec<Event>,
        /// Posts
        posts: Vec<BlogPost>,
    },
    /// Fetch failed
    DataLoadFailed {
        /// What went wrong
        error: DataError,
    },
    /// Start a session
    Login {
        /// Member signing in
        user: User,
    },
    /// End the session
    Logout,
    /// Issue a ticket for an event to the signed-in member
    PurchaseTicket {
        /// Event to buy
        event_id: EventId,
    },
    /// Checkout flow input
    Checkout(CheckoutAction),
    /// Drop the oldest notice
    DismissNotice,
}

// ============================================================================
// Environment
// ============================================================================

/// Ticket id tokens drawn uniformly from `0-9A-Z`
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_token(&self) -> String {
        const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let mut rng = rand::thread_rng();
        (0..9)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect()
    }
}

/// Dependencies of [`AppReducer`]
#[derive(Clone)]
pub struct AppEnvironment {
    /// Time source for purchase dates and QR payloads
    pub clock: Arc<dyn Clock>,
    /// Ticket id tokens
    pub ids: Arc<dyn IdGenerator>,
    /// Catalog source
    pub data: Arc<dyn DataService>,
    /// Payment processor
    pub payments: Arc<dyn PaymentGateway>,
    /// Checkout tuning
    pub checkout: CheckoutConfig,
}

impl AppEnvironment {
    /// Production environment around the given data and payment services
    #[must_use]
    pub fn new(
        data: Arc<dyn DataService>,
        payments: Arc<dyn PaymentGateway>,
        checkout: CheckoutConfig,
    ) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIdGenerator),
            data,
            payments,
            checkout,
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the id generator
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the whole application
#[derive(Clone, Copy, Debug, Default)]
pub struct AppReducer;

impl AppReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut AppState,
        action: AppAction,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        match action {
            AppAction::LocationChanged { fragment } => {
                state.router.set_fragment(&fragment);
                smallvec![Effect::None]
            },

            AppAction::Navigate { page, entity_id } => {
                state.router.navigate_to(page, entity_id);
                smallvec![Effect::None]
            },

            AppAction::LoadData => {
                state.is_loading = true;
                let data = Arc::clone(&env.data);

                smallvec![async_effect! {
                    let (events, posts) = futures::join!(data.get_events(), data.get_posts());
                    Some(match (events, posts) {
                        (Ok(events), Ok(posts)) => AppAction::DataLoaded { events, posts },
                        (Err(error), _) | (_, Err(error)) => AppAction::DataLoadFailed { error },
                    })
                }]
            },

            AppAction::DataLoaded { events, posts } => {
                tracing::debug!(events = events.len(), posts = posts.len(), "Catalog loaded");
                state.events = events;
                state.posts = posts;
                state.is_loading = false;
                smallvec![Effect::None]
            },

            AppAction::DataLoadFailed { error } => {
                tracing::error!(%error, "Failed to load initial data");
                state.is_loading = false;
                smallvec![Effect::None]
            },

            AppAction::Login { user } => {
                tracing::info!(user_id = %user.id, role = ?user.role, "Signed in");
                state.user = Some(user);
                state.router.navigate_to(Page::Home, None);
                smallvec![Effect::None]
            },

            AppAction::Logout => {
                state.user = None;
                state.router.navigate_to(Page::Home, None);
                smallvec![Effect::None]
            },

            AppAction::PurchaseTicket { event_id } => {
                purchase_ticket(state, &event_id, env);
                smallvec![Effect::None]
            },

            AppAction::Checkout(action) => checkout::reduce(state, action, env),

            AppAction::DismissNotice => {
                if !state.notices.is_empty() {
                    state.notices.remove(0);
                }
                smallvec![Effect::None]
            },
        }
    }
}

/// Issue a ticket for `event_id` to the signed-in member
///
/// Without a member this only redirects to the login page. An unknown
/// event is ignored. Otherwise the ticket is appended, the event's `sold`
/// count goes up by one, a confirmation notice is queued and the member
/// lands on their dashboard.
pub(crate) fn purchase_ticket(state: &mut AppState, event_id: &EventId, env: &AppEnvironment) {
    let Some(user_id) = state.user.as_ref().map(|u| u.id.clone()) else {
        state.router.navigate_to(Page::Login, None);
        return;
    };

    let Some(event) = state.events.iter_mut().find(|e| &e.id == event_id) else {
        tracing::debug!(event_id = %event_id, "Purchase for unknown event ignored");
        return;
    };

    if env.checkout.enforce_capacity && event.is_sold_out() {
        tracing::warn!(event_id = %event_id, capacity = event.capacity, "Purchase refused: sold out");
        state.notices.push(Notice {
            kind: NoticeKind::Error,
            message: format!("{} is sold out.", event.title),
        });
        return;
    }

    let now = env.clock.now();
    let ticket = Ticket {
        id: TicketId::new(format!("TKT-{}", env.ids.next_token())),
        event_id: event_id.clone(),
        user_id: user_id.clone(),
        purchase_date: now,
        status: TicketStatus::Valid,
        qr_code: format!("OKL-{event_id}-{user_id}-{}", now.timestamp_millis()),
    };

    event.sold = event.sold.saturating_add(1);
    tracing::info!(
        event_id = %event_id,
        ticket_id = %ticket.id,
        sold = event.sold,
        "Ticket issued"
    );
    metrics::counter!("site.tickets.issued").increment(1);

    state.tickets.push(ticket);
    state.notices.push(Notice {
        kind: NoticeKind::Success,
        message: PURCHASE_CONFIRMATION.to_string(),
    });
    state.router.navigate_to(Page::Dashboard, None);
}
