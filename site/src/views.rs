//! Render-ready view models.
//!
//! Views are pure functions of [`AppState`]. A view that needs the member
//! elsewhere (the dashboard without a session) returns
//! [`PageView::Redirect`]; the shell dispatches the navigation.

use crate::app::AppState;
use crate::checkout::{CheckoutConfig, CheckoutPhase, OrderSummary};
use crate::routing::{select_view, Page, View};
use crate::types::{BlogPost, Event, EventCategory, Money, Ticket, User, UserId, UserRole};
use bashi_core::environment::Clock;

/// Events and posts shown on the landing page
const HOME_FEATURED: usize = 3;

/// Characters of an event title kept in the admin chart label
const ADMIN_LABEL_CHARS: usize = 10;

/// What the current page shows
#[derive(Clone, Debug, PartialEq)]
pub enum PageView<'a> {
    /// The catalog is still loading
    Loading,
    /// The page needs a different location first
    Redirect(Page),
    /// Landing page
    Home(HomeView<'a>),
    /// Event listing with all events
    Events(EventsView<'a>),
    /// News feed
    News(NewsView<'a>),
    /// Sign in form
    Login,
    /// Registration form
    Register,
    /// Member dashboard
    Dashboard(DashboardView<'a>),
    /// Admin dashboard
    Admin(AdminView<'a>),
    /// Checkout
    BuyTicket(BuyTicketView<'a>),
    /// Ticket verification tool
    Verify,
}

/// Build the view for the current route
#[must_use]
pub fn render<'a>(state: &'a AppState, checkout: &CheckoutConfig) -> PageView<'a> {
    if state.is_loading {
        return PageView::Loading;
    }

    match select_view(state.router.route(), state.user.as_ref()) {
        View::Home => PageView::Home(HomeView::build(state)),
        View::Events => PageView::Events(EventsView::build(&state.events, EventFilter::All, "")),
        View::News => PageView::News(NewsView::build(&state.posts)),
        View::Login => PageView::Login,
        View::Register => PageView::Register,
        View::Dashboard => DashboardView::build(state)
            .map_or(PageView::Redirect(Page::Login), PageView::Dashboard),
        View::Admin => PageView::Admin(AdminView::build(&state.events, &state.tickets)),
        View::BuyTicket { event_id } => PageView::BuyTicket(BuyTicketView::build(
            state,
            event_id.as_deref(),
            checkout.processing_fee,
        )),
        View::Verify => PageView::Verify,
    }
}

// ============================================================================
// Public pages
// ============================================================================

/// Landing page content
#[derive(Clone, Debug, PartialEq)]
pub struct HomeView<'a> {
    /// First events of the catalog
    pub featured_events: &'a [Event],
    /// Most recent posts
    pub latest_posts: &'a [BlogPost],
}

impl<'a> HomeView<'a> {
    /// Up to three events and three posts
    #[must_use]
    pub fn build(state: &'a AppState) -> Self {
        Self {
            featured_events: &state.events[..state.events.len().min(HOME_FEATURED)],
            latest_posts: &state.posts[..state.posts.len().min(HOME_FEATURED)],
        }
    }
}

/// Category tab of the event listing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EventFilter {
    /// Every event
    #[default]
    All,
    /// Cultural society events
    Cultural,
    /// Sports society events
    Sports,
}

impl EventFilter {
    /// Whether an event in `category` passes the filter
    #[must_use]
    pub fn admits(self, category: EventCategory) -> bool {
        match self {
            Self::All => true,
            Self::Cultural => category == EventCategory::Cultural,
            Self::Sports => category == EventCategory::Sports,
        }
    }
}

/// One event in the listing
#[derive(Clone, Debug, PartialEq)]
pub struct EventCard<'a> {
    /// The event
    pub event: &'a Event,
    /// "N tickets remaining"
    pub availability: String,
}

/// Filtered event listing
#[derive(Clone, Debug, PartialEq)]
pub struct EventsView<'a> {
    /// Active tab
    pub filter: EventFilter,
    /// Matching events in catalog order
    pub cards: Vec<EventCard<'a>>,
}

impl<'a> EventsView<'a> {
    /// Events admitted by `filter` whose title or description contains
    /// `search`, ignoring case
    #[must_use]
    pub fn build(events: &'a [Event], filter: EventFilter, search: &str) -> Self {
        let needle = search.trim().to_lowercase();
        let cards = events
            .iter()
            .filter(|e| filter.admits(e.category))
            .filter(|e| {
                needle.is_empty()
                    || e.title.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            })
            .map(|event| EventCard {
                event,
                availability: format!("{} tickets remaining", event.remaining()),
            })
            .collect();

        Self { filter, cards }
    }

    /// Whether the empty-result message is shown
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// News feed: the newest post featured, the rest below
#[derive(Clone, Debug, PartialEq)]
pub struct NewsView<'a> {
    /// Newest post
    pub featured: Option<&'a BlogPost>,
    /// Remaining posts
    pub rest: &'a [BlogPost],
}

impl<'a> NewsView<'a> {
    /// Splits the newest post from the rest
    #[must_use]
    pub fn build(posts: &'a [BlogPost]) -> Self {
        match posts.split_first() {
            Some((featured, rest)) => Self {
                featured: Some(featured),
                rest,
            },
            None => Self {
                featured: None,
                rest: &[],
            },
        }
    }
}

// ============================================================================
// Account forms
// ============================================================================

/// Sign in form contents
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email address
    pub email: String,
    /// Password (not checked)
    pub password: String,
}

impl LoginForm {
    /// Member for this form
    ///
    /// Credentials are not checked. The organization's admin address signs
    /// in as the admin account; any other address, including a differently
    /// cased one, as the guest account.
    #[must_use]
    pub fn submit(&self, admin_email: &str) -> User {
        let email = self.email.trim().to_string();
        if email == admin_email {
            User {
                id: UserId::new("admin1"),
                name: "Admin User".to_string(),
                email,
                role: UserRole::Admin,
                avatar: None,
            }
        } else {
            User {
                id: UserId::new("user1"),
                name: "Guest User".to_string(),
                email,
                role: UserRole::User,
                avatar: None,
            }
        }
    }
}

/// Registration form contents
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterForm {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password (not stored)
    pub password: String,
}

impl RegisterForm {
    /// New member account, id derived from the current time
    #[must_use]
    pub fn submit(&self, clock: &dyn Clock) -> User {
        User {
            id: UserId::new(format!("user-{}", clock.now().timestamp_millis())),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: UserRole::User,
            avatar: None,
        }
    }
}

// ============================================================================
// Member and admin dashboards
// ============================================================================

/// A ticket with the event it admits to
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedTicket<'a> {
    /// The ticket
    pub ticket: &'a Ticket,
    /// Its event
    pub event: &'a Event,
}

/// Member dashboard
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardView<'a> {
    /// Signed-in member
    pub user: &'a User,
    /// Member's tickets in purchase order; tickets for missing events are skipped
    pub tickets: Vec<OwnedTicket<'a>>,
}

impl<'a> DashboardView<'a> {
    /// `None` without a signed-in member
    #[must_use]
    pub fn build(state: &'a AppState) -> Option<Self> {
        let user = state.user.as_ref()?;
        let tickets = state
            .my_tickets()
            .into_iter()
            .filter_map(|ticket| state.event(&ticket.event_id).map(|event| OwnedTicket { ticket, event }))
            .collect();
        Some(Self { user, tickets })
    }
}

/// Per-event row of the admin dashboard
#[derive(Clone, Debug, PartialEq)]
pub struct EventStats<'a> {
    /// The event
    pub event: &'a Event,
    /// Chart label: the first ten characters of the title followed by `...`
    pub label: String,
    /// Tickets sold
    pub sold: u32,
    /// Revenue from sold tickets
    pub revenue: Money,
    /// Sold over capacity, as a rounded percentage
    pub fill_percent: u32,
}

/// Admin dashboard
#[derive(Clone, Debug, PartialEq)]
pub struct AdminView<'a> {
    /// Sum of `sold × price` over all events
    pub total_revenue: Money,
    /// Tickets issued this session
    pub tickets_issued: usize,
    /// Events in the catalog
    pub active_events: usize,
    /// One row per event
    pub events: Vec<EventStats<'a>>,
    /// Tickets in issue order
    pub live_feed: &'a [Ticket],
}

impl<'a> AdminView<'a> {
    /// Totals and per-event rows for the current catalog
    #[must_use]
    pub fn build(events: &'a [Event], tickets: &'a [Ticket]) -> Self {
        let rows: Vec<EventStats<'a>> = events
            .iter()
            .map(|event| EventStats {
                event,
                label: format!("{}...", event.title.chars().take(ADMIN_LABEL_CHARS).collect::<String>()),
                sold: event.sold,
                revenue: event.revenue(),
                fill_percent: percent(event.fill_ratio()),
            })
            .collect();

        Self {
            total_revenue: Money::sum(rows.iter().map(|r| r.revenue)),
            tickets_issued: tickets.len(),
            active_events: events.len(),
            events: rows,
            live_feed: tickets,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round().max(0.0) as u32
}

// ============================================================================
// Checkout
// ============================================================================

/// Checkout page
#[derive(Clone, Debug, PartialEq)]
pub enum BuyTicketView<'a> {
    /// No event with the selected id
    NotFound,
    /// Order form for an event
    Order {
        /// The event
        event: &'a Event,
        /// Price breakdown
        summary: OrderSummary,
        /// Payment in flight; the pay button is disabled
        is_processing: bool,
        /// Reason the last attempt for this event failed
        failure: Option<&'a str>,
    },
}

impl<'a> BuyTicketView<'a> {
    /// Message shown when the event is missing
    pub const NOT_FOUND: &'static str = "Event not found";

    /// Order form for `event_id`, or [`Self::NOT_FOUND`] when it is unknown
    #[must_use]
    pub fn build(state: &'a AppState, event_id: Option<&str>, processing_fee: Money) -> Self {
        let Some(event) = event_id.and_then(|id| state.events.iter().find(|e| e.id.as_str() == id)) else {
            return Self::NotFound;
        };

        let failure = match &state.checkout {
            CheckoutPhase::Failed { event_id, reason } if event_id == &event.id => Some(reason.as_str()),
            _ => None,
        };

        Self::Order {
            event,
            summary: OrderSummary::new(event.price, processing_fee),
            is_processing: state.checkout.is_pending(),
            failure,
        }
    }
}
