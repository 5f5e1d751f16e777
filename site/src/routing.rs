//! Hash-fragment routing.
//!
//! The location fragment (`#<page>` or `#<page>/<entityId>`) is the single
//! source of truth for what is on screen. Navigating writes a new fragment
//! and re-parses it; nothing else changes the route.

use crate::types::User;
use std::fmt;
use std::str::FromStr;

/// Every page the site knows how to address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Page {
    /// Landing page
    Home,
    /// Event listing
    Events,
    /// News feed
    News,
    /// About the organization
    About,
    /// Contact details
    Contact,
    /// Sign in
    Login,
    /// Create an account
    Register,
    /// Admin dashboard
    Admin,
    /// Member dashboard with purchased tickets
    Dashboard,
    /// Checkout for one event
    BuyTicket,
    /// Door-side ticket verification
    Verify,
    /// Detail page for one event
    EventDetails,
}

impl Page {
    /// All pages, in navigation order
    pub const ALL: [Self; 12] = [
        Self::Home,
        Self::Events,
        Self::News,
        Self::About,
        Self::Contact,
        Self::Login,
        Self::Register,
        Self::Admin,
        Self::Dashboard,
        Self::BuyTicket,
        Self::Verify,
        Self::EventDetails,
    ];

    /// Fragment identifier of this page
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Events => "events",
            Self::News => "news",
            Self::About => "about",
            Self::Contact => "contact",
            Self::Login => "login",
            Self::Register => "register",
            Self::Admin => "admin",
            Self::Dashboard => "dashboard",
            Self::BuyTicket => "buy-ticket",
            Self::Verify => "verify",
            Self::EventDetails => "event-details",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fragment identifier that names no known page
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown page identifier: {0:?}")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| UnknownPage(s.to_string()))
    }
}

/// Page part of a route
///
/// Unknown identifiers are preserved so that the fragment round-trips; they
/// resolve to [`Page::Home`] only when a view is selected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PageId {
    /// A recognized page
    Known(Page),
    /// Anything else
    Unknown(String),
}

impl PageId {
    fn parse(s: &str) -> Self {
        s.parse().map_or_else(|_| Self::Unknown(s.to_string()), Self::Known)
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Known(page) => page.as_str(),
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<Page> for PageId {
    fn from(page: Page) -> Self {
        Self::Known(page)
    }
}

/// A parsed location fragment
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Route {
    /// Page identifier
    pub page: PageId,
    /// Selected entity (an event id for `buy-ticket` and `event-details`)
    pub entity_id: Option<String>,
}

impl Route {
    /// Route to `page` without an entity
    #[must_use]
    pub const fn to_page(page: Page) -> Self {
        Self {
            page: PageId::Known(page),
            entity_id: None,
        }
    }

    /// Parse a location fragment; never fails
    ///
    /// A leading `#` is ignored, an empty fragment is `home`, and the
    /// fragment is split on its first `/` into page and entity id.
    #[must_use]
    pub fn parse(fragment: &str) -> Self {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return Self::to_page(Page::Home);
        }

        match fragment.split_once('/') {
            Some((page, id)) => Self {
                page: PageId::parse(page),
                entity_id: Some(id.to_string()),
            },
            None => Self {
                page: PageId::parse(fragment),
                entity_id: None,
            },
        }
    }

    /// The fragment for this route, without the leading `#`
    #[must_use]
    pub fn to_fragment(&self) -> String {
        match &self.entity_id {
            Some(id) => format!("{}/{id}", self.page.as_str()),
            None => self.page.as_str().to_string(),
        }
    }

    /// The recognized page, with unknown identifiers falling back to home
    #[must_use]
    pub const fn resolved_page(&self) -> Page {
        match self.page {
            PageId::Known(page) => page,
            PageId::Unknown(_) => Page::Home,
        }
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::to_page(Page::Home)
    }
}

/// Current location of the application
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Router {
    fragment: String,
    route: Route,
    scroll_resets: u64,
}

impl Router {
    /// Router positioned at `fragment`
    #[must_use]
    pub fn at(fragment: &str) -> Self {
        let mut router = Self::default();
        router.set_fragment(fragment);
        router
    }

    /// React to a location change
    ///
    /// Every change, including re-entering the current fragment, scrolls
    /// the page back to the top.
    pub fn set_fragment(&mut self, fragment: &str) {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        self.fragment = fragment.to_string();
        self.route = Route::parse(fragment);
        self.scroll_resets += 1;
        tracing::debug!(fragment, "Route changed");
    }

    /// Navigate by writing the fragment for `page` (and `entity_id`)
    pub fn navigate_to(&mut self, page: Page, entity_id: Option<String>) {
        let fragment = Route {
            page: PageId::Known(page),
            entity_id,
        }
        .to_fragment();
        self.set_fragment(&fragment);
    }

    /// Current fragment, without the leading `#`
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Current route
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// How many times the page has been scrolled back to the top
    #[must_use]
    pub const fn scroll_resets(&self) -> u64 {
        self.scroll_resets
    }
}

/// The screen rendered for a route
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    /// Landing page
    Home,
    /// Event listing
    Events,
    /// News feed
    News,
    /// Admin dashboard
    Admin,
    /// Sign in form
    Login,
    /// Registration form
    Register,
    /// Checkout for the selected event (if any)
    BuyTicket {
        /// Selected event id
        event_id: Option<String>,
    },
    /// Ticket verification tool
    Verify,
    /// Member dashboard
    Dashboard,
}

/// Choose the screen for `route`
///
/// Pages without a dedicated screen (`about`, `contact`, `event-details`)
/// and unknown pages render home. The admin dashboard is only shown to
/// admins; everyone else sees home.
#[must_use]
pub fn select_view(route: &Route, user: Option<&User>) -> View {
    match route.resolved_page() {
        Page::Events => View::Events,
        Page::News => View::News,
        Page::Admin if user.is_some_and(|u| u.role.is_admin()) => View::Admin,
        Page::Login => View::Login,
        Page::Register => View::Register,
        Page::BuyTicket => View::BuyTicket {
            event_id: route.entity_id.clone(),
        },
        Page::Verify => View::Verify,
        Page::Dashboard => View::Dashboard,
        Page::Home | Page::Admin | Page::About | Page::Contact | Page::EventDetails => View::Home,
    }
}

/// A navigation entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavLink {
    /// Label shown to the user
    pub label: &'static str,
    /// Destination
    pub page: Page,
    /// Whether this is the current page
    pub active: bool,
}

/// Links shown in the header and footer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    /// Always-visible site sections
    pub public: Vec<NavLink>,
    /// Account menu for a signed-in member
    pub account: Vec<NavLink>,
    /// Sign-in and join links for visitors
    pub guest: Vec<NavLink>,
}

impl Navigation {
    /// Links for the current page and session
    #[must_use]
    pub fn for_session(current: &Route, user: Option<&User>) -> Self {
        let link = |label, page| NavLink {
            label,
            page,
            active: current.page == PageId::Known(page),
        };

        let public = vec![
            link("Home", Page::Home),
            link("Events", Page::Events),
            link("News", Page::News),
            link("About", Page::About),
            link("Contact", Page::Contact),
        ];

        let (account, guest) = match user {
            Some(user) => {
                let mut account = vec![link("My Dashboard", Page::Dashboard)];
                if user.role.is_admin() {
                    account.push(link("Admin Panel", Page::Admin));
                }
                account.push(link("Verify Tickets", Page::Verify));
                (account, Vec::new())
            },
            None => (
                Vec::new(),
                vec![link("Sign In", Page::Login), link("Join Us", Page::Register)],
            ),
        };

        Self {
            public,
            account,
            guest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UserId, UserRole};

    fn member(role: UserRole) -> User {
        User {
            id: UserId::new("user1"),
            name: "Guest User".to_string(),
            email: "guest@example.com".to_string(),
            role,
            avatar: None,
        }
    }

    #[test]
    fn empty_fragment_is_home() {
        assert_eq!(Route::parse(""), Route::to_page(Page::Home));
        assert_eq!(Route::parse("#"), Route::to_page(Page::Home));
    }

    #[test]
    fn splits_on_first_slash() {
        let route = Route::parse("#buy-ticket/e2");
        assert_eq!(route.page, PageId::Known(Page::BuyTicket));
        assert_eq!(route.entity_id.as_deref(), Some("e2"));

        let nested = Route::parse("event-details/e1/extra");
        assert_eq!(nested.page, PageId::Known(Page::EventDetails));
        assert_eq!(nested.entity_id.as_deref(), Some("e1/extra"));
    }

    #[test]
    fn unknown_page_is_kept_until_view_selection() {
        let route = Route::parse("#gallery");
        assert_eq!(route.page, PageId::Unknown("gallery".to_string()));
        assert_eq!(route.to_fragment(), "gallery");
        assert_eq!(route.resolved_page(), Page::Home);
        assert_eq!(select_view(&route, None), View::Home);
    }

    #[test]
    fn page_identifiers_round_trip() {
        for page in Page::ALL {
            assert_eq!(page.as_str().parse::<Page>(), Ok(page));
        }
        assert!("Home".parse::<Page>().is_err());
    }

    #[test]
    fn admin_view_requires_admin_role() {
        let route = Route::parse("admin");
        assert_eq!(select_view(&route, None), View::Home);
        assert_eq!(select_view(&route, Some(&member(UserRole::User))), View::Home);
        assert_eq!(select_view(&route, Some(&member(UserRole::Admin))), View::Admin);
        assert_eq!(select_view(&route, Some(&member(UserRole::SuperAdmin))), View::Admin);
    }

    #[test]
    fn pages_without_screens_render_home() {
        for fragment in ["about", "contact", "event-details/e1"] {
            assert_eq!(select_view(&Route::parse(fragment), None), View::Home);
        }
        assert_eq!(
            select_view(&Route::parse("buy-ticket/e3"), None),
            View::BuyTicket {
                event_id: Some("e3".to_string())
            }
        );
    }

    #[test]
    fn navigate_to_writes_fragment_and_resets_scroll() {
        let mut router = Router::at("");
        assert_eq!(router.scroll_resets(), 1);

        router.navigate_to(Page::BuyTicket, Some("e2".to_string()));
        assert_eq!(router.fragment(), "buy-ticket/e2");
        assert_eq!(router.route(), &Route::parse("buy-ticket/e2"));
        assert_eq!(router.scroll_resets(), 2);

        router.navigate_to(Page::Dashboard, None);
        assert_eq!(router.fragment(), "dashboard");
        assert_eq!(router.route().entity_id, None);
    }

    #[test]
    fn navigation_links_follow_session() {
        let current = Route::parse("events");
        let guest = Navigation::for_session(&current, None);
        assert!(guest.account.is_empty());
        assert_eq!(guest.guest.len(), 2);
        assert!(guest.public.iter().any(|l| l.page == Page::Events && l.active));

        let admin = Navigation::for_session(&current, Some(&member(UserRole::Admin)));
        let pages: Vec<Page> = admin.account.iter().map(|l| l.page).collect();
        assert_eq!(pages, vec![Page::Dashboard, Page::Admin, Page::Verify]);
        assert!(admin.guest.is_empty());

        let user = Navigation::for_session(&current, Some(&member(UserRole::User)));
        assert!(!user.account.iter().any(|l| l.page == Page::Admin));
    }
}
