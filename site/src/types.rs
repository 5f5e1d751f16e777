//! Domain types for the Oklahomabashi site.
//!
//! Records mirror the JSON shapes the future backend will serve: field names
//! are camelCase, enumerations are SCREAMING_CASE, timestamps are RFC 3339 and
//! prices are decimal dollar amounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a site member (`user1`, `admin1`, `user-1718000000000`)
    UserId
);
string_id!(
    /// Identifier of an event (`e1`, `e2`, ...)
    EventId
);
string_id!(
    /// Identifier of an issued ticket (`TKT-` followed by 9 base-36 characters)
    TicketId
);
string_id!(
    /// Identifier of a blog post
    PostId
);

// ============================================================================
// Users
// ============================================================================

/// Role of a signed-in member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular member
    User,
    /// Organization administrator
    Admin,
    /// Administrator across all departments
    SuperAdmin,
}

impl UserRole {
    /// Whether this role may open the admin dashboard
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

/// A signed-in member
///
/// Sessions are simulated: users are fabricated by the login and
/// registration forms and live only as long as the application state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Member id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address used to sign in
    pub email: String,
    /// Role
    pub role: UserRole,
    /// Avatar image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// First character of the display name, shown in the account badge
    #[must_use]
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next()
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// An amount of US dollars, stored in cents
///
/// On the wire a `Money` is a decimal dollar number (`25`, `2.5`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Money(u64);

impl Money {
    /// Zero dollars
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars, saturating on overflow
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies by a quantity, saturating on overflow
    #[must_use]
    pub const fn saturating_mul(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// Sums amounts, saturating on overflow
    pub fn sum<I: IntoIterator<Item = Self>>(amounts: I) -> Self {
        Self(amounts.into_iter().fold(0_u64, |acc, m| acc.saturating_add(m.0)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<Money> for f64 {
    #[allow(clippy::cast_precision_loss)] // Amounts stay far below 2^52 cents
    fn from(money: Money) -> Self {
        money.0 as f64 / 100.0
    }
}

/// A dollar amount that cannot be represented as [`Money`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid dollar amount: {0}")]
pub struct InvalidAmount(pub f64);

impl TryFrom<f64> for Money {
    type Error = InvalidAmount;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Range checked above
    fn try_from(dollars: f64) -> Result<Self, Self::Error> {
        let cents = (dollars * 100.0).round();
        if !cents.is_finite() || cents < 0.0 || cents > 9.0e15 {
            return Err(InvalidAmount(dollars));
        }
        Ok(Self(cents as u64))
    }
}

// ============================================================================
// Events
// ============================================================================

/// Kind of event, used by the events page filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    /// Festivals, holidays and performances
    Cultural,
    /// Tournaments and clinics
    Sports,
    /// Everything else
    General,
}

/// Department that organizes an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Department {
    /// Oklahoma-Bangladeshi Cultural Society
    Obcs,
    /// Oklahoma-Bangladeshi Sports Society
    Obss,
    /// The umbrella organization
    Central,
}

impl Department {
    /// Short display name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Obcs => "OBCS",
            Self::Obss => "OBSS",
            Self::Central => "CENTRAL",
        }
    }
}

/// A ticketed community event
///
/// `sold` is the only field that changes at runtime: one per completed
/// purchase. `sold <= capacity` holds only when capacity enforcement is
/// switched on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id
    pub id: EventId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Start time
    pub date: DateTime<Utc>,
    /// Venue
    pub location: String,
    /// Price of one ticket
    pub price: Money,
    /// Total tickets available
    pub capacity: u32,
    /// Tickets sold so far
    pub sold: u32,
    /// Banner image reference
    pub image: String,
    /// Category
    pub category: EventCategory,
    /// Organizing department
    pub department: Department,
}

impl Event {
    /// Tickets left; zero once sold out (or oversold)
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.sold)
    }

    /// Whether every ticket has been sold
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.sold >= self.capacity
    }

    /// Ticket revenue so far (`sold * price`)
    #[must_use]
    pub const fn revenue(&self) -> Money {
        self.price.saturating_mul(self.sold)
    }

    /// Share of capacity sold, `0.0` for events without capacity
    #[must_use]
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            f64::from(self.sold) / f64::from(self.capacity)
        }
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Lifecycle status of a ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Issued and not yet scanned
    Valid,
    /// Admitted at the door
    Used,
    /// Voided
    Cancelled,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "VALID",
            Self::Used => "USED",
            Self::Cancelled => "CANCELLED",
        })
    }
}

/// Proof of purchase of one admission to one event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket id
    pub id: TicketId,
    /// Event this ticket admits to
    pub event_id: EventId,
    /// Purchaser
    pub user_id: UserId,
    /// Purchase time
    pub purchase_date: DateTime<Utc>,
    /// Status
    pub status: TicketStatus,
    /// Opaque payload encoded in the ticket's QR code
    pub qr_code: String,
}

impl Ticket {
    /// Mark a valid ticket as used
    ///
    /// Returns `false` (and leaves the ticket unchanged) unless the ticket
    /// is currently valid.
    pub fn mark_used(&mut self) -> bool {
        if self.status == TicketStatus::Valid {
            self.status = TicketStatus::Used;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Blog
// ============================================================================

/// A news article
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// Post id
    pub id: PostId,
    /// Headline
    pub title: String,
    /// Teaser shown in listings
    pub excerpt: String,
    /// Full article
    pub content: String,
    /// Author name
    pub author: String,
    /// Publication time
    pub date: DateTime<Utc>,
    /// Cover image reference
    pub image: String,
    /// Free-form category label
    pub category: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
}
