//! Data access for events, posts and tickets.
//!
//! Callers go through [`DataService`] and must treat every call as a
//! potentially slow, fallible network request, even though the seed
//! implementation resolves immediately.

use crate::types::{BlogPost, Department, Event, EventCategory, Money, PostId, Ticket, TicketId};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a [`DataService`]
#[derive(Debug, Clone, Error)]
pub enum DataError {
    /// The backing service could not be reached or answered with an error
    #[error("data service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a body that does not match the record shapes
    #[error("could not decode {resource}: {message}")]
    Decode {
        /// What was being fetched
        resource: &'static str,
        /// Decoder message
        message: String,
    },
}

/// Boxed future returned by [`DataService`] methods
pub type DataFuture<T> = Pin<Box<dyn Future<Output = Result<T, DataError>> + Send>>;

/// Source of the site's records
pub trait DataService: Send + Sync {
    /// All events
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the events cannot be fetched or decoded.
    fn get_events(&self) -> DataFuture<Vec<Event>>;

    /// All blog posts, newest first
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the posts cannot be fetched or decoded.
    fn get_posts(&self) -> DataFuture<Vec<BlogPost>>;

    /// Look a ticket up by id; `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the lookup itself fails.
    fn verify_ticket(&self, id: &TicketId) -> DataFuture<Option<Ticket>>;
}

/// In-memory service backed by the built-in seed records
///
/// Ticket lookups always miss: issued tickets live in the application
/// state until a real backend exists.
#[derive(Clone, Debug, Default)]
pub struct SeedDataService;

impl SeedDataService {
    /// Creates the seed service
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn DataService> {
        Arc::new(Self::new())
    }
}

impl DataService for SeedDataService {
    fn get_events(&self) -> DataFuture<Vec<Event>> {
        Box::pin(async { Ok(seed_events()) })
    }

    fn get_posts(&self) -> DataFuture<Vec<BlogPost>> {
        Box::pin(async { Ok(seed_posts()) })
    }

    fn verify_ticket(&self, id: &TicketId) -> DataFuture<Option<Ticket>> {
        tracing::debug!(ticket_id = %id, "Seed data has no ticket store");
        Box::pin(async { Ok(None) })
    }
}

/// Service backed by the organization's JSON API
///
/// Endpoints: `GET {base}/events`, `GET {base}/posts` and
/// `GET {base}/tickets/{id}` (404 means the ticket does not exist).
#[derive(Clone, Debug)]
pub struct HttpDataService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDataService {
    /// Creates a service for the API rooted at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn fetch<T>(&self, resource: &'static str, path: String) -> DataFuture<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let request = self.client.get(format!("{}/{path}", self.base_url));

        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| DataError::Unavailable(e.to_string()))?;

            match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => response
                    .json::<T>()
                    .await
                    .map(Some)
                    .map_err(|e| DataError::Decode {
                        resource,
                        message: e.to_string(),
                    }),
                status => Err(DataError::Unavailable(format!(
                    "GET {path} returned {status}"
                ))),
            }
        })
    }
}

impl DataService for HttpDataService {
    fn get_events(&self) -> DataFuture<Vec<Event>> {
        let fetch = self.fetch::<Vec<Event>>("events", "events".to_string());
        Box::pin(async move { fetch.await.map(Option::unwrap_or_default) })
    }

    fn get_posts(&self) -> DataFuture<Vec<BlogPost>> {
        let fetch = self.fetch::<Vec<BlogPost>>("posts", "posts".to_string());
        Box::pin(async move { fetch.await.map(Option::unwrap_or_default) })
    }

    fn verify_ticket(&self, id: &TicketId) -> DataFuture<Option<Ticket>> {
        self.fetch::<Ticket>("ticket", format!("tickets/{id}"))
    }
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

/// The three seeded community events
#[must_use]
pub fn seed_events() -> Vec<Event> {
    vec![
        Event {
            id: "e1".into(),
            title: "Bangla Noboborsho 1431".to_string(),
            description: "Celebrate the Bengali New Year with traditional food, music, and dance performances.".to_string(),
            date: at("2024-04-14T10:00:00Z"),
            location: "Oklahoma City Convention Center".to_string(),
            price: Money::from_dollars(25),
            capacity: 500,
            sold: 342,
            image: "https://picsum.photos/seed/noboborsho/800/400".to_string(),
            category: EventCategory::Cultural,
            department: Department::Obcs,
        },
        Event {
            id: "e2".into(),
            title: "OBSS Annual Cricket Cup".to_string(),
            description: "Join us for the most exciting cricket tournament in the heart of Oklahoma City.".to_string(),
            date: at("2024-06-20T08:00:00Z"),
            location: "Wheeler Park Sports Grounds".to_string(),
            price: Money::from_dollars(15),
            capacity: 200,
            sold: 45,
            image: "https://picsum.photos/seed/cricket/800/400".to_string(),
            category: EventCategory::Sports,
            department: Department::Obss,
        },
        Event {
            id: "e3".into(),
            title: "Eid-ul-Adha Get Together".to_string(),
            description: "A community gathering to celebrate Eid with the Oklahomabashi family.".to_string(),
            date: at("2024-06-16T18:00:00Z"),
            location: "Moore Community Center".to_string(),
            price: Money::from_dollars(10),
            capacity: 300,
            sold: 120,
            image: "https://picsum.photos/seed/eid/800/400".to_string(),
            category: EventCategory::Cultural,
            department: Department::Central,
        },
    ]
}

/// The seeded news posts, newest first
#[must_use]
pub fn seed_posts() -> Vec<BlogPost> {
    vec![
        BlogPost {
            id: PostId::new("p1"),
            title: "OBCS Expands Cultural Library".to_string(),
            excerpt: "The Oklahoma-Bangladeshi Cultural Society has added 200 new titles to its library collection.".to_string(),
            content: "Full content here about the library expansion and how members can access it...".to_string(),
            author: "Sultana Ahmed".to_string(),
            date: at("2024-03-01T12:00:00Z"),
            image: "https://picsum.photos/seed/library/600/400".to_string(),
            category: "Society News".to_string(),
            tags: vec!["OBCS".to_string(), "Library".to_string(), "Culture".to_string()],
        },
        BlogPost {
            id: PostId::new("p2"),
            title: "Bangladeshi Youth Football Clinic".to_string(),
            excerpt: "OBSS announces its first summer football clinic for kids aged 8-15.".to_string(),
            content: "Full content about the football clinic schedule and registration details...".to_string(),
            author: "Zayed Khan".to_string(),
            date: at("2024-02-25T09:00:00Z"),
            image: "https://picsum.photos/seed/football/600/400".to_string(),
            category: "Sports".to_string(),
            tags: vec!["OBSS".to_string(), "Youth".to_string(), "Sports".to_string()],
        },
    ]
}
