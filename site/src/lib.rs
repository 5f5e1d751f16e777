//! # Bashi Site
//!
//! Application core of the Oklahomabashi community site: hash routing, the
//! application store, ticket checkout and verification, the community
//! assistant chat and the view models the pages render from.
//!
//! All state changes go through reducers run by a `bashi_runtime::Store`:
//!
//! - [`app::AppReducer`] owns the session, catalog, tickets and checkout
//! - [`chat::ChatReducer`] owns the assistant transcript
//!
//! ## Example
//!
//! ```ignore
//! use bashi_runtime::Store;
//! use bashi_site::{AppAction, AppEnvironment, AppReducer, AppState};
//!
//! let store = Store::new(AppState::at("#home"), AppReducer::new(), env);
//! store.send(AppAction::LoadData).await?;
//! ```

pub mod app;
pub mod chat;
pub mod checkout;
pub mod config;
pub mod data;
pub mod routing;
pub mod types;
pub mod verification;
pub mod views;

pub use app::{AppAction, AppEnvironment, AppReducer, AppState, Notice, NoticeKind};
pub use chat::{ChatAction, ChatEnvironment, ChatReducer, ChatState};
pub use checkout::{CheckoutAction, CheckoutConfig, CheckoutPhase};
pub use config::Config;
pub use data::{DataError, DataService, HttpDataService, SeedDataService};
pub use routing::{Page, Route, Router};
pub use types::{BlogPost, Event, Money, Ticket, User, UserRole};
