//! Configuration management for the site.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file in the working directory is read first when present.

use crate::checkout::{CheckoutConfig, DEFAULT_PROCESSING_FEE};
use crate::types::Money;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Address that signs in as the admin account
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@oklahomabashi.com";

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "bashi_site=debug,bashi_runtime=info";

/// A variable was set to something unusable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for {var}: {value:?}")]
pub struct ConfigError {
    /// Variable name
    pub var: &'static str,
    /// Offending value
    pub value: String,
}

/// Site configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Checkout settings
    pub checkout: CheckoutSettings,
    /// Chat assistant settings
    pub chat: ChatSettings,
    /// Address that signs in as the admin account
    pub admin_email: String,
    /// Root of the organization's JSON API; the built-in seed data is used when unset
    pub api_base_url: Option<String>,
    /// Log filter (`RUST_LOG` syntax)
    pub log_filter: String,
}

/// Checkout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Simulated gateway delay in milliseconds (default: 2000)
    pub payment_delay_ms: u64,
    /// Gateway timeout in milliseconds (default: 30000)
    pub payment_timeout_ms: u64,
    /// Processing fee in cents (default: 250)
    pub processing_fee_cents: u64,
    /// Refuse purchases for sold-out events (default: false)
    pub enforce_capacity: bool,
}

/// Chat assistant configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Model override
    pub model: Option<String>,
    /// Reply length cap (default: 1024)
    pub max_tokens: u32,
    /// Seconds without reply data before giving up (default: 60)
    pub idle_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            checkout: CheckoutSettings {
                payment_delay_ms: parsed(&lookup, "BASHI_CHECKOUT_DELAY_MS")?.unwrap_or(2000),
                payment_timeout_ms: parsed(&lookup, "BASHI_PAYMENT_TIMEOUT_MS")?.unwrap_or(30_000),
                processing_fee_cents: parsed(&lookup, "BASHI_PROCESSING_FEE_CENTS")?
                    .unwrap_or(DEFAULT_PROCESSING_FEE.cents()),
                enforce_capacity: flag(&lookup, "BASHI_ENFORCE_CAPACITY")?.unwrap_or(false),
            },
            chat: ChatSettings {
                model: text("BASHI_CHAT_MODEL"),
                max_tokens: parsed(&lookup, "BASHI_CHAT_MAX_TOKENS")?.unwrap_or(1024),
                idle_timeout_secs: parsed(&lookup, "BASHI_CHAT_IDLE_TIMEOUT_SECS")?.unwrap_or(60),
            },
            admin_email: text("BASHI_ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            api_base_url: text("BASHI_API_BASE_URL"),
            log_filter: text("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    /// Checkout tuning for the application environment
    #[must_use]
    pub const fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig {
            payment_delay: Duration::from_millis(self.checkout.payment_delay_ms),
            payment_timeout: Duration::from_millis(self.checkout.payment_timeout_ms),
            processing_fee: Money::from_cents(self.checkout.processing_fee_cents),
            enforce_capacity: self.checkout.enforce_capacity,
        }
    }

    /// Chat idle timeout
    #[must_use]
    pub const fn chat_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.chat.idle_timeout_secs)
    }
}

fn parsed<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError { var, value }),
    }
}

fn flag<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError { var, value }),
        },
    }
}
