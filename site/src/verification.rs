//! Door-side ticket verification.
//!
//! Verification only classifies a ticket; it never changes its status.

use crate::types::{Event, Ticket, TicketStatus};
use serde::Serialize;

/// Result of looking a ticket id up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// No ticket has this id
    InvalidId,
    /// The ticket was already scanned
    AlreadyUsed(Ticket),
    /// The ticket was voided
    Cancelled(Ticket),
    /// The ticket admits its holder
    Valid(Ticket),
}

impl VerificationOutcome {
    /// Whether the holder may enter
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Message shown to the door staff
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidId => "Invalid Ticket ID. Please check and try again.",
            Self::AlreadyUsed(_) => "Ticket has already been used!",
            Self::Cancelled(_) => "Ticket is cancelled!",
            Self::Valid(_) => "Ticket is valid! Verification successful.",
        }
    }

    /// The ticket that was found, if any
    #[must_use]
    pub const fn ticket(&self) -> Option<&Ticket> {
        match self {
            Self::InvalidId => None,
            Self::AlreadyUsed(t) | Self::Cancelled(t) | Self::Valid(t) => Some(t),
        }
    }
}

/// Classify the ticket with id `id` (surrounding whitespace ignored)
#[must_use]
pub fn verify_ticket(tickets: &[Ticket], id: &str) -> VerificationOutcome {
    let id = id.trim();
    let Some(ticket) = tickets.iter().find(|t| t.id.as_str() == id) else {
        tracing::debug!(ticket_id = id, "Verification: unknown ticket");
        return VerificationOutcome::InvalidId;
    };

    let outcome = match ticket.status {
        TicketStatus::Used => VerificationOutcome::AlreadyUsed(ticket.clone()),
        TicketStatus::Cancelled => VerificationOutcome::Cancelled(ticket.clone()),
        TicketStatus::Valid => VerificationOutcome::Valid(ticket.clone()),
    };
    tracing::debug!(ticket_id = id, status = %ticket.status, "Verification");
    outcome
}

/// Verification result as presented to the door staff
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Whether the holder may enter
    pub success: bool,
    /// Message
    pub message: &'static str,
    /// Ticket id, when found
    pub ticket_id: Option<String>,
    /// Ticket status, when found
    pub status: Option<TicketStatus>,
    /// Title of the ticket's event, when found
    pub event_title: Option<String>,
}

impl VerificationReport {
    /// Build the report, naming the event or `Unknown Event`
    #[must_use]
    pub fn new(outcome: &VerificationOutcome, events: &[Event]) -> Self {
        let ticket = outcome.ticket();
        Self {
            success: outcome.is_success(),
            message: outcome.message(),
            ticket_id: ticket.map(|t| t.id.to_string()),
            status: ticket.map(|t| t.status),
            event_title: ticket.map(|t| {
                events
                    .iter()
                    .find(|e| e.id == t.event_id)
                    .map_or_else(|| "Unknown Event".to_string(), |e| e.title.clone())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::seed_events;
    use chrono::DateTime;

    fn ticket(id: &str, event: &str, status: TicketStatus) -> Ticket {
        Ticket {
            id: id.into(),
            event_id: event.into(),
            user_id: "user1".into(),
            purchase_date: DateTime::default(),
            status,
            qr_code: format!("OKL-{event}-user1-0"),
        }
    }

    fn tickets() -> Vec<Ticket> {
        vec![
            ticket("TKT-AAAAAAAAA", "e1", TicketStatus::Valid),
            ticket("TKT-BBBBBBBBB", "e2", TicketStatus::Used),
            ticket("TKT-CCCCCCCCC", "e3", TicketStatus::Cancelled),
            ticket("TKT-DDDDDDDDD", "gone", TicketStatus::Valid),
        ]
    }

    #[test]
    fn unknown_id_is_invalid() {
        assert_eq!(verify_ticket(&tickets(), "TKT-ZZZZZZZZZ"), VerificationOutcome::InvalidId);
        assert_eq!(verify_ticket(&[], "TKT-AAAAAAAAA"), VerificationOutcome::InvalidId);
        assert_eq!(verify_ticket(&tickets(), ""), VerificationOutcome::InvalidId);
    }

    #[test]
    fn surrounding_whitespace_is_ignored_but_case_is_not() {
        assert!(verify_ticket(&tickets(), "  TKT-AAAAAAAAA\n").is_success());
        assert_eq!(verify_ticket(&tickets(), "tkt-aaaaaaaaa"), VerificationOutcome::InvalidId);
    }

    #[test]
    fn success_iff_valid() {
        for t in tickets() {
            let outcome = verify_ticket(&tickets(), t.id.as_str());
            assert_eq!(outcome.is_success(), t.status == TicketStatus::Valid);
            assert_eq!(outcome.ticket(), Some(&t));
        }
    }

    #[test]
    fn messages_match_status() {
        let all = tickets();
        assert_eq!(verify_ticket(&all, "TKT-BBBBBBBBB").message(), "Ticket has already been used!");
        assert_eq!(verify_ticket(&all, "TKT-CCCCCCCCC").message(), "Ticket is cancelled!");
        assert_eq!(
            verify_ticket(&all, "  TKT-AAAAAAAAA \n").message(),
            "Ticket is valid! Verification successful."
        );
    }

    #[test]
    fn verification_is_read_only() {
        let all = tickets();
        let before = all.clone();
        let _ = verify_ticket(&all, "TKT-AAAAAAAAA");
        assert_eq!(all, before);
    }

    #[test]
    fn report_names_event() {
        let events = seed_events();
        let all = tickets();

        let valid = VerificationReport::new(&verify_ticket(&all, "TKT-AAAAAAAAA"), &events);
        assert!(valid.success);
        assert_eq!(valid.event_title.as_deref(), Some("Bangla Noboborsho 1431"));

        let orphan = VerificationReport::new(&verify_ticket(&all, "TKT-DDDDDDDDD"), &events);
        assert_eq!(orphan.event_title.as_deref(), Some("Unknown Event"));

        let missing = VerificationReport::new(&VerificationOutcome::InvalidId, &events);
        assert!(!missing.success);
        assert_eq!(missing.ticket_id, None);
        assert_eq!(missing.message, "Invalid Ticket ID. Please check and try again.");
    }
}
