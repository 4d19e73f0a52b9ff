//! Chat event types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::penalties::ReasonCategory;
use crate::utils::money::format_amount;

/// Events emitted by core services after successful penalty mutations.
///
/// Each event renders to the plain-text system message the group chat posts.
/// Delivery belongs to the runtime adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    PenaltyAccepted {
        group_id: String,
        penalty_id: String,
        username: String,
        amount: Decimal,
        currency_symbol: String,
    },

    PenaltyDisputed {
        group_id: String,
        penalty_id: String,
        username: String,
        reason: ReasonCategory,
        message: String,
    },

    /// The 24-hour window elapsed without a response.
    PenaltyAutoAccepted {
        group_id: String,
        penalty_id: String,
        username: String,
        amount: Decimal,
        currency_symbol: String,
    },

    DisputeWaived {
        group_id: String,
        penalty_id: String,
        admin_username: String,
        username: String,
    },

    /// Pending penalties removed because a sick day now covers them.
    PenaltiesExempted {
        group_id: String,
        username: String,
        dates: Vec<NaiveDate>,
    },

    DailyRecap {
        group_id: String,
        date: NaiveDate,
        summary: String,
    },
}

impl ChatEvent {
    pub fn group_id(&self) -> &str {
        match self {
            ChatEvent::PenaltyAccepted { group_id, .. }
            | ChatEvent::PenaltyDisputed { group_id, .. }
            | ChatEvent::PenaltyAutoAccepted { group_id, .. }
            | ChatEvent::DisputeWaived { group_id, .. }
            | ChatEvent::PenaltiesExempted { group_id, .. }
            | ChatEvent::DailyRecap { group_id, .. } => group_id,
        }
    }

    /// The system message posted to the group chat.
    pub fn message(&self) -> String {
        match self {
            ChatEvent::PenaltyAccepted {
                username,
                amount,
                currency_symbol,
                ..
            } => format!(
                "{} accepted penalty: {} added to pot",
                username,
                format_amount(currency_symbol, *amount)
            ),
            ChatEvent::PenaltyDisputed {
                username,
                reason,
                message,
                ..
            } => format!(
                "{} disputed penalty ({}): \"{}\"",
                username,
                reason.label(),
                message
            ),
            ChatEvent::PenaltyAutoAccepted {
                username,
                amount,
                currency_symbol,
                ..
            } => format!(
                "⏰ {} didn't respond in time - penalty auto-accepted: {} added to pot",
                username,
                format_amount(currency_symbol, *amount)
            ),
            ChatEvent::DisputeWaived {
                admin_username,
                username,
                ..
            } => format!(
                "✅ {} approved {}'s dispute - penalty waived",
                admin_username, username
            ),
            ChatEvent::PenaltiesExempted {
                username, dates, ..
            } => {
                let days = dates
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("🤒 {}'s penalties for {} were cleared (sick day)", username, days)
            }
            ChatEvent::DailyRecap { summary, .. } => summary.clone(),
        }
    }
}
