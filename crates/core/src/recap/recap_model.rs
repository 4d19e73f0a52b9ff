//! Daily recap models and builders.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::groups::{Group, Member};
use crate::penalties::{PenaltyStatus, PendingPenalty};
use crate::utils::money::format_amount;

/// A member's line in the recap. `penalty_id` is set for every bucket but `completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecapMember {
    pub user_id: String,
    pub username: String,
    pub penalty_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecapCounts {
    pub completed: usize,
    pub pending: usize,
    pub disputed: usize,
    pub accepted: usize,
    pub auto_accepted: usize,
    pub waived: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecap {
    pub group_id: String,
    pub group_name: String,
    pub date: NaiveDate,
    pub completed: Vec<RecapMember>,
    pub pending: Vec<RecapMember>,
    pub disputed: Vec<RecapMember>,
    pub accepted: Vec<RecapMember>,
    pub auto_accepted: Vec<RecapMember>,
    pub waived: Vec<RecapMember>,
    pub counts: RecapCounts,
    /// Consecutive days, ending on `date`, without a charged or open penalty.
    pub streak_days: u32,
    pub pot: Decimal,
    pub currency_symbol: String,
}

impl DailyRecap {
    /// Plain-text summary posted to the group chat.
    pub fn message(&self) -> String {
        let names = |members: &[RecapMember]| {
            members
                .iter()
                .map(|m| m.username.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut lines = vec![format!("📊 Daily recap for {}", self.date)];
        lines.push(format!("✅ Completed: {}", self.counts.completed));
        if !self.pending.is_empty() {
            lines.push(format!(
                "⏳ Awaiting response: {} ({})",
                self.counts.pending,
                names(&self.pending)
            ));
        }
        if !self.disputed.is_empty() {
            lines.push(format!(
                "⚖️ Disputed: {} ({})",
                self.counts.disputed,
                names(&self.disputed)
            ));
        }
        let charged = self.counts.accepted + self.counts.auto_accepted;
        if charged > 0 {
            lines.push(format!("💸 Penalties accepted: {}", charged));
        }
        if self.counts.waived > 0 {
            lines.push(format!("🙏 Waived: {}", self.counts.waived));
        }
        lines.push(format!(
            "🔥 Streak: {} day{}",
            self.streak_days,
            if self.streak_days == 1 { "" } else { "s" }
        ));
        lines.push(format!("💰 Pot: {}", format_amount(&self.currency_symbol, self.pot)));
        lines.join("\n")
    }
}

/// Partitions `members` by their penalty row for `date`. No row means completed.
pub fn build_daily_recap(
    group: &Group,
    members: &[Member],
    penalties: &[PendingPenalty],
    date: NaiveDate,
    streak_days: u32,
    pot: Decimal,
) -> DailyRecap {
    let by_user: HashMap<&str, &PendingPenalty> = penalties
        .iter()
        .filter(|p| p.date == date)
        .map(|p| (p.user_id.as_str(), p))
        .collect();

    let mut recap = DailyRecap {
        group_id: group.id.clone(),
        group_name: group.name.clone(),
        date,
        completed: Vec::new(),
        pending: Vec::new(),
        disputed: Vec::new(),
        accepted: Vec::new(),
        auto_accepted: Vec::new(),
        waived: Vec::new(),
        counts: RecapCounts::default(),
        streak_days,
        pot,
        currency_symbol: group.currency_symbol.clone(),
    };

    for member in members {
        let penalty = by_user.get(member.user_id.as_str());
        let line = RecapMember {
            user_id: member.user_id.clone(),
            username: member.username.clone(),
            penalty_id: penalty.map(|p| p.id.clone()),
        };
        let bucket = match penalty.map(|p| p.status) {
            None => &mut recap.completed,
            Some(PenaltyStatus::Pending) => &mut recap.pending,
            Some(PenaltyStatus::Disputed) => &mut recap.disputed,
            Some(PenaltyStatus::Accepted) => &mut recap.accepted,
            Some(PenaltyStatus::AutoAccepted) => &mut recap.auto_accepted,
            Some(PenaltyStatus::Waived) => &mut recap.waived,
        };
        bucket.push(line);
    }

    recap.counts = RecapCounts {
        completed: recap.completed.len(),
        pending: recap.pending.len(),
        disputed: recap.disputed.len(),
        accepted: recap.accepted.len(),
        auto_accepted: recap.auto_accepted.len(),
        waived: recap.waived.len(),
    };
    recap
}

/// Counts days backwards from `end` (inclusive) that have no penalty row,
/// stopping at the first penalized day or once `earliest` is passed.
pub fn consecutive_clean_days(
    penalized: &HashSet<NaiveDate>,
    end: NaiveDate,
    earliest: NaiveDate,
) -> u32 {
    let mut streak = 0;
    let mut day = end;
    while day >= earliest && !penalized.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}
