//! Calendar exception models and the exemption rule.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};
use crate::penalties::{PenaltyStatus, PendingPenalty};

/// Dated calendar exceptions a member records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SickDayKind {
    #[default]
    Sick,
    Recovery,
}

impl SickDayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SickDayKind::Sick => "sick",
            SickDayKind::Recovery => "recovery",
        }
    }
}

impl fmt::Display for SickDayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SickDayKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sick" => Ok(SickDayKind::Sick),
            "recovery" => Ok(SickDayKind::Recovery),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown sick day kind '{}'",
                other
            ))
            .into()),
        }
    }
}

/// Why a day is not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionKind {
    RestDay,
    SickDay,
    RecoveryDay,
}

impl From<SickDayKind> for ExemptionKind {
    fn from(kind: SickDayKind) -> Self {
        match kind {
            SickDayKind::Sick => ExemptionKind::SickDay,
            SickDayKind::Recovery => ExemptionKind::RecoveryDay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SickDay {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub kind: SickDayKind,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSickDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub kind: SickDayKind,
    pub note: Option<String>,
}

/// Ids of the pending penalties that a recorded sick or recovery day now covers.
///
/// Only rows still in `pending` are candidates; resolved penalties keep
/// their outcome.
pub fn resolve_exemptions(pending: &[PendingPenalty], sick_days: &[SickDay]) -> Vec<String> {
    let covered: HashSet<(&str, NaiveDate)> = sick_days
        .iter()
        .map(|day| (day.user_id.as_str(), day.date))
        .collect();

    pending
        .iter()
        .filter(|p| p.status == PenaltyStatus::Pending)
        .filter(|p| covered.contains(&(p.user_id.as_str(), p.date)))
        .map(|p| p.id.clone())
        .collect()
}
