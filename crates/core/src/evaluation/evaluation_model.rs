//! Evaluation verdicts and the pure target rule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::exemptions::ExemptionKind;
use crate::penalties::PendingPenalty;

/// Outcome of evaluating one member for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    Met,
    Exempt(ExemptionKind),
    /// A penalty row already exists for the day; carries its id.
    AlreadyEvaluated(String),
    Missed,
}

/// Inputs to the target rule for one (member, date).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTarget<'a> {
    pub target_points: i32,
    pub actual_points: i32,
    pub existing_penalty_id: Option<&'a str>,
    pub exemption: Option<ExemptionKind>,
}

/// The target rule. Precedence: met, exempt, already evaluated, missed.
///
/// A target of zero or less is always met.
pub fn evaluate_target(input: DailyTarget<'_>) -> Verdict {
    if input.target_points <= 0 || input.actual_points >= input.target_points {
        return Verdict::Met;
    }
    if let Some(kind) = input.exemption {
        return Verdict::Exempt(kind);
    }
    if let Some(id) = input.existing_penalty_id {
        return Verdict::AlreadyEvaluated(id.to_string());
    }
    Verdict::Missed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEvaluation {
    pub user_id: String,
    pub date: NaiveDate,
    pub actual_points: i32,
    pub verdict: Verdict,
    /// Set when this evaluation issued a new penalty.
    pub penalty: Option<PendingPenalty>,
}

/// Per-group tally of one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub group_id: String,
    pub date: Option<NaiveDate>,
    pub met: usize,
    pub exempt: usize,
    pub already_evaluated: usize,
    pub missed: usize,
    /// Members who joined after the evaluated day.
    pub skipped: usize,
    pub created_penalty_ids: Vec<String>,
    /// Members whose evaluation failed; safe to re-run.
    pub failed_user_ids: Vec<String>,
}

impl EvaluationSummary {
    pub fn new(group_id: &str, date: NaiveDate) -> Self {
        EvaluationSummary {
            group_id: group_id.to_string(),
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn record(&mut self, evaluation: &MemberEvaluation) {
        match &evaluation.verdict {
            Verdict::Met => self.met += 1,
            Verdict::Exempt(_) => self.exempt += 1,
            Verdict::AlreadyEvaluated(_) => self.already_evaluated += 1,
            Verdict::Missed => {
                self.missed += 1;
                if let Some(penalty) = &evaluation.penalty {
                    self.created_penalty_ids.push(penalty.id.clone());
                }
            }
        }
    }
}

/// Result of the scheduled daily run across all groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRunReport {
    pub auto_accepted: Vec<String>,
    pub groups: Vec<EvaluationSummary>,
}
