use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};

use super::evaluation_model::{
    evaluate_target, DailyRunReport, DailyTarget, EvaluationSummary, MemberEvaluation, Verdict,
};
use super::evaluation_traits::EvaluationServiceTrait;
use crate::errors::{Error, Result};
use crate::exemptions::ExemptionServiceTrait;
use crate::groups::{Group, GroupRepositoryTrait, Member};
use crate::penalties::{NewPenalty, PenaltyError, PenaltyLedgerTrait, PenaltyRepositoryTrait};
use crate::utils::time_utils::{local_date_from_utc, parse_timezone, previous_local_day};
use crate::workouts::WorkoutRepositoryTrait;

/// Runs the target rule for members and issues penalties for missed days.
pub struct EvaluationService {
    group_repository: Arc<dyn GroupRepositoryTrait>,
    workout_repository: Arc<dyn WorkoutRepositoryTrait>,
    penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
    exemption_service: Arc<dyn ExemptionServiceTrait>,
    penalty_ledger: Arc<dyn PenaltyLedgerTrait>,
}

impl EvaluationService {
    pub fn new(
        group_repository: Arc<dyn GroupRepositoryTrait>,
        workout_repository: Arc<dyn WorkoutRepositoryTrait>,
        penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
        exemption_service: Arc<dyn ExemptionServiceTrait>,
        penalty_ledger: Arc<dyn PenaltyLedgerTrait>,
    ) -> Self {
        EvaluationService {
            group_repository,
            workout_repository,
            penalty_repository,
            exemption_service,
            penalty_ledger,
        }
    }

    async fn evaluate(
        &self,
        member: &Member,
        group: &Group,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<MemberEvaluation> {
        let actual_points = self
            .workout_repository
            .total_points_for_day(&member.user_id, date)?;
        let exemption = self.exemption_service.exemption_for(member, date)?;
        let existing = self.penalty_repository.find_penalty(&member.user_id, date)?;

        let verdict = evaluate_target(DailyTarget {
            target_points: group.target_points,
            actual_points,
            existing_penalty_id: existing.as_ref().map(|p| p.id.as_str()),
            exemption,
        });

        let mut evaluation = MemberEvaluation {
            user_id: member.user_id.clone(),
            date,
            actual_points,
            verdict,
            penalty: None,
        };
        if evaluation.verdict != Verdict::Missed {
            return Ok(evaluation);
        }

        let new_penalty = NewPenalty::new(
            member.user_id.as_str(),
            group.id.as_str(),
            date,
            group.target_points,
            actual_points,
            group.penalty_rate,
            now,
        );
        match self.penalty_ledger.create_penalty(new_penalty).await {
            Ok(penalty) => evaluation.penalty = Some(penalty),
            Err(Error::Penalty(PenaltyError::DuplicateKind { .. })) => {
                // A concurrent run inserted the row first.
                let existing = self
                    .penalty_repository
                    .find_penalty(&member.user_id, date)?
                    .ok_or_else(|| {
                        PenaltyError::NotFound(format!("{} on {}", member.user_id, date))
                    })?;
                evaluation.verdict = Verdict::AlreadyEvaluated(existing.id);
            }
            Err(e) => return Err(e),
        }
        Ok(evaluation)
    }

    fn joined_after(member: &Member, group: &Group, date: NaiveDate) -> bool {
        let tz = parse_timezone(&group.timezone).unwrap_or(chrono_tz::UTC);
        local_date_from_utc(member.joined_at, tz) > date
    }
}

#[async_trait]
impl EvaluationServiceTrait for EvaluationService {
    async fn evaluate_member(
        &self,
        user_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<MemberEvaluation> {
        let member = self.group_repository.get_member(user_id)?;
        let group = self.group_repository.get_group(&member.group_id)?;
        self.evaluate(&member, &group, date, now).await
    }

    async fn evaluate_group(
        &self,
        group_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<EvaluationSummary> {
        let group = self.group_repository.get_group(group_id)?;
        let members = self.group_repository.list_members(group_id)?;
        let mut summary = EvaluationSummary::new(group_id, date);

        for member in &members {
            if Self::joined_after(member, &group, date) {
                debug!("Skipping {} for {}: joined later", member.user_id, date);
                summary.skipped += 1;
                continue;
            }
            match self.evaluate(member, &group, date, now).await {
                Ok(evaluation) => summary.record(&evaluation),
                Err(e) => {
                    warn!(
                        "Evaluation of {} for {} failed: {}",
                        member.user_id, date, e
                    );
                    summary.failed_user_ids.push(member.user_id.clone());
                }
            }
        }

        info!(
            "Evaluated group {} for {}: {} met, {} exempt, {} already evaluated, {} missed",
            group_id, date, summary.met, summary.exempt, summary.already_evaluated, summary.missed
        );
        Ok(summary)
    }

    async fn run_daily(&self, now: DateTime<Utc>) -> Result<DailyRunReport> {
        let auto_accepted = self.penalty_ledger.sweep_expired(now).await?;
        let mut report = DailyRunReport {
            auto_accepted,
            groups: Vec::new(),
        };

        for group in self.group_repository.list_groups()? {
            let tz = match parse_timezone(&group.timezone) {
                Ok(tz) => tz,
                Err(e) => {
                    warn!("Group {} has an invalid timezone, using UTC: {}", group.id, e);
                    chrono_tz::UTC
                }
            };
            let date = previous_local_day(now, tz);
            match self.evaluate_group(&group.id, date, now).await {
                Ok(summary) => report.groups.push(summary),
                Err(e) => warn!("Daily evaluation of group {} failed: {}", group.id, e),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MockChatEventSink;
    use crate::exemptions::{ExemptionKind, ExemptionService, NewSickDay, SickDayKind};
    use crate::penalties::{PenaltyService, PenaltyStatus};
    use crate::test_support::{ts, InMemoryStore};
    use crate::workouts::WorkoutEntry;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<InMemoryStore>,
        exemptions: Arc<ExemptionService>,
        service: EvaluationService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::with_group());
        let sink = Arc::new(MockChatEventSink::new());
        let ledger = Arc::new(PenaltyService::new(
            store.clone(),
            store.clone(),
            store.balance_service(),
            sink.clone(),
        ));
        let exemptions = Arc::new(ExemptionService::new(
            store.clone(),
            store.clone(),
            ledger.clone(),
            store.clone(),
            sink,
        ));
        let service = EvaluationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            exemptions.clone(),
            ledger,
        );
        Fixture {
            store,
            exemptions,
            service,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn log_points(store: &InMemoryStore, user: &str, day: u32, points: i32) {
        store.add_workout(WorkoutEntry {
            user_id: user.to_string(),
            group_id: "g1".to_string(),
            date: date(day),
            exercise: "run".to_string(),
            points,
            logged_at: ts(2024, 3, day, 18),
        });
    }

    #[tokio::test]
    async fn test_missed_target_creates_pending_penalty() {
        let f = fixture();
        log_points(&f.store, "sam", 1, 30);
        let now = ts(2024, 3, 2, 6);

        let evaluation = f.service.evaluate_member("sam", date(1), now).await.unwrap();
        assert_eq!(evaluation.verdict, Verdict::Missed);
        let penalty = evaluation.penalty.unwrap();
        assert_eq!(penalty.penalty_amount, dec!(10));
        assert_eq!(penalty.target_points, 50);
        assert_eq!(penalty.actual_points, 30);
        assert_eq!(penalty.status, PenaltyStatus::Pending);
        assert_eq!(penalty.deadline, now + chrono::Duration::hours(24));
    }

    #[tokio::test]
    async fn test_evaluation_is_idempotent() {
        let f = fixture();
        let now = ts(2024, 3, 2, 6);
        let first = f.service.evaluate_member("sam", date(1), now).await.unwrap();
        let penalty_id = first.penalty.unwrap().id;

        let second = f.service.evaluate_member("sam", date(1), now).await.unwrap();
        assert_eq!(second.verdict, Verdict::AlreadyEvaluated(penalty_id));
        assert!(second.penalty.is_none());
        assert_eq!(f.store.penalty_count(), 1);
    }

    #[tokio::test]
    async fn test_sick_day_exempts_at_creation() {
        let f = fixture();
        f.exemptions
            .record_sick_day(
                "sam",
                NewSickDay {
                    date: date(1),
                    kind: SickDayKind::Sick,
                    note: None,
                },
            )
            .await
            .unwrap();

        let evaluation = f
            .service
            .evaluate_member("sam", date(1), ts(2024, 3, 2, 6))
            .await
            .unwrap();
        assert_eq!(evaluation.verdict, Verdict::Exempt(ExemptionKind::SickDay));
        assert_eq!(f.store.penalty_count(), 0);
    }

    #[tokio::test]
    async fn test_evaluate_group_tallies_members() {
        let f = fixture();
        log_points(&f.store, "alex", 1, 60);
        log_points(&f.store, "sam", 1, 10);

        let summary = f
            .service
            .evaluate_group("g1", date(1), ts(2024, 3, 2, 6))
            .await
            .unwrap();
        assert_eq!(summary.met, 1);
        assert_eq!(summary.missed, 1);
        assert_eq!(summary.created_penalty_ids.len(), 1);
        assert!(summary.failed_user_ids.is_empty());
    }

    #[tokio::test]
    async fn test_run_daily_evaluates_previous_local_day() {
        let f = fixture();
        log_points(&f.store, "alex", 1, 60);
        log_points(&f.store, "sam", 1, 60);

        let report = f.service.run_daily(ts(2024, 3, 2, 0)).await.unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].date, Some(date(1)));
        assert_eq!(report.groups[0].met, 2);
        assert!(report.auto_accepted.is_empty());
    }
}
