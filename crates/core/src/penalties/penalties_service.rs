use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::penalties_errors::PenaltyError;
use super::penalties_model::{NewPenalty, PenaltyStatus, PendingPenalty, StatusTransition};
use super::penalties_traits::{PenaltyLedgerTrait, PenaltyRepositoryTrait};
use crate::errors::{Error, Result};
use crate::events::{ChatEvent, ChatEventSink};
use crate::groups::GroupRepositoryTrait;
use crate::transactions::BalanceServiceTrait;

pub struct PenaltyService {
    penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
    group_repository: Arc<dyn GroupRepositoryTrait>,
    balance_service: Arc<dyn BalanceServiceTrait>,
    event_sink: Arc<dyn ChatEventSink>,
}

impl PenaltyService {
    pub fn new(
        penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
        group_repository: Arc<dyn GroupRepositoryTrait>,
        balance_service: Arc<dyn BalanceServiceTrait>,
        event_sink: Arc<dyn ChatEventSink>,
    ) -> Self {
        PenaltyService {
            penalty_repository,
            group_repository,
            balance_service,
            event_sink,
        }
    }

    fn username_for(&self, user_id: &str) -> String {
        self.group_repository
            .get_member(user_id)
            .map(|m| m.username)
            .unwrap_or_else(|_| user_id.to_string())
    }

    fn currency_for(&self, group_id: &str) -> String {
        self.group_repository
            .get_group(group_id)
            .map(|g| g.currency_symbol)
            .unwrap_or_else(|_| crate::constants::DEFAULT_CURRENCY_SYMBOL.to_string())
    }
}

#[async_trait]
impl PenaltyLedgerTrait for PenaltyService {
    fn get_penalty(&self, penalty_id: &str) -> Result<PendingPenalty> {
        self.penalty_repository.get_penalty(penalty_id)
    }

    fn list_group_penalties(
        &self,
        group_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<PendingPenalty>> {
        self.penalty_repository.list_for_group_on_date(group_id, date)
    }

    fn list_disputed(&self, group_id: &str) -> Result<Vec<PendingPenalty>> {
        self.penalty_repository
            .list_for_group_by_status(group_id, PenaltyStatus::Disputed)
    }

    async fn create_penalty(&self, new_penalty: NewPenalty) -> Result<PendingPenalty> {
        if new_penalty.actual_points >= new_penalty.target_points {
            return Err(PenaltyError::InvariantViolation(format!(
                "penalty for {} on {} would be issued with {} of {} points",
                new_penalty.user_id,
                new_penalty.date,
                new_penalty.actual_points,
                new_penalty.target_points
            ))
            .into());
        }
        if new_penalty.penalty_amount < Decimal::ZERO {
            return Err(PenaltyError::InvariantViolation(
                "penalty amount cannot be negative".to_string(),
            )
            .into());
        }
        if self
            .penalty_repository
            .find_penalty(&new_penalty.user_id, new_penalty.date)?
            .is_some()
        {
            return Err(PenaltyError::DuplicateKind {
                user_id: new_penalty.user_id,
                date: new_penalty.date,
            }
            .into());
        }

        let penalty = self.penalty_repository.insert_penalty(new_penalty).await?;
        info!(
            "Issued penalty {} to {} for {} ({}/{} points)",
            penalty.id, penalty.user_id, penalty.date, penalty.actual_points, penalty.target_points
        );
        Ok(penalty)
    }

    async fn mark_auto_accepted(
        &self,
        penalty_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PendingPenalty> {
        let penalty = self.penalty_repository.get_penalty(penalty_id)?;
        if penalty.status != PenaltyStatus::Pending {
            return Err(PenaltyError::AlreadyResolved {
                penalty_id: penalty.id,
                status: penalty.status,
            }
            .into());
        }
        if !penalty.is_past_deadline(now) {
            return Err(PenaltyError::InvariantViolation(format!(
                "penalty {} is answerable until {}",
                penalty.id, penalty.deadline
            ))
            .into());
        }

        let updated = self
            .penalty_repository
            .transition(StatusTransition::auto_accept(&penalty, now))
            .await?;
        self.balance_service.invalidate(&updated.user_id);

        self.event_sink.emit(ChatEvent::PenaltyAutoAccepted {
            group_id: updated.group_id.clone(),
            penalty_id: updated.id.clone(),
            username: self.username_for(&updated.user_id),
            amount: updated.penalty_amount,
            currency_symbol: self.currency_for(&updated.group_id),
        });
        info!("Auto-accepted penalty {} for {}", updated.id, updated.user_id);
        Ok(updated)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let expired = self.penalty_repository.list_expired_pending(now)?;
        let mut accepted = Vec::with_capacity(expired.len());

        for penalty in expired {
            match self.mark_auto_accepted(&penalty.id, now).await {
                Ok(updated) => accepted.push(updated.id),
                Err(Error::Penalty(PenaltyError::AlreadyResolved { status, .. })) => {
                    debug!(
                        "Penalty {} resolved ({}) before the sweep reached it",
                        penalty.id, status
                    );
                }
                Err(e) => warn!("Failed to auto-accept penalty {}: {}", penalty.id, e),
            }
        }
        Ok(accepted)
    }

    async fn waive(
        &self,
        penalty_id: &str,
        admin_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PendingPenalty> {
        let penalty = self.penalty_repository.get_penalty(penalty_id)?;
        let forbidden = || PenaltyError::Forbidden {
            penalty_id: penalty_id.to_string(),
            user_id: admin_id.to_string(),
        };
        let admin = self
            .group_repository
            .get_member(admin_id)
            .map_err(|_| forbidden())?;
        if !admin.is_admin || admin.group_id != penalty.group_id {
            return Err(forbidden().into());
        }
        if penalty.status != PenaltyStatus::Disputed {
            return Err(PenaltyError::InvariantViolation(format!(
                "only disputed penalties can be waived; {} is {}",
                penalty.id, penalty.status
            ))
            .into());
        }

        let updated = self
            .penalty_repository
            .transition(StatusTransition::waive(&penalty, admin_id, now))
            .await?;

        self.event_sink.emit(ChatEvent::DisputeWaived {
            group_id: updated.group_id.clone(),
            penalty_id: updated.id.clone(),
            admin_username: admin.username,
            username: self.username_for(&updated.user_id),
        });
        info!("Penalty {} waived by {}", updated.id, admin_id);
        Ok(updated)
    }

    async fn delete_for_exemption(&self, penalty_ids: Vec<String>) -> Result<Vec<String>> {
        if penalty_ids.is_empty() {
            return Ok(Vec::new());
        }
        let requested: HashSet<String> = penalty_ids.iter().cloned().collect();
        let deleted = self.penalty_repository.delete_pending(penalty_ids).await?;

        let deleted_set: HashSet<&String> = deleted.iter().collect();
        for skipped in requested.iter().filter(|id| !deleted_set.contains(id)) {
            warn!(
                "Penalty {} is no longer pending; keeping it and any charge it produced",
                skipped
            );
        }
        Ok(deleted)
    }
}
