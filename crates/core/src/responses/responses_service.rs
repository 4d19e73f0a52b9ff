use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;

use super::responses_model::{PenaltyResponse, ResponseOutcome};
use crate::errors::Result;
use crate::events::{ChatEvent, ChatEventSink};
use crate::groups::GroupRepositoryTrait;
use crate::penalties::{
    PenaltyError, PenaltyRepositoryTrait, PenaltyStatus, PendingPenalty, ReasonCategory,
    StatusTransition,
};
use crate::transactions::BalanceServiceTrait;

/// Trait for member responses to their own penalties.
#[async_trait]
pub trait ResponseServiceTrait: Send + Sync {
    async fn respond(
        &self,
        penalty_id: &str,
        user_id: &str,
        response: PenaltyResponse,
        now: DateTime<Utc>,
    ) -> Result<ResponseOutcome>;
}

pub struct ResponseService {
    penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
    group_repository: Arc<dyn GroupRepositoryTrait>,
    balance_service: Arc<dyn BalanceServiceTrait>,
    event_sink: Arc<dyn ChatEventSink>,
}

impl ResponseService {
    pub fn new(
        penalty_repository: Arc<dyn PenaltyRepositoryTrait>,
        group_repository: Arc<dyn GroupRepositoryTrait>,
        balance_service: Arc<dyn BalanceServiceTrait>,
        event_sink: Arc<dyn ChatEventSink>,
    ) -> Self {
        ResponseService {
            penalty_repository,
            group_repository,
            balance_service,
            event_sink,
        }
    }

    fn validate_dispute(
        penalty: &PendingPenalty,
        reason_category: Option<ReasonCategory>,
        reason_message: Option<String>,
        now: DateTime<Utc>,
    ) -> std::result::Result<(ReasonCategory, String), PenaltyError> {
        if penalty.is_past_deadline(now) {
            return Err(PenaltyError::DeadlineExpired {
                penalty_id: penalty.id.clone(),
                deadline: penalty.deadline,
            });
        }
        let category = reason_category.ok_or_else(|| {
            PenaltyError::ValidationFailed("a reason category is required".to_string())
        })?;
        let message = reason_message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                PenaltyError::ValidationFailed("a reason message is required".to_string())
            })?;
        Ok((category, message))
    }
}

#[async_trait]
impl ResponseServiceTrait for ResponseService {
    async fn respond(
        &self,
        penalty_id: &str,
        user_id: &str,
        response: PenaltyResponse,
        now: DateTime<Utc>,
    ) -> Result<ResponseOutcome> {
        let penalty = self.penalty_repository.get_penalty(penalty_id)?;
        if !penalty.is_owned_by(user_id) {
            return Err(PenaltyError::Forbidden {
                penalty_id: penalty.id,
                user_id: user_id.to_string(),
            }
            .into());
        }
        if penalty.status != PenaltyStatus::Pending {
            return Err(PenaltyError::AlreadyResolved {
                penalty_id: penalty.id,
                status: penalty.status,
            }
            .into());
        }

        let member = self.group_repository.get_member(user_id)?;
        let (updated, event) = match response {
            PenaltyResponse::Accept => {
                // Read before the charge commits; nothing after it may fail.
                let currency_symbol = self
                    .group_repository
                    .get_group(&penalty.group_id)?
                    .currency_symbol;
                let updated = self
                    .penalty_repository
                    .transition(StatusTransition::accept(&penalty, now))
                    .await?;
                self.balance_service.invalidate(user_id);
                let event = ChatEvent::PenaltyAccepted {
                    group_id: updated.group_id.clone(),
                    penalty_id: updated.id.clone(),
                    username: member.username,
                    amount: updated.penalty_amount,
                    currency_symbol,
                };
                (updated, event)
            }
            PenaltyResponse::Dispute {
                reason_category,
                reason_message,
            } => {
                let (category, message) =
                    Self::validate_dispute(&penalty, reason_category, reason_message, now)?;
                let updated = self
                    .penalty_repository
                    .transition(StatusTransition::dispute(&penalty, category, message.clone(), now))
                    .await?;
                let event = ChatEvent::PenaltyDisputed {
                    group_id: updated.group_id.clone(),
                    penalty_id: updated.id.clone(),
                    username: member.username,
                    reason: category,
                    message,
                };
                (updated, event)
            }
        };

        info!(
            "{} moved penalty {} to {}",
            user_id, updated.id, updated.status
        );
        let chat_message = event.message();
        self.event_sink.emit(event);
        Ok(ResponseOutcome {
            penalty: updated,
            chat_message,
        })
    }
}
