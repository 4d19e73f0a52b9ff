//! In-memory repositories shared by the service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::errors::{DatabaseError, Error, Result};
use crate::exemptions::{ExemptionRepositoryTrait, NewSickDay, SickDay};
use crate::groups::{Group, GroupRepositoryTrait, Member, NewGroup, NewMember};
use crate::penalties::{
    NewPenalty, PenaltyError, PenaltyRepositoryTrait, PenaltyStatus, PendingPenalty,
    StatusTransition,
};
use crate::recap::{RecapPublicationRepositoryTrait, StreakSourceTrait};
use crate::transactions::{
    Balance, BalanceService, NewPaymentTransaction, PaymentTransaction,
    TransactionRepositoryTrait, TransactionType,
};
use crate::workouts::{WorkoutEntry, WorkoutLog, WorkoutRepositoryTrait};

pub fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

#[derive(Default)]
struct State {
    next_id: u64,
    groups: Vec<Group>,
    members: Vec<Member>,
    penalties: Vec<PendingPenalty>,
    transactions: Vec<PaymentTransaction>,
    sick_days: Vec<SickDay>,
    workouts: Vec<WorkoutLog>,
    published_recaps: Vec<(String, NaiveDate)>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn refresh_owed(&mut self, user_id: &str) -> Decimal {
        let transactions: Vec<PaymentTransaction> = self
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        let net = Balance::from_transactions(user_id, &transactions).net_owed;
        if let Some(member) = self.members.iter_mut().find(|m| m.user_id == user_id) {
            member.total_penalty_owed = net;
        }
        net
    }

    fn append(&mut self, new_transaction: NewPaymentTransaction) -> PaymentTransaction {
        let transaction = PaymentTransaction {
            id: self.next_id("t"),
            user_id: new_transaction.user_id,
            group_id: new_transaction.group_id,
            amount: new_transaction.amount,
            transaction_type: new_transaction.transaction_type,
            description: new_transaction.description,
            penalty_id: new_transaction.penalty_id,
            created_at: new_transaction.created_at,
        };
        self.transactions.push(transaction.clone());
        self.refresh_owed(&transaction.user_id);
        transaction
    }

    fn insert_penalty(&mut self, new_penalty: NewPenalty) -> Result<PendingPenalty> {
        if self
            .penalties
            .iter()
            .any(|p| p.user_id == new_penalty.user_id && p.date == new_penalty.date)
        {
            return Err(PenaltyError::DuplicateKind {
                user_id: new_penalty.user_id,
                date: new_penalty.date,
            }
            .into());
        }
        let penalty = PendingPenalty {
            id: self.next_id("p"),
            user_id: new_penalty.user_id,
            group_id: new_penalty.group_id,
            date: new_penalty.date,
            target_points: new_penalty.target_points,
            actual_points: new_penalty.actual_points,
            penalty_amount: new_penalty.penalty_amount,
            status: PenaltyStatus::Pending,
            reason_category: None,
            reason_message: None,
            created_at: new_penalty.created_at,
            responded_at: None,
            deadline: new_penalty.deadline,
            auto_accepted_at: None,
            waived_at: None,
            waived_by: None,
        };
        self.penalties.push(penalty.clone());
        Ok(penalty)
    }
}

/// One store implementing every repository trait, with a compare-and-swap
/// `transition` guarded by a single mutex.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Group `g1` (target 50, rate 10, UTC) with admin `alex` and member `sam`.
    pub fn with_group() -> Self {
        let store = InMemoryStore::default();
        {
            let mut state = store.state.lock().unwrap();
            let start = ts(2024, 1, 1, 0);
            state.groups.push(Group {
                id: "g1".to_string(),
                name: "Morning crew".to_string(),
                target_points: 50,
                penalty_rate: dec!(10),
                currency_symbol: "€".to_string(),
                timezone: "UTC".to_string(),
                created_at: start,
            });
            for (user_id, is_admin) in [("alex", true), ("sam", false)] {
                state.members.push(Member {
                    user_id: user_id.to_string(),
                    group_id: "g1".to_string(),
                    username: user_id.to_string(),
                    is_admin,
                    rest_days: vec![],
                    total_penalty_owed: Decimal::ZERO,
                    joined_at: start,
                });
            }
        }
        store
    }

    pub fn balance_service(&self) -> Arc<BalanceService> {
        Arc::new(BalanceService::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
        ))
    }

    pub fn member(&self, user_id: &str) -> Member {
        self.get_member(user_id).unwrap()
    }

    pub fn penalty(&self, penalty_id: &str) -> PendingPenalty {
        self.get_penalty(penalty_id).unwrap()
    }

    pub fn penalty_count(&self) -> usize {
        self.state.lock().unwrap().penalties.len()
    }

    pub fn seed_penalty(&self, new_penalty: NewPenalty) -> PendingPenalty {
        self.state.lock().unwrap().insert_penalty(new_penalty).unwrap()
    }

    /// Overwrites a status without any of the transition bookkeeping.
    pub fn force_status(&self, penalty_id: &str, status: PenaltyStatus) {
        let mut state = self.state.lock().unwrap();
        let penalty = state
            .penalties
            .iter_mut()
            .find(|p| p.id == penalty_id)
            .unwrap();
        penalty.status = status;
    }

    /// Appends a standalone penalty charge for `user_id`.
    pub fn charge(&self, user_id: &str, amount: Decimal) -> PaymentTransaction {
        let mut state = self.state.lock().unwrap();
        let group_id = state
            .members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.group_id.clone())
            .unwrap_or_default();
        state.append(NewPaymentTransaction {
            user_id: user_id.to_string(),
            group_id,
            amount,
            transaction_type: TransactionType::Penalty,
            description: "charge".to_string(),
            penalty_id: None,
            created_at: Utc::now(),
        })
    }

    pub fn transactions_for(&self, user_id: &str) -> Vec<PaymentTransaction> {
        self.list_for_user(user_id).unwrap()
    }

    pub fn cached_total(&self, user_id: &str) -> Decimal {
        self.member(user_id).total_penalty_owed
    }

    /// Overwrites the cached owed total, simulating drift.
    pub fn set_cached_total(&self, user_id: &str, total: Decimal) {
        let mut state = self.state.lock().unwrap();
        if let Some(member) = state.members.iter_mut().find(|m| m.user_id == user_id) {
            member.total_penalty_owed = total;
        }
    }

    pub fn add_workout(&self, entry: WorkoutEntry) -> WorkoutLog {
        let mut state = self.state.lock().unwrap();
        let log = WorkoutLog {
            id: state.next_id("w"),
            user_id: entry.user_id,
            group_id: entry.group_id,
            date: entry.date,
            exercise: entry.exercise,
            points: entry.points,
            logged_at: entry.logged_at,
        };
        state.workouts.push(log.clone());
        log
    }
}

#[async_trait]
impl GroupRepositoryTrait for InMemoryStore {
    fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.state.lock().unwrap().groups.clone())
    }

    fn get_group(&self, group_id: &str) -> Result<Group> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("group {}", group_id)).into())
    }

    fn list_members(&self, group_id: &str) -> Result<Vec<Member>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    fn get_member(&self, user_id: &str) -> Result<Member> {
        self.state
            .lock()
            .unwrap()
            .members
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("member {}", user_id)).into())
    }

    async fn insert_group(&self, new_group: NewGroup) -> Result<Group> {
        let mut state = self.state.lock().unwrap();
        let group = Group {
            id: new_group.id.unwrap_or_else(|| state.next_id("g")),
            name: new_group.name,
            target_points: new_group.target_points,
            penalty_rate: new_group.penalty_rate,
            currency_symbol: new_group.currency_symbol.unwrap_or_default(),
            timezone: new_group.timezone.unwrap_or_default(),
            created_at: Utc::now(),
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn insert_member(&self, group_id: &str, new_member: NewMember) -> Result<Member> {
        let mut state = self.state.lock().unwrap();
        let member = Member {
            user_id: new_member.user_id.unwrap_or_else(|| state.next_id("u")),
            group_id: group_id.to_string(),
            username: new_member.username,
            is_admin: new_member.is_admin,
            rest_days: new_member.rest_days,
            total_penalty_owed: Decimal::ZERO,
            joined_at: Utc::now(),
        };
        state.members.push(member.clone());
        Ok(member)
    }
}

#[async_trait]
impl PenaltyRepositoryTrait for InMemoryStore {
    fn get_penalty(&self, penalty_id: &str) -> Result<PendingPenalty> {
        self.state
            .lock()
            .unwrap()
            .penalties
            .iter()
            .find(|p| p.id == penalty_id)
            .cloned()
            .ok_or_else(|| PenaltyError::NotFound(penalty_id.to_string()).into())
    }

    fn find_penalty(&self, user_id: &str, date: NaiveDate) -> Result<Option<PendingPenalty>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .penalties
            .iter()
            .find(|p| p.user_id == user_id && p.date == date)
            .cloned())
    }

    fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: PenaltyStatus,
    ) -> Result<Vec<PendingPenalty>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .penalties
            .iter()
            .filter(|p| p.user_id == user_id && p.status == status)
            .cloned()
            .collect())
    }

    fn list_for_group_on_date(
        &self,
        group_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<PendingPenalty>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .penalties
            .iter()
            .filter(|p| p.group_id == group_id && p.date == date)
            .cloned()
            .collect())
    }

    fn list_for_group_by_status(
        &self,
        group_id: &str,
        status: PenaltyStatus,
    ) -> Result<Vec<PendingPenalty>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .penalties
            .iter()
            .filter(|p| p.group_id == group_id && p.status == status)
            .cloned()
            .collect())
    }

    fn list_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<PendingPenalty>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .penalties
            .iter()
            .filter(|p| p.status == PenaltyStatus::Pending && p.deadline < now)
            .cloned()
            .collect())
    }

    async fn insert_penalty(&self, new_penalty: NewPenalty) -> Result<PendingPenalty> {
        self.state.lock().unwrap().insert_penalty(new_penalty)
    }

    async fn transition(&self, transition: StatusTransition) -> Result<PendingPenalty> {
        if !transition.is_allowed() {
            return Err(PenaltyError::InvariantViolation(format!(
                "{} -> {} is not a valid transition",
                transition.from, transition.to
            ))
            .into());
        }
        let mut state = self.state.lock().unwrap();
        if let Some(charge) = &transition.charge {
            if state
                .transactions
                .iter()
                .any(|t| t.penalty_id == charge.penalty_id)
            {
                return Err(Error::ConstraintViolation(format!(
                    "penalty {} already charged",
                    transition.penalty_id
                )));
            }
        }
        let penalty = state
            .penalties
            .iter_mut()
            .find(|p| p.id == transition.penalty_id)
            .ok_or_else(|| PenaltyError::NotFound(transition.penalty_id.clone()))?;
        if penalty.status != transition.from {
            return Err(PenaltyError::AlreadyResolved {
                penalty_id: penalty.id.clone(),
                status: penalty.status,
            }
            .into());
        }

        penalty.status = transition.to;
        match transition.to {
            PenaltyStatus::Accepted => penalty.responded_at = Some(transition.at),
            PenaltyStatus::Disputed => {
                penalty.responded_at = Some(transition.at);
                penalty.reason_category = transition.reason_category;
                penalty.reason_message = transition.reason_message.clone();
            }
            PenaltyStatus::AutoAccepted => penalty.auto_accepted_at = Some(transition.at),
            PenaltyStatus::Waived => {
                penalty.waived_at = Some(transition.at);
                penalty.waived_by = transition.waived_by.clone();
            }
            PenaltyStatus::Pending => {}
        }
        let updated = penalty.clone();

        if let Some(charge) = transition.charge {
            state.append(charge);
        }
        Ok(updated)
    }

    async fn delete_pending(&self, penalty_ids: Vec<String>) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        let deleted: Vec<String> = penalty_ids
            .into_iter()
            .filter(|id| {
                state
                    .penalties
                    .iter()
                    .any(|p| &p.id == id && p.status == PenaltyStatus::Pending)
            })
            .collect();
        state.penalties.retain(|p| !deleted.contains(&p.id));
        Ok(deleted)
    }
}

impl StreakSourceTrait for InMemoryStore {
    fn penalized_dates(
        &self,
        group_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .state
            .lock()
            .unwrap()
            .penalties
            .iter()
            .filter(|p| p.group_id == group_id && p.status != PenaltyStatus::Waived)
            .map(|p| p.date)
            .filter(|d| *d >= from && *d <= to)
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }
}

#[async_trait]
impl RecapPublicationRepositoryTrait for InMemoryStore {
    async fn mark_published(
        &self,
        group_id: &str,
        date: NaiveDate,
        _at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let key = (group_id.to_string(), date);
        if state.published_recaps.contains(&key) {
            return Ok(false);
        }
        state.published_recaps.push(key);
        Ok(true)
    }
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryStore {
    fn get_transaction(&self, transaction_id: &str) -> Result<PaymentTransaction> {
        self.state
            .lock()
            .unwrap()
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("transaction {}", transaction_id)).into())
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<PaymentTransaction>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    fn cached_owed_total(&self, user_id: &str) -> Result<Decimal> {
        Ok(self.get_member(user_id)?.total_penalty_owed)
    }

    async fn append(&self, new_transaction: NewPaymentTransaction) -> Result<PaymentTransaction> {
        Ok(self.state.lock().unwrap().append(new_transaction))
    }

    async fn refresh_owed_total(&self, user_id: &str) -> Result<Decimal> {
        Ok(self.state.lock().unwrap().refresh_owed(user_id))
    }

    async fn delete_manual_correction(&self, transaction_id: &str) -> Result<PaymentTransaction> {
        let mut state = self.state.lock().unwrap();
        let position = state
            .transactions
            .iter()
            .position(|t| t.id == transaction_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("transaction {}", transaction_id)))?;
        if state.transactions[position].penalty_id.is_some() {
            return Err(Error::ConstraintViolation(
                "penalty charges cannot be removed".to_string(),
            ));
        }
        let removed = state.transactions.remove(position);
        state.refresh_owed(&removed.user_id);
        Ok(removed)
    }
}

#[async_trait]
impl ExemptionRepositoryTrait for InMemoryStore {
    fn get_sick_day(&self, user_id: &str, date: NaiveDate) -> Result<Option<SickDay>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sick_days
            .iter()
            .find(|d| d.user_id == user_id && d.date == date)
            .cloned())
    }

    fn list_sick_days(&self, user_id: &str, dates: &[NaiveDate]) -> Result<Vec<SickDay>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sick_days
            .iter()
            .filter(|d| d.user_id == user_id && dates.contains(&d.date))
            .cloned()
            .collect())
    }

    async fn insert_sick_day(
        &self,
        user_id: &str,
        new_sick_day: NewSickDay,
        created_at: DateTime<Utc>,
    ) -> Result<SickDay> {
        let mut state = self.state.lock().unwrap();
        let sick_day = SickDay {
            id: state.next_id("s"),
            user_id: user_id.to_string(),
            date: new_sick_day.date,
            kind: new_sick_day.kind,
            note: new_sick_day.note,
            created_at,
        };
        state.sick_days.push(sick_day.clone());
        Ok(sick_day)
    }

    async fn delete_sick_day(&self, user_id: &str, date: NaiveDate) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let before = state.sick_days.len();
        state
            .sick_days
            .retain(|d| !(d.user_id == user_id && d.date == date));
        Ok(before - state.sick_days.len())
    }
}

#[async_trait]
impl WorkoutRepositoryTrait for InMemoryStore {
    fn total_points_for_day(&self, user_id: &str, date: NaiveDate) -> Result<i32> {
        Ok(self
            .list_for_day(user_id, date)?
            .iter()
            .map(|w| w.points)
            .sum())
    }

    fn list_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<WorkoutLog>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id && w.date == date)
            .cloned()
            .collect())
    }

    async fn insert_workout(&self, entry: WorkoutEntry) -> Result<WorkoutLog> {
        Ok(self.add_workout(entry))
    }
}
