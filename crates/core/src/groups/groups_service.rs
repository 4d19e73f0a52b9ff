use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use rust_decimal::Decimal;

use super::groups_model::{Group, Member, NewGroup, NewMember};
use super::groups_traits::{GroupRepositoryTrait, GroupServiceTrait};
use crate::constants::{DEFAULT_CURRENCY_SYMBOL, DEFAULT_GROUP_TIMEZONE};
use crate::errors::{Error, Result, ValidationError};
use crate::utils::time_utils::parse_timezone;

pub struct GroupService {
    group_repository: Arc<dyn GroupRepositoryTrait>,
}

impl GroupService {
    pub fn new(group_repository: Arc<dyn GroupRepositoryTrait>) -> Self {
        GroupService { group_repository }
    }

    fn normalize_new_group(mut new_group: NewGroup) -> Result<NewGroup> {
        new_group.name = new_group.name.trim().to_string();
        if new_group.name.is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        if new_group.target_points < 0 {
            return Err(Error::InvalidConfigValue(
                "target points cannot be negative".to_string(),
            ));
        }
        if new_group.penalty_rate < Decimal::ZERO {
            return Err(Error::InvalidConfigValue(
                "penalty rate cannot be negative".to_string(),
            ));
        }

        let timezone = new_group
            .timezone
            .take()
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GROUP_TIMEZONE.to_string());
        parse_timezone(&timezone)?;
        new_group.timezone = Some(timezone);

        if new_group
            .currency_symbol
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
        {
            new_group.currency_symbol = Some(DEFAULT_CURRENCY_SYMBOL.to_string());
        }
        Ok(new_group)
    }
}

#[async_trait]
impl GroupServiceTrait for GroupService {
    fn list_groups(&self) -> Result<Vec<Group>> {
        self.group_repository.list_groups()
    }

    fn get_group(&self, group_id: &str) -> Result<Group> {
        self.group_repository.get_group(group_id)
    }

    fn list_members(&self, group_id: &str) -> Result<Vec<Member>> {
        self.group_repository.list_members(group_id)
    }

    fn get_member(&self, user_id: &str) -> Result<Member> {
        self.group_repository.get_member(user_id)
    }

    async fn create_group(&self, new_group: NewGroup) -> Result<Group> {
        let new_group = Self::normalize_new_group(new_group)?;
        let group = self.group_repository.insert_group(new_group).await?;
        info!(
            "Created group '{}' (target {} points, rate {})",
            group.name, group.target_points, group.penalty_rate
        );
        Ok(group)
    }

    async fn add_member(&self, group_id: &str, mut new_member: NewMember) -> Result<Member> {
        new_member.username = new_member.username.trim().to_string();
        if new_member.username.is_empty() {
            return Err(ValidationError::MissingField("username".to_string()).into());
        }
        // Fails early with NotFound when the group does not exist.
        self.group_repository.get_group(group_id)?;
        let mut rest_days = Vec::with_capacity(new_member.rest_days.len());
        for day in new_member.rest_days.drain(..) {
            if !rest_days.contains(&day) {
                rest_days.push(day);
            }
        }
        new_member.rest_days = rest_days;
        self.group_repository.insert_member(group_id, new_member).await
    }
}
