use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use uuid::Uuid;

use commitment_core::errors::DatabaseError;
use commitment_core::groups::{Group, GroupRepositoryTrait, Member, NewGroup, NewMember};
use commitment_core::Result;

use super::model::{encode_rest_days, GroupDB, ProfileDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{challenge_groups, profiles};
use crate::utils::format_timestamp;

pub struct GroupRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl GroupRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        GroupRepository { pool, writer }
    }
}

#[async_trait]
impl GroupRepositoryTrait for GroupRepository {
    fn list_groups(&self) -> Result<Vec<Group>> {
        let mut conn = get_connection(&self.pool)?;
        challenge_groups::table
            .order(challenge_groups::created_at.asc())
            .select(GroupDB::as_select())
            .load::<GroupDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Group::try_from)
            .collect()
    }

    fn get_group(&self, group_id: &str) -> Result<Group> {
        let mut conn = get_connection(&self.pool)?;
        challenge_groups::table
            .find(group_id)
            .select(GroupDB::as_select())
            .first::<GroupDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| DatabaseError::NotFound(format!("group {}", group_id)))?
            .try_into()
    }

    fn list_members(&self, group_id: &str) -> Result<Vec<Member>> {
        let mut conn = get_connection(&self.pool)?;
        profiles::table
            .filter(profiles::group_id.eq(group_id))
            .order(profiles::joined_at.asc())
            .select(ProfileDB::as_select())
            .load::<ProfileDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Member::try_from)
            .collect()
    }

    fn get_member(&self, user_id: &str) -> Result<Member> {
        let mut conn = get_connection(&self.pool)?;
        profiles::table
            .find(user_id)
            .select(ProfileDB::as_select())
            .first::<ProfileDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| DatabaseError::NotFound(format!("member {}", user_id)))?
            .try_into()
    }

    async fn insert_group(&self, new_group: NewGroup) -> Result<Group> {
        let group_db = GroupDB {
            id: new_group
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new_group.name,
            target_points: new_group.target_points,
            penalty_rate: new_group.penalty_rate.to_string(),
            currency_symbol: new_group.currency_symbol.unwrap_or_default(),
            timezone: new_group.timezone.unwrap_or_default(),
            created_at: format_timestamp(Utc::now()),
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Group> {
                let inserted = diesel::insert_into(challenge_groups::table)
                    .values(&group_db)
                    .returning(GroupDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Group::try_from(inserted)
            })
            .await
    }

    async fn insert_member(&self, group_id: &str, new_member: NewMember) -> Result<Member> {
        let profile_db = ProfileDB {
            user_id: new_member
                .user_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            group_id: group_id.to_string(),
            username: new_member.username,
            is_admin: new_member.is_admin,
            rest_days: encode_rest_days(&new_member.rest_days),
            total_penalty_owed: "0".to_string(),
            joined_at: format_timestamp(Utc::now()),
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Member> {
                let inserted = diesel::insert_into(profiles::table)
                    .values(&profile_db)
                    .returning(ProfileDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Member::try_from(inserted)
            })
            .await
    }
}
