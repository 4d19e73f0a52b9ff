use crate::errors::Result;
use crate::groups::groups_model::{Group, Member, NewGroup, NewMember};
use async_trait::async_trait;

/// Trait for group repository operations
#[async_trait]
pub trait GroupRepositoryTrait: Send + Sync {
    fn list_groups(&self) -> Result<Vec<Group>>;
    fn get_group(&self, group_id: &str) -> Result<Group>;
    fn list_members(&self, group_id: &str) -> Result<Vec<Member>>;
    fn get_member(&self, user_id: &str) -> Result<Member>;
    async fn insert_group(&self, new_group: NewGroup) -> Result<Group>;
    async fn insert_member(&self, group_id: &str, new_member: NewMember) -> Result<Member>;
}

/// Trait for group service operations
#[async_trait]
pub trait GroupServiceTrait: Send + Sync {
    fn list_groups(&self) -> Result<Vec<Group>>;
    fn get_group(&self, group_id: &str) -> Result<Group>;
    fn list_members(&self, group_id: &str) -> Result<Vec<Member>>;
    fn get_member(&self, user_id: &str) -> Result<Member>;
    async fn create_group(&self, new_group: NewGroup) -> Result<Group>;
    async fn add_member(&self, group_id: &str, new_member: NewMember) -> Result<Member>;
}
