//! Groups module - group settings, members, and their service.

mod groups_model;
mod groups_service;
mod groups_traits;

pub use groups_model::{Group, Member, NewGroup, NewMember};
pub use groups_service::GroupService;
pub use groups_traits::{GroupRepositoryTrait, GroupServiceTrait};
