//! Database model for the chat outbox.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use commitment_core::events::ChatEvent;

use crate::errors::StorageError;
use crate::utils::format_timestamp;

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone, Serialize)]
#[diesel(table_name = crate::schema::system_messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SystemMessageDB {
    pub id: String,
    pub group_id: String,
    pub event_type: String,
    pub message: String,
    /// The event as JSON, tagged by `type`.
    pub payload: String,
    pub created_at: String,
}

impl SystemMessageDB {
    pub fn from_event(event: &ChatEvent, created_at: DateTime<Utc>) -> Result<Self, StorageError> {
        let payload = serde_json::to_value(event)?;
        let event_type = payload
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self {
            id: Uuid::now_v7().to_string(),
            group_id: event.group_id().to_string(),
            event_type,
            message: event.message(),
            payload: payload.to_string(),
            created_at: format_timestamp(created_at),
        })
    }
}
