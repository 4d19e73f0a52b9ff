use serde::{Deserialize, Serialize};

use crate::penalties::{PendingPenalty, ReasonCategory};

/// A member's answer to one of their pending penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PenaltyResponse {
    Accept,
    Dispute {
        #[serde(default)]
        reason_category: Option<ReasonCategory>,
        #[serde(default)]
        reason_message: Option<String>,
    },
}

impl PenaltyResponse {
    pub fn action(&self) -> &'static str {
        match self {
            PenaltyResponse::Accept => "accept",
            PenaltyResponse::Dispute { .. } => "dispute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOutcome {
    pub penalty: PendingPenalty,
    /// The system message posted to the group chat for this response.
    pub chat_message: String,
}
