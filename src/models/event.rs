use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::request::HelpRequest;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Submitted,
    Accepted,
    Completed,
    Cancelled,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Submitted => "submitted",
            EventKind::Accepted => "accepted",
            EventKind::Completed => "completed",
            EventKind::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub request: HelpRequest,
    pub emitted_at: DateTime<Utc>,
}

impl AssignmentEvent {
    pub fn new(kind: EventKind, request: HelpRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            request,
            emitted_at: Utc::now(),
        }
    }
}
