use serde::{Deserialize, Serialize};

pub type ActorId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Requester,
    Volunteer,
    Both,
}

impl Role {
    pub fn can_volunteer(self) -> bool {
        matches!(self, Role::Volunteer | Role::Both)
    }
}

/// What a volunteer is handed once they win a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
    pub contact: ContactInfo,
}
