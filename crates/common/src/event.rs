//! Events and the three-step creation payloads.

use serde::{Deserialize, Serialize};

use crate::{Timestamp, UserSummary};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventPrivacy {
    #[default]
    Public,
    Private,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub location: String,
    pub cover_photo: Option<String>,
    pub privacy: EventPrivacy,
    pub organizers: Vec<String>,
    pub members: Vec<String>,
    pub group_id: Option<String>,
    #[serde(default)]
    pub auto_invite: bool,
    pub creator_id: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    /// Creator, organizers and members all count as participants.
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.creator_id == user_id
            || self.organizers.iter().any(|id| id == user_id)
            || self.members.iter().any(|id| id == user_id)
    }
}

/// Step two: full configuration of an existing event.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub location: String,
    #[serde(default)]
    pub cover_photo: Option<String>,
    #[serde(default)]
    pub privacy: EventPrivacy,
    #[serde(default)]
    pub organizers: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Step one: creation. `auto_invite` pulls in the members of `group_id`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventCreate {
    #[serde(flatten)]
    pub config: EventConfig,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub auto_invite: bool,
}

/// Step three: amend individual fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EventUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<Timestamp>,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cover_photo: Option<String>,
    #[serde(default)]
    pub privacy: Option<EventPrivacy>,
    #[serde(default)]
    pub organizers: Option<Vec<String>>,
    #[serde(default)]
    pub members: Option<Vec<String>>,
}

/// Event with resolved participants.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub organizer_details: Vec<UserSummary>,
    pub member_details: Vec<UserSummary>,
    pub participant_count: usize,
}
