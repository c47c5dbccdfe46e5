//! Groups and their visibility modes.

use serde::{Deserialize, Serialize};

use crate::{Timestamp, UserSummary};

/// `secret` groups are hidden from listings and cannot be joined directly.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    #[default]
    Public,
    Private,
    Secret,
}

impl GroupType {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupType::Public => "public",
            GroupType::Private => "private",
            GroupType::Secret => "secret",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub cover_photo: Option<String>,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    pub allow_member_posts: bool,
    pub allow_member_events: bool,
    pub admin_ids: Vec<String>,
    pub member_ids: Vec<String>,
    pub creator_id: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Group {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == user_id)
    }

    pub fn is_group_admin(&self, user_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == user_id)
    }
}

fn yes() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GroupCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cover_photo: Option<String>,
    #[serde(rename = "type", default)]
    pub group_type: GroupType,
    #[serde(default = "yes")]
    pub allow_member_posts: bool,
    #[serde(default = "yes")]
    pub allow_member_events: bool,
    #[serde(default)]
    pub admin_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GroupUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cover_photo: Option<String>,
    #[serde(rename = "type", default)]
    pub group_type: Option<GroupType>,
    #[serde(default)]
    pub allow_member_posts: Option<bool>,
    #[serde(default)]
    pub allow_member_events: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub admin_details: Vec<UserSummary>,
    pub member_details: Vec<UserSummary>,
    pub member_count: usize,
    pub event_count: u64,
}
