//! Discussion threads attached to a group or an event, and their messages.

use serde::{Deserialize, Serialize};

use crate::{Timestamp, UserSummary};

/// What a discussion is linked to; `linked_id` names the group or event.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscussionType {
    Group,
    Event,
}

impl DiscussionType {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscussionType::Group => "group",
            DiscussionType::Event => "event",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Discussion {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub discussion_type: DiscussionType,
    pub linked_id: String,
    pub creator_id: String,
    pub is_pinned: bool,
    pub message_count: u64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DiscussionCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discussion_type: DiscussionType,
    pub linked_id: String,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub discussion_id: String,
    pub parent_message_id: Option<String>,
    pub content: String,
    pub author_id: String,
    pub is_edited: bool,
    pub reply_count: u64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Message body posted to `/discussions/{id}/messages`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageCreate {
    pub content: String,
    #[serde(default)]
    pub parent_message_id: Option<String>,
}

/// Discussion with its most recent messages, oldest first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiscussionDetail {
    #[serde(flatten)]
    pub discussion: Discussion,
    pub last_messages: Vec<Message>,
    pub author_details: Option<UserSummary>,
}
