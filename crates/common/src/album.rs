//! Event photo albums. Photos are recorded by URL only.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Album {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: String,
    pub photo_count: u64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AlbumCreate {
    pub event_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: String,
    pub album_id: String,
    pub event_id: String,
    pub author_id: String,
    pub caption: Option<String>,
    pub image_url: String,
    pub like_count: u64,
    pub comment_count: u64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PhotoCreate {
    pub album_id: String,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub photo_id: String,
    pub author_id: String,
    pub content: String,
    pub is_edited: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommentCreate {
    pub content: String,
}
