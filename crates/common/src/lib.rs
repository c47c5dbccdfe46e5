// ================
// crates/common/src/lib.rs
// ================
//! Domain types shared between the social-network backend and its clients.
//!
//! Every persisted entity carries a string identifier of the form
//! `<prefix>_<uuid>`, UTC `created_at`/`updated_at` timestamps and, when it
//! can be removed, an `is_active` flag (removal is a soft delete).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod album;
pub mod discussion;
pub mod event;
pub mod group;
pub mod poll;
pub mod shopping;
pub mod ticket;
pub mod user;

pub use album::{Album, AlbumCreate, Comment, CommentCreate, Photo, PhotoCreate};
pub use discussion::{
    Discussion, DiscussionCreate, DiscussionDetail, DiscussionType, Message, MessageCreate,
};
pub use event::{Event, EventConfig, EventCreate, EventDetail, EventPrivacy, EventUpdate};
pub use group::{Group, GroupCreate, GroupDetail, GroupType, GroupUpdate};
pub use poll::{Poll, PollCreate, Question, QuestionCreate, Vote, VoteCreate, VoteResponse};
pub use shopping::{ShoppingItem, ShoppingItemCreate, ShoppingItemUpdate, ShoppingList};
pub use ticket::{BuyerInfo, Ticket, TicketPurchase, TicketType, TicketTypeCreate};
pub use user::{
    LoginRequest, Role, TokenResponse, User, UserCreate, UserSummary, UserUpdate,
};

/// Timestamp type used on every entity.
pub type Timestamp = DateTime<Utc>;

/// Build a new entity identifier, e.g. `event_3f2c...`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: u64 = 10;
/// Hard cap on the page size a client may request.
pub const MAX_LIMIT: u64 = 100;

/// `skip`/`limit` query parameters shared by list endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Limit clamped into `1..=MAX_LIMIT`.
    pub fn clamped_limit(&self) -> u64 {
        self.limit.clamp(1, MAX_LIMIT)
    }
}
