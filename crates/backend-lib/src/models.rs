//! Server-side records that carry more than the wire types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use social_common::{generate_id, Role, User, UserCreate};

use crate::storage::bootstrap::collections;
use crate::storage::repo::Entity;
use crate::validation::normalize_email;

/// A stored account: the public [`User`] plus its password hash.
///
/// `Debug` is implemented by hand and redacts the hash.
#[derive(Serialize, Deserialize, Clone)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    pub hashed_password: String,
}

impl Entity for UserRecord {
    const COLLECTION: &'static str = collections::USERS;
}

impl UserRecord {
    pub fn new(payload: &UserCreate, hashed_password: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            user: User {
                id: generate_id("user"),
                email: normalize_email(&payload.email),
                username: payload.username.clone(),
                first_name: payload.first_name.clone(),
                last_name: payload.last_name.clone(),
                profile_picture: payload.profile_picture.clone(),
                role,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            hashed_password,
        }
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("user", &self.user)
            .field("hashed_password", &"<redacted>")
            .finish()
    }
}
