use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered garden member (`users` table). The id is assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for registering a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub role: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>, role: Option<String>) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// A member profile (`profiles` table) keyed by UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a profile. A v4 id is generated when `id` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewProfile {
    pub id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// Partial update data for a profile
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.avatar_url.is_none()
    }
}
