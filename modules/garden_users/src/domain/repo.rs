use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{Member, NewMember, NewProfile, Profile, ProfilePatch};

/// Failure of a repository operation.
#[derive(Debug, Error)]
pub enum RepoError {
    /// No session could be obtained; the storage layer never initialised.
    #[error("storage configuration: {0}")]
    Configuration(String),
    /// Another profile already uses this email.
    #[error("email already taken: {email}")]
    DuplicateEmail { email: String },
    /// A profile with this id already exists.
    #[error("profile id already taken: {id}")]
    DuplicateId { id: Uuid },
    /// The engine rejected or failed the unit of work.
    #[error("persistence: {0}")]
    Persistence(String),
}

/// Port for the domain layer: persistence operations the domain needs.
///
/// Every mutating call is one unit of work: it opens its own session and
/// transaction, commits, and releases the session before returning.
#[async_trait]
pub trait GardenRepository: Send + Sync {
    /// Insert a member; storage assigns the id.
    async fn insert_member(&self, new_member: NewMember) -> Result<Member, RepoError>;
    async fn find_member(&self, id: i64) -> Result<Option<Member>, RepoError>;
    /// Members ordered by id.
    async fn list_members(&self, limit: u64, offset: u64) -> Result<Vec<Member>, RepoError>;

    /// Insert a profile under the given id.
    async fn insert_profile(&self, id: Uuid, new_profile: NewProfile)
        -> Result<Profile, RepoError>;
    /// Insert the profile, or overwrite its fields when the id already exists.
    /// `created_at` of an existing row is kept.
    async fn upsert_profile(&self, id: Uuid, new_profile: NewProfile)
        -> Result<Profile, RepoError>;
    /// Apply a patch. `None` when no profile has this id.
    async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Option<Profile>, RepoError>;
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError>;
    /// Check uniqueness by email.
    async fn email_exists(&self, email: &str) -> Result<bool, RepoError>;
}
