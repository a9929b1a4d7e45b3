use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::GardenUsersError,
    model::{Member, NewProfile, Profile, ProfilePatch},
};

/// Public API of the garden_users module
#[async_trait]
pub trait GardenUsersApi: Send + Sync {
    /// Register a member and return the committed record
    async fn register_user(
        &self,
        name: String,
        role: Option<String>,
    ) -> Result<Member, GardenUsersError>;

    /// Get a member by ID
    async fn get_member(&self, id: i64) -> Result<Member, GardenUsersError>;

    /// List members ordered by id; `limit` falls back to the configured default
    async fn list_members(
        &self,
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Vec<Member>, GardenUsersError>;

    /// Create a profile
    async fn create_profile(&self, new_profile: NewProfile) -> Result<Profile, GardenUsersError>;

    /// Create the profile under `new_profile.id`, or refresh it when it exists
    async fn sync_profile(&self, new_profile: NewProfile) -> Result<Profile, GardenUsersError>;

    /// Get a profile by ID
    async fn get_profile(&self, id: Uuid) -> Result<Profile, GardenUsersError>;

    /// Update a profile with partial data
    async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, GardenUsersError>;
}
