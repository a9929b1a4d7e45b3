use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::GardenUsersApi,
    error::GardenUsersError,
    model::{Member, NewMember, NewProfile, Profile, ProfilePatch},
};
use crate::domain::service::Service;

/// Local implementation of the GardenUsersApi trait that delegates to the domain service
pub struct GardenUsersLocalClient {
    service: Arc<Service>,
}

impl GardenUsersLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl GardenUsersApi for GardenUsersLocalClient {
    async fn register_user(
        &self,
        name: String,
        role: Option<String>,
    ) -> Result<Member, GardenUsersError> {
        self.service
            .register_member(NewMember { name, role })
            .await
            .map_err(Into::into)
    }

    async fn get_member(&self, id: i64) -> Result<Member, GardenUsersError> {
        self.service.get_member(id).await.map_err(Into::into)
    }

    async fn list_members(
        &self,
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Vec<Member>, GardenUsersError> {
        self.service
            .list_members(limit, offset)
            .await
            .map_err(Into::into)
    }

    async fn create_profile(&self, new_profile: NewProfile) -> Result<Profile, GardenUsersError> {
        self.service
            .create_profile(new_profile)
            .await
            .map_err(Into::into)
    }

    async fn sync_profile(&self, new_profile: NewProfile) -> Result<Profile, GardenUsersError> {
        self.service
            .sync_profile(new_profile)
            .await
            .map_err(Into::into)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Profile, GardenUsersError> {
        self.service.get_profile(id).await.map_err(Into::into)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, GardenUsersError> {
        self.service
            .update_profile(id, patch)
            .await
            .map_err(Into::into)
    }
}
