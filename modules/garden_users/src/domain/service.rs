use std::sync::Arc;

use crate::config::GardenUsersConfig;
use crate::contract::model::{Member, NewMember, NewProfile, Profile, ProfilePatch};
use crate::domain::error::DomainError;
use crate::domain::repo::GardenRepository;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Domain service with the business rules for members and profiles.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn GardenRepository>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_name_length: usize,
    pub max_email_length: usize,
    pub default_list_limit: u64,
    pub max_list_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        (&GardenUsersConfig::default()).into()
    }
}

impl From<&GardenUsersConfig> for ServiceConfig {
    fn from(cfg: &GardenUsersConfig) -> Self {
        Self {
            max_name_length: cfg.max_name_length,
            max_email_length: cfg.max_email_length,
            default_list_limit: cfg.default_list_limit,
            max_list_limit: cfg.max_list_limit,
        }
    }
}

impl Service {
    pub fn new(repo: Arc<dyn GardenRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(
        name = "garden_users.service.register_member",
        skip(self),
        fields(name = %new_member.name)
    )]
    pub async fn register_member(&self, new_member: NewMember) -> Result<Member, DomainError> {
        info!("Registering member");

        self.validate_name("name", &new_member.name)?;
        let new_member = NewMember {
            role: new_member.role.filter(|r| !r.trim().is_empty()),
            ..new_member
        };

        let member = self.repo.insert_member(new_member).await?;

        info!(member_id = member.id, "Member registered");
        Ok(member)
    }

    #[instrument(name = "garden_users.service.get_member", skip(self), fields(member_id = id))]
    pub async fn get_member(&self, id: i64) -> Result<Member, DomainError> {
        debug!("Getting member by id");
        self.repo
            .find_member(id)
            .await?
            .ok_or_else(|| DomainError::member_not_found(id))
    }

    #[instrument(name = "garden_users.service.list_members", skip(self))]
    pub async fn list_members(
        &self,
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Vec<Member>, DomainError> {
        let limit = self.effective_limit(limit);
        debug!(limit, offset, "Listing members");

        let members = self.repo.list_members(limit, offset).await?;
        debug!("Listed {} members", members.len());
        Ok(members)
    }

    #[instrument(
        name = "garden_users.service.create_profile",
        skip(self),
        fields(email = %new_profile.email, full_name = %new_profile.full_name)
    )]
    pub async fn create_profile(&self, new_profile: NewProfile) -> Result<Profile, DomainError> {
        info!("Creating new profile");

        self.validate_name("full_name", &new_profile.full_name)?;
        let email = self.normalize_email(&new_profile.email)?;

        if self.repo.email_exists(&email).await? {
            return Err(DomainError::email_already_exists(email));
        }

        let id = new_profile.id.unwrap_or_else(Uuid::new_v4);
        let new_profile = NewProfile {
            email,
            ..new_profile
        };
        let profile = self.repo.insert_profile(id, new_profile).await?;

        info!("Successfully created profile with id={}", profile.id);
        Ok(profile)
    }

    /// Create the profile under its external id, or refresh it if it exists.
    ///
    /// A blank full name falls back to the email; a blank avatar is stored as `None`.
    #[instrument(
        name = "garden_users.service.sync_profile",
        skip(self),
        fields(email = %new_profile.email)
    )]
    pub async fn sync_profile(&self, new_profile: NewProfile) -> Result<Profile, DomainError> {
        info!("Syncing profile");

        let Some(id) = new_profile.id else {
            return Err(DomainError::validation("id", "required for sync"));
        };
        let email = self.normalize_email(&new_profile.email)?;
        let full_name = if new_profile.full_name.trim().is_empty() {
            email.clone()
        } else {
            new_profile.full_name
        };
        self.validate_name("full_name", &full_name)?;

        let profile = self
            .repo
            .upsert_profile(
                id,
                NewProfile {
                    id: Some(id),
                    full_name,
                    email,
                    avatar_url: new_profile.avatar_url.filter(|u| !u.trim().is_empty()),
                },
            )
            .await?;

        info!(profile_id = %profile.id, "Profile synced");
        Ok(profile)
    }

    #[instrument(name = "garden_users.service.get_profile", skip(self), fields(profile_id = %id))]
    pub async fn get_profile(&self, id: Uuid) -> Result<Profile, DomainError> {
        debug!("Getting profile by id");
        self.repo
            .find_profile(id)
            .await?
            .ok_or_else(|| DomainError::profile_not_found(id))
    }

    #[instrument(
        name = "garden_users.service.update_profile",
        skip(self),
        fields(profile_id = %id)
    )]
    pub async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, DomainError> {
        info!("Updating profile");

        if let Some(ref full_name) = patch.full_name {
            self.validate_name("full_name", full_name)?;
        }
        if patch.is_empty() {
            debug!("Empty patch, nothing to write");
            return self.get_profile(id).await;
        }

        let updated = self
            .repo
            .update_profile(id, patch)
            .await?
            .ok_or_else(|| DomainError::profile_not_found(id))?;

        info!("Successfully updated profile");
        Ok(updated)
    }

    // --- validation helpers ---

    fn validate_name(&self, field: &str, value: &str) -> Result<(), DomainError> {
        if value.trim().is_empty() {
            return Err(DomainError::validation(field, "must not be empty"));
        }
        let len = value.chars().count();
        if len > self.config.max_name_length {
            return Err(DomainError::validation(
                field,
                format!(
                    "too long: {} characters (max: {})",
                    len, self.config.max_name_length
                ),
            ));
        }
        Ok(())
    }

    /// Trimmed, lower-cased email, validated. Uniqueness is case-insensitive.
    fn normalize_email(&self, raw: &str) -> Result<String, DomainError> {
        let email = raw.trim().to_lowercase();
        if email.is_empty() {
            return Err(DomainError::validation("email", "must not be empty"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation(
                "email",
                format!("invalid format: '{}'", email),
            ));
        }
        let len = email.chars().count();
        if len > self.config.max_email_length {
            return Err(DomainError::validation(
                "email",
                format!(
                    "too long: {} characters (max: {})",
                    len, self.config.max_email_length
                ),
            ));
        }
        Ok(email)
    }

    fn effective_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .filter(|l| *l > 0)
            .unwrap_or(self.config.default_list_limit)
            .min(self.config.max_list_limit)
    }
}
