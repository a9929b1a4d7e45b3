//! SeaORM-backed repository implementation for the domain port.
//!
//! Each mutating operation is a self-contained unit of work: it takes a
//! session from the shared [`SessionFactory`], begins a transaction, builds
//! the active model, runs the lifecycle hook, writes, commits and drops the
//! session. On any error the transaction is dropped uncommitted (rolled
//! back) and the session is still released.

use std::sync::Arc;

use garden_db::{DbError, SessionFactory};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::contract::model::{Member, NewMember, NewProfile, Profile, ProfilePatch};
use crate::domain::lifecycle::{self, LifecycleHooks};
use crate::domain::repo::{GardenRepository, RepoError};
use crate::infra::storage::entity::{member, profile};

impl From<DbError> for RepoError {
    fn from(e: DbError) -> Self {
        if e.is_configuration() {
            RepoError::Configuration(e.to_string())
        } else {
            RepoError::Persistence(e.to_string())
        }
    }
}

impl From<DbErr> for RepoError {
    fn from(e: DbErr) -> Self {
        RepoError::Persistence(e.to_string())
    }
}

/// Map a failed profile write, turning unique-key violations into duplicates.
/// The `profiles` table has two unique keys: the primary key and `email`.
fn profile_write_error(e: DbErr, id: Uuid, email: &str) -> RepoError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("email") => {
            RepoError::DuplicateEmail {
                email: email.to_string(),
            }
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => RepoError::DuplicateId { id },
        _ => e.into(),
    }
}

/// SeaORM repository over a shared session factory.
pub struct SeaOrmGardenRepository {
    sessions: Arc<SessionFactory>,
}

impl SeaOrmGardenRepository {
    pub fn new(sessions: Arc<SessionFactory>) -> Self {
        Self { sessions }
    }
}

#[async_trait::async_trait]
impl GardenRepository for SeaOrmGardenRepository {
    #[instrument(name = "garden_users.repo.insert_member", skip_all)]
    async fn insert_member(&self, new_member: NewMember) -> Result<Member, RepoError> {
        let session = self.sessions.get_session().await?;
        let txn = session.begin().await?;

        let mut am = member::ActiveModel {
            name: Set(new_member.name),
            role: Set(new_member.role),
            ..Default::default()
        };
        am.pre_persist(lifecycle::now());

        let saved = am.insert(&txn).await?;
        txn.commit().await?;

        debug!(member_id = saved.id, "Member committed");
        Ok(saved.into())
    }

    async fn find_member(&self, id: i64) -> Result<Option<Member>, RepoError> {
        let session = self.sessions.get_session().await?;
        let found = member::Entity::find_by_id(id)
            .one(session.connection())
            .await?;
        Ok(found.map(Into::into))
    }

    async fn list_members(&self, limit: u64, offset: u64) -> Result<Vec<Member>, RepoError> {
        let session = self.sessions.get_session().await?;
        let rows = member::Entity::find()
            .order_by_asc(member::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(session.connection())
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(name = "garden_users.repo.insert_profile", skip_all, fields(profile_id = %id))]
    async fn insert_profile(
        &self,
        id: Uuid,
        new_profile: NewProfile,
    ) -> Result<Profile, RepoError> {
        let session = self.sessions.get_session().await?;
        let txn = session.begin().await?;

        let email = new_profile.email.clone();
        let mut am = profile::ActiveModel {
            id: Set(id),
            full_name: Set(new_profile.full_name),
            email: Set(new_profile.email),
            avatar_url: Set(new_profile.avatar_url),
            ..Default::default()
        };
        am.pre_persist(lifecycle::now());

        let saved = am
            .insert(&txn)
            .await
            .map_err(|e| profile_write_error(e, id, &email))?;
        txn.commit().await?;

        debug!("Profile committed");
        Ok(saved.into())
    }

    #[instrument(name = "garden_users.repo.upsert_profile", skip_all, fields(profile_id = %id))]
    async fn upsert_profile(
        &self,
        id: Uuid,
        new_profile: NewProfile,
    ) -> Result<Profile, RepoError> {
        let session = self.sessions.get_session().await?;
        let txn = session.begin().await?;

        let email = new_profile.email.clone();
        let written = match profile::Entity::find_by_id(id).one(&txn).await? {
            Some(current) => {
                let mut am: profile::ActiveModel = current.into();
                am.full_name = Set(new_profile.full_name);
                am.email = Set(new_profile.email);
                am.avatar_url = Set(new_profile.avatar_url);
                am.pre_update(lifecycle::now());
                am.update(&txn).await
            }
            None => {
                let mut am = profile::ActiveModel {
                    id: Set(id),
                    full_name: Set(new_profile.full_name),
                    email: Set(new_profile.email),
                    avatar_url: Set(new_profile.avatar_url),
                    ..Default::default()
                };
                am.pre_persist(lifecycle::now());
                am.insert(&txn).await
            }
        };
        let saved = written.map_err(|e| profile_write_error(e, id, &email))?;
        txn.commit().await?;

        debug!("Profile sync committed");
        Ok(saved.into())
    }

    #[instrument(name = "garden_users.repo.update_profile", skip_all, fields(profile_id = %id))]
    async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Option<Profile>, RepoError> {
        let session = self.sessions.get_session().await?;
        let txn = session.begin().await?;

        let Some(current) = profile::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut am: profile::ActiveModel = current.into();
        if let Some(full_name) = patch.full_name {
            am.full_name = Set(full_name);
        }
        if let Some(avatar_url) = patch.avatar_url {
            am.avatar_url = Set(Some(avatar_url));
        }
        am.pre_update(lifecycle::now());

        let saved = am.update(&txn).await?;
        txn.commit().await?;

        debug!("Profile update committed");
        Ok(Some(saved.into()))
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        let session = self.sessions.get_session().await?;
        let found = profile::Entity::find_by_id(id)
            .one(session.connection())
            .await?;
        Ok(found.map(Into::into))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RepoError> {
        let session = self.sessions.get_session().await?;
        let count = profile::Entity::find()
            .filter(profile::Column::Email.eq(email))
            .count(session.connection())
            .await?;
        Ok(count > 0)
    }
}
