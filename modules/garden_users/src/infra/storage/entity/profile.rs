use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use uuid::Uuid;

use crate::domain::lifecycle::LifecycleHooks;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub full_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl LifecycleHooks for ActiveModel {
    fn pre_persist(&mut self, now: DateTime<Utc>) {
        self.created_at = Set(now);
        self.updated_at = Set(now);
    }

    fn pre_update(&mut self, now: DateTime<Utc>) {
        self.updated_at = Set(now);
    }
}
