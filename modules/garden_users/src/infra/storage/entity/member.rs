use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::lifecycle::LifecycleHooks;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
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
