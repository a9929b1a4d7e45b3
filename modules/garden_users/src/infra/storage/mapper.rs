use crate::contract::model::{Member, Profile};
use crate::infra::storage::entity::{member, profile};

impl From<member::Model> for Member {
    fn from(m: member::Model) -> Self {
        Member {
            id: m.id,
            name: m.name,
            role: m.role,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<profile::Model> for Profile {
    fn from(p: profile::Model) -> Self {
        Profile {
            id: p.id,
            full_name: p.full_name,
            email: p.email,
            avatar_url: p.avatar_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
