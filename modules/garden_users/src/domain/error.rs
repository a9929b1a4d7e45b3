use thiserror::Error;
use uuid::Uuid;

use crate::domain::repo::RepoError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Member not found: {id}")]
    MemberNotFound { id: i64 },

    #[error("Profile not found: {id}")]
    ProfileNotFound { id: Uuid },

    #[error("Profile with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Profile already exists: {id}")]
    ProfileAlreadyExists { id: Uuid },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Storage configuration error: {message}")]
    Configuration { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },
}

impl DomainError {
    pub fn member_not_found(id: i64) -> Self {
        Self::MemberNotFound { id }
    }

    pub fn profile_not_found(id: Uuid) -> Self {
        Self::ProfileNotFound { id }
    }

    pub fn email_already_exists(email: String) -> Self {
        Self::EmailAlreadyExists { email }
    }

    pub fn profile_already_exists(id: Uuid) -> Self {
        Self::ProfileAlreadyExists { id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Configuration(message) => Self::Configuration { message },
            RepoError::DuplicateEmail { email } => Self::EmailAlreadyExists { email },
            RepoError::DuplicateId { id } => Self::ProfileAlreadyExists { id },
            RepoError::Persistence(message) => Self::Persistence { message },
        }
    }
}
