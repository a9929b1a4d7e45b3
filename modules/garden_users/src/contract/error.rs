use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GardenUsersError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Profile with email '{email}' already exists")]
    Conflict { email: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage is not available: {message}")]
    Configuration { message: String },

    #[error("Persistence failed: {message}")]
    Persistence { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GardenUsersError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(email: String) -> Self {
        Self::Conflict { email }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<crate::domain::error::DomainError> for GardenUsersError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            MemberNotFound { id } => Self::not_found("Member", id),
            ProfileNotFound { id } => Self::not_found("Profile", id),
            EmailAlreadyExists { email } => Self::conflict(email),
            ProfileAlreadyExists { id } => Self::AlreadyExists {
                entity: "Profile",
                id: id.to_string(),
            },
            Validation { field, message } => Self::validation(format!("{}: {}", field, message)),
            Configuration { message } => Self::Configuration { message },
            Persistence { message } => Self::Persistence { message },
        }
    }
}
