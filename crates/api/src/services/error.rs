use taskapi_core::error::ErrorKind;
use taskapi_db::store::StoreError;

/// Outcome of a business rule check or a storage call made by a service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("A role named '{0}' already exists")]
    DuplicateName(String),

    #[error("The email '{0}' is already in use")]
    DuplicateEmail(String),

    /// Operation deliberately left unimplemented.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::DuplicateName(_) | ServiceError::DuplicateEmail(_) => {
                ErrorKind::Conflict
            }
            ServiceError::NotImplemented(_) => ErrorKind::NotImplemented,
            ServiceError::Internal(_) => ErrorKind::Internal,
            ServiceError::Storage(err) => err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_conflicts() {
        assert_eq!(
            ServiceError::DuplicateName("Sales".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ServiceError::DuplicateEmail("a@b.c".into()).kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn not_implemented_is_distinct_from_business_errors() {
        let err = ServiceError::NotImplemented("Role update");
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        assert_eq!(err.to_string(), "Role update is not implemented");
    }

    #[test]
    fn storage_errors_keep_their_kind() {
        let err = ServiceError::from(StoreError::TriggerConflict("blocked".into()));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
