//! Registry error types.

use serde::Serialize;
use thiserror::Error;

/// Errors returned by registry operations.
///
/// Every variant is recoverable. A failed operation never leaves a partial
/// mutation behind.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("component group not found: {0}")]
    GroupNotFound(String),

    #[error("component group already exists: {0}")]
    AlreadyExists(String),

    #[error("{kind} '{id}' is already assigned to component group '{group}'")]
    AlreadyAssigned {
        group: String,
        kind: AssociationKind,
        id: String,
    },

    #[error("{kind} '{id}' is not assigned to component group '{group}'")]
    AssociationNotFound {
        group: String,
        kind: AssociationKind,
        id: String,
    },

    #[error("setting not found: {0}")]
    SettingNotFound(String),

    #[error("component group already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("invalid {0} identifier: must not be empty")]
    InvalidIdentifier(&'static str),

    #[error("persistence error: {0}")]
    Persistence(#[from] homegrid_state::StateError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Which kind of association an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    Component,
    Macro,
}

impl std::fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationKind::Component => f.write_str("component"),
            AssociationKind::Macro => f.write_str("macro"),
        }
    }
}

/// Coarse classification of a [`RegistryError`] for boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    AlreadyAssigned,
    AssociationNotFound,
    SettingNotFound,
    AlreadyInitialized,
    InvalidIdentifier,
    Persistence,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::GroupNotFound(_) => ErrorKind::NotFound,
            RegistryError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            RegistryError::AlreadyAssigned { .. } => ErrorKind::AlreadyAssigned,
            RegistryError::AssociationNotFound { .. } => ErrorKind::AssociationNotFound,
            RegistryError::SettingNotFound(_) => ErrorKind::SettingNotFound,
            RegistryError::AlreadyInitialized(_) => ErrorKind::AlreadyInitialized,
            RegistryError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            RegistryError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// True for the group-level not-found condition, which a boundary layer
    /// reports as an absent result rather than an error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::GroupNotFound(_))
    }
}

/// Reject empty identifiers before any state is touched.
pub(crate) fn validate_identifier(kind: &'static str, id: &str) -> RegistryResult<()> {
    if id.is_empty() {
        return Err(RegistryError::InvalidIdentifier(kind));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_taxonomy() {
        assert_eq!(RegistryError::GroupNotFound("g".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            RegistryError::AssociationNotFound {
                group: "g".into(),
                kind: AssociationKind::Macro,
                id: "m".into(),
            }
            .kind(),
            ErrorKind::AssociationNotFound
        );
        assert_eq!(
            RegistryError::Persistence(homegrid_state::StateError::Write("disk full".into())).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn only_group_miss_is_not_found() {
        assert!(RegistryError::GroupNotFound("g".into()).is_not_found());
        assert!(!RegistryError::SettingNotFound("k".into()).is_not_found());
    }

    #[test]
    fn messages_name_the_association() {
        let err = RegistryError::AlreadyAssigned {
            group: "kitchen".into(),
            kind: AssociationKind::Component,
            id: "light1".into(),
        };
        assert_eq!(
            err.to_string(),
            "component 'light1' is already assigned to component group 'kitchen'"
        );
    }

    #[test]
    fn empty_identifier_rejected() {
        assert!(matches!(
            validate_identifier("group", ""),
            Err(RegistryError::InvalidIdentifier("group"))
        ));
        assert!(validate_identifier("group", "kitchen").is_ok());
    }
}
