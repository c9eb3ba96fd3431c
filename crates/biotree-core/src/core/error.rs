use super::models::identity::{AltKey, EntityId};
use super::models::level::Level;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HierarchyError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HierarchyError {
    #[error("Entity {id} defined twice")]
    DuplicateId { id: EntityId },

    #[error("No child with id {id}")]
    NotFound { id: EntityId },

    #[error("No alternative with key {key}")]
    AlternativeNotFound { key: AltKey },

    #[error("Alternative {key} defined twice")]
    DuplicateAlternative { key: AltKey },

    #[error("Disordered {level} {id} has no selected alternative")]
    Unselected { level: Level, id: EntityId },

    #[error("{level} {id} has no descendants to aggregate")]
    EmptyContainer { level: Level, id: EntityId },

    #[error("Node handle refers to an entity that no longer exists")]
    StaleKey,

    #[error("Level mismatch: expected {expected}, found {found}")]
    LevelMismatch { expected: Level, found: Level },

    #[error("Id {id} is not a valid {level} identifier")]
    InvalidId { level: Level, id: EntityId },

    #[error("{level} {id} is not disordered")]
    NotDisordered { level: Level, id: EntityId },

    #[error("Alternative rejected by disordered {level} {group}: {reason}")]
    AlternativeMismatch {
        level: Level,
        group: EntityId,
        reason: String,
    },

    #[error("{level} {id} is already attached to a parent")]
    AlreadyAttached { level: Level, id: EntityId },

    #[error("Total mass of {level} {id} is zero; use the geometric center instead")]
    ZeroMass { level: Level, id: EntityId },

    #[error("Invalid position {position} for a container with {len} children")]
    InvalidPosition { position: usize, len: usize },
}
