//! Error types shared by the engine and the games built on it.

use thiserror::Error;

use crate::api::types::EntityId;

/// Faults raised by the physics adapter. Fatal to the current frame only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// The handle refers to a body that was removed (e.g. by a round reset).
    #[error("rigid body is not in the simulation")]
    UnknownBody,

    #[error("invalid body for entity {0:?}: extents must be positive and finite")]
    InvalidBody(EntityId),

    #[error("invalid physics step delta: {0} ms")]
    InvalidStep(f32),
}

/// Failures of the persistence layer. Reads fall back to defaults; writes
/// are reported and otherwise ignored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,

    #[error("failed to write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("malformed value under {key}: {reason}")]
    Malformed { key: String, reason: String },
}

/// Error returned from a game's frame update.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("entity {0:?} is not in the scene")]
    MissingEntity(EntityId),
}
