//! Error types for gwa-sync

use gwa_model::{EntityKind, Handle, HandleSpace};
use thiserror::Error;

use crate::channel::ChannelError;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Fatal errors. Any of these aborts the operation and the working model is
/// discarded; per-record problems are reported as diagnostics instead.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{space} handle {handle} requested twice in one operation")]
    DuplicateHandleRequest { space: HandleSpace, handle: Handle },

    #[error("dependency cycle between kinds {0:?}")]
    DependencyCycle(Vec<EntityKind>),

    #[error("{kind} started before prerequisite {prerequisite} was done")]
    PrerequisiteNotDone {
        kind: EntityKind,
        prerequisite: EntityKind,
    },

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
