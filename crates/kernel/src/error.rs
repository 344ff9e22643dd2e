//! Error taxonomy for schema administration.

use std::fmt;

use thiserror::Error;

/// Failure reported by a [`crate::SchemaAdmin`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("server unreachable: {0}")]
    Connectivity(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Existing documents violate a constraint the call asked for, e.g. a
    /// unique index over duplicated values.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("no database selected")]
    NoDatabaseSelected,

    #[error("server error: {0}")]
    Server(String),
}

impl AdminError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AdminError::AlreadyExists(_))
    }
}

/// The step of the provisioning sequence a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    SelectDatabase { database: String },
    CreateUser { username: String },
    CreateCollection { collection: String },
    CreateIndex { collection: String, index: String },
    Inspect { what: String },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::SelectDatabase { database } => write!(f, "select database '{}'", database),
            Step::CreateUser { username } => write!(f, "create user '{}'", username),
            Step::CreateCollection { collection } => {
                write!(f, "create collection '{}'", collection)
            }
            Step::CreateIndex { collection, index } => {
                write!(f, "create index '{}' on '{}'", index, collection)
            }
            Step::Inspect { what } => write!(f, "inspect {}", what),
        }
    }
}

/// A provisioning step failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to {step}: {source}")]
pub struct InitError {
    pub step: Step,
    #[source]
    pub source: AdminError,
}

impl InitError {
    pub fn new(step: Step, source: AdminError) -> Self {
        Self { step, source }
    }
}
