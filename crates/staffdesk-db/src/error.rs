// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use rusqlite::ffi;
use staffdesk_app::ResourceKind;

/// Store failures callers branch on. Travels inside `anyhow::Error`; recover
/// it with `downcast_ref::<StoreError>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness or primary-key constraint rejected the write.
    Conflict { kind: ResourceKind, detail: String },
    NotFound { kind: ResourceKind, id: i64 },
    /// A foreign key names a row that does not exist.
    InvalidReference { kind: ResourceKind },
    /// Any other constraint, e.g. a missing required column.
    Rejected { kind: ResourceKind, detail: String },
    NoFilterRoute(ResourceKind),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict { kind, detail } => write!(
                f,
                "{} record duplicates an existing one ({detail}) -- change the key or unique field",
                kind.label()
            ),
            Self::NotFound { kind, id } => write!(f, "{} record {id} not found", kind.label()),
            Self::InvalidReference { kind } => write!(
                f,
                "{} record references a row that does not exist -- pick an existing one",
                kind.label()
            ),
            Self::Rejected { kind, detail } => {
                write!(f, "{} record rejected by the database ({detail})", kind.label())
            }
            Self::NoFilterRoute(kind) => {
                write!(f, "{} cannot be filtered by a parent record", kind.label())
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Classifies a failed write by its SQLite extended result code.
pub(crate) fn write_error(kind: ResourceKind, error: rusqlite::Error) -> anyhow::Error {
    if let rusqlite::Error::SqliteFailure(failure, message) = &error {
        let detail = message.clone().unwrap_or_else(|| failure.to_string());
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return StoreError::Conflict { kind, detail }.into();
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StoreError::InvalidReference { kind }.into();
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL | ffi::SQLITE_CONSTRAINT_CHECK => {
                return StoreError::Rejected { kind, detail }.into();
            }
            _ => {}
        }
    }
    anyhow::Error::new(error)
}
