// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::model::Record;

/// How long a feedback message stays up before it clears itself.
pub const FEEDBACK_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Create,
    Update,
    Delete,
}

impl SyncOp {
    pub const fn method(self) -> &'static str {
        match self {
            Self::Create => "POST",
            Self::Update => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub const fn success_status(self) -> u16 {
        match self {
            Self::Create => 201,
            Self::Update => 200,
            Self::Delete => 204,
        }
    }

    const fn success_message(self) -> &'static str {
        match self {
            Self::Create => "Record added successfully",
            Self::Update => "Record updated successfully",
            Self::Delete => "Record deleted successfully",
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "Error adding record",
            Self::Update => "Error updating record",
            Self::Delete => "Error deleting record",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncRequest {
    Create {
        endpoint: String,
        record: Record,
    },
    Update {
        endpoint: String,
        id: String,
        record: Record,
    },
    Delete {
        endpoint: String,
        id: String,
    },
}

impl SyncRequest {
    pub fn op(&self) -> SyncOp {
        match self {
            Self::Create { .. } => SyncOp::Create,
            Self::Update { .. } => SyncOp::Update,
            Self::Delete { .. } => SyncOp::Delete,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Create { endpoint, .. }
            | Self::Update { endpoint, .. }
            | Self::Delete { endpoint, .. } => endpoint,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Create { .. } => None,
            Self::Update { id, .. } | Self::Delete { id, .. } => Some(id),
        }
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Create { record, .. } | Self::Update { record, .. } => Some(record),
            Self::Delete { .. } => None,
        }
    }

    /// Collection path for creates, member path for updates and deletes.
    pub fn path(&self) -> String {
        let endpoint = self.endpoint().trim_end_matches('/');
        match self.id() {
            Some(id) => format!("{endpoint}/{id}"),
            None => endpoint.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied(SyncOp),
    Conflict,
    /// `status` is `None` when no response arrived at all.
    Failed { op: SyncOp, status: Option<u16> },
}

impl SyncOutcome {
    pub fn from_status(op: SyncOp, status: u16) -> Self {
        if status == op.success_status() {
            return Self::Applied(op);
        }
        if op == SyncOp::Create && status == 409 {
            return Self::Conflict;
        }
        Self::Failed {
            op,
            status: Some(status),
        }
    }

    pub fn unreachable(op: SyncOp) -> Self {
        Self::Failed { op, status: None }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn feedback(&self) -> Feedback {
        match self {
            Self::Applied(op) => Feedback::success(op.success_message()),
            Self::Conflict => Feedback::error("Error: Duplicate entry detected."),
            Self::Failed { op, .. } => Feedback::error(op.failure_message()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

impl Feedback {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Error,
            message: message.into(),
        }
    }
}
