//! Per-record problems recovered during a pass.
//!
//! A diagnostic never stops the pass: the offending record is skipped or a
//! default is substituted, and sibling entities continue.

use std::fmt::{Display, Formatter};

use gwa_model::{EntityKind, Handle};
use gwa_record::RecordError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Record skipped: wrong field count, bad number, unknown token.
    MalformedRecord,
    /// Referenced entity missing; a default was used.
    UnresolvedReference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Kind being processed, when known.
    pub entity: Option<EntityKind>,
    pub handle: Handle,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.entity {
            Some(entity) => write!(f, "{:?} {entity} {}: {}", self.kind, self.handle, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn malformed(&mut self, entity: Option<EntityKind>, handle: Handle, err: &RecordError) {
        self.push(Diagnostic {
            severity: Severity::Error,
            kind: DiagnosticKind::MalformedRecord,
            entity,
            handle,
            message: err.to_string(),
        });
    }

    pub fn unresolved(&mut self, entity: EntityKind, handle: Handle, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            kind: DiagnosticKind::UnresolvedReference,
            entity: Some(entity),
            handle,
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
