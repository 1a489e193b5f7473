use crate::Utility;

/// Coarse classification of a [`PlanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Setup,
    Deadline,
    Resource,
    Overflow,
    Scope,
    Invariant,
}

/// Everything that can go wrong while configuring or running a search.
///
/// Setup errors are raised before the first expansion. Deadline errors
/// abandon the current restart only; the remaining variants abort the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("setup: {0}")]
    Setup(String),
    #[error("deadline exceeded during {context} (best lower bound {lower_bound:?})")]
    DeadlineExceeded {
        context: String,
        lower_bound: Option<Utility>,
    },
    #[error("policy pool is empty")]
    EmptyPool,
    #[error("inconsistent scope: {0}")]
    InconsistentScope(String),
    #[error("index overflow: {0}")]
    Overflow(String),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl PlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Setup(_) => ErrorKind::Setup,
            Self::DeadlineExceeded { .. } => ErrorKind::Deadline,
            Self::EmptyPool => ErrorKind::Invariant,
            Self::InconsistentScope(_) => ErrorKind::Scope,
            Self::Overflow(_) => ErrorKind::Overflow,
            Self::ResourceExhausted(_) => ErrorKind::Resource,
            Self::Invariant(_) => ErrorKind::Invariant,
        }
    }
    /// Only deadline errors leave the planner in a state where the next
    /// restart may still run.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Deadline
    }
    pub(crate) fn deadline(context: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            context: context.into(),
            lower_bound: None,
        }
    }
    pub(crate) fn overflow(what: impl std::fmt::Display) -> Self {
        Self::Overflow(what.to_string())
    }
}

impl From<std::collections::TryReserveError> for PlanError {
    fn from(e: std::collections::TryReserveError) -> Self {
        Self::ResourceExhausted(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
