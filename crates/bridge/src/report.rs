//! Rendering of bridge failures for operators.

use std::fmt;

use crate::errors::{BridgeError, ErrorCategory};

/// A failure as shown to the operator.
#[derive(Debug)]
pub enum DisplayedError {
    /// Something the operator can fix by changing input or configuration.
    UserError(String, Box<dyn fmt::Debug + Send + Sync>),
    /// Anything that went wrong while servicing a valid request.
    InternalError(String, Box<dyn fmt::Debug + Send + Sync>),
}

impl DisplayedError {
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::UserError(..))
    }
}

pub fn user_error<E>(msg: impl Into<String>) -> impl FnOnce(E) -> DisplayedError
where
    E: fmt::Debug + Send + Sync + 'static,
{
    move |e| DisplayedError::UserError(msg.into(), Box::new(e))
}

pub fn internal_error<E>(msg: impl Into<String>) -> impl FnOnce(E) -> DisplayedError
where
    E: fmt::Debug + Send + Sync + 'static,
{
    move |e| DisplayedError::InternalError(msg.into(), Box::new(e))
}

pub trait DisplayableError {
    type Output;
    fn user_error(self, msg: impl Into<String>) -> Result<Self::Output, DisplayedError>;
    fn internal_error(self, msg: impl Into<String>) -> Result<Self::Output, DisplayedError>;
}

impl<T, E: fmt::Debug + Send + Sync + 'static> DisplayableError for Result<T, E> {
    type Output = T;

    fn user_error(self, msg: impl Into<String>) -> Result<Self::Output, DisplayedError> {
        self.map_err(user_error(msg))
    }

    fn internal_error(self, msg: impl Into<String>) -> Result<Self::Output, DisplayedError> {
        self.map_err(internal_error(msg))
    }
}

impl fmt::Display for DisplayedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserError(msg, e) => write!(f, "User error: {msg}: {e:?}"),
            Self::InternalError(msg, e) => write!(f, "Internal error: {msg}: {e:?}"),
        }
    }
}

fn headline(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Input => "invalid input",
        ErrorCategory::Network => "node unreachable",
        ErrorCategory::Rejected => "transaction rejected by the network",
        ErrorCategory::Verification => "batch verification failed",
        ErrorCategory::Ambiguous => "transaction outcome unknown, check the chain before retrying",
        ErrorCategory::Cancelled => "cancelled",
        ErrorCategory::Internal => "unexpected failure",
    }
}

impl From<BridgeError> for DisplayedError {
    fn from(err: BridgeError) -> Self {
        let category = err.category();
        let msg = format!("{}: {err}", headline(category));
        match category {
            ErrorCategory::Input | ErrorCategory::Cancelled => user_error(msg)(err),
            _ => internal_error(msg)(err),
        }
    }
}
