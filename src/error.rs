//! Error types for route table construction, URL building and navigation
//!
//! Every failure is synchronous and local: nothing here is retried.

use thiserror::Error;

/// Result alias used across the crate
pub type RouterResult<T> = Result<T, RouterError>;

/// Errors produced by the router and its pattern matcher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// No route is registered under this name
    #[error("Can not find route for {name}")]
    RouteNotFound { name: String },

    /// A placeholder of the pattern has no value in the supplied params
    #[error("Missing parameter '{param}' for pattern '{pattern}'")]
    MissingParam { pattern: String, param: String },

    /// A supplied value is empty or does not satisfy the placeholder's constraint
    #[error("Parameter '{param}' of pattern '{pattern}' has invalid value '{value}'")]
    InvalidParam {
        pattern: String,
        param: String,
        value: String,
    },

    /// The pattern string could not be compiled
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl RouterError {
    pub(crate) fn route_not_found(name: impl Into<String>) -> Self {
        Self::RouteNotFound { name: name.into() }
    }

    pub(crate) fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error reports an unregistered route name
    pub fn is_route_not_found(&self) -> bool {
        matches!(self, RouterError::RouteNotFound { .. })
    }

    /// Check if the error reports an absent placeholder value
    pub fn is_missing_param(&self) -> bool {
        matches!(self, RouterError::MissingParam { .. })
    }

    /// Check if the error comes from pattern compilation
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, RouterError::InvalidPattern { .. })
    }
}
