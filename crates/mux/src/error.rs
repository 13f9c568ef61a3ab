use thiserror::Error;

/// Errors raised while registering routes.
///
/// Request handling never fails with a `RouteError`: unmatched requests are
/// answered by the not-found and method-not-allowed handlers instead.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("invalid route pattern: pattern must not be empty")]
    EmptyPattern,

    #[error("invalid http method: {method:?}")]
    InvalidMethod { method: String },

    #[error("invalid route segment {segment:?}: parameter name is empty")]
    EmptyParamName { segment: String },

    #[error("invalid route segment {segment:?}: {source}")]
    InvalidRegex {
        segment: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid route pattern {pattern:?}: catch-all parameter must be the last segment")]
    CatchAllNotLast { pattern: String },

    #[error("pattern conflict: {method} {pattern:?}")]
    Conflict { method: String, pattern: String },
}

impl RouteError {
    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn empty_param_name<S: ToString>(segment: S) -> Self {
        Self::EmptyParamName { segment: segment.to_string() }
    }

    pub fn invalid_regex<S: ToString>(segment: S, source: regex::Error) -> Self {
        Self::InvalidRegex { segment: segment.to_string(), source }
    }

    pub fn catch_all_not_last<S: ToString>(pattern: S) -> Self {
        Self::CatchAllNotLast { pattern: pattern.to_string() }
    }

    pub fn conflict<M: ToString, P: ToString>(method: M, pattern: P) -> Self {
        Self::Conflict { method: method.to_string(), pattern: pattern.to_string() }
    }

    /// Returns true for the recoverable conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
