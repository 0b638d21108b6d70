//! Crate-wide error types.

use thiserror::Error;

/// Errors raised while parsing a config/model file or validating the
/// assertions built from it.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate key `{0}` in section `[{1}]`")]
    DuplicateKey(String, String),

    #[error("missing required section `[{0}]`")]
    MissingSection(&'static str),

    #[error("malformed line {0}: {1}")]
    MalformedLine(usize, String),

    #[error("matcher `{matcher}` references undefined field `{field}`")]
    UnresolvedField { matcher: String, field: String },

    #[error("failed to parse matcher `{0}`: {1}")]
    BadMatcher(String, String),

    #[error("no such assertion `{0}` declared in the model")]
    UnknownAssertion(String),
}

/// Errors raised by the expression engine while parsing or evaluating a
/// matcher string. `EvalError` is intentionally never propagated out of
/// `Enforcer::enforce` for a single rule (see [`crate::error::EnforceError`]);
/// it is surfaced directly only by `Expr::compile`/`Expr::eval` callers.
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    #[error("unexpected character `{0}` at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unexpected end of expression")]
    UnexpectedEof,

    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("function `{0}` called with {1} arguments, expected {2}")]
    ArityMismatch(String, usize, usize),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("division by zero")]
    DivisionByZero,
}

/// Errors raised by a [`crate::rbac::RoleManager`].
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("no role manager registered for grouping type `{0}`")]
    ManagerNotFound(String),

    #[error("grouping rule must have 2 or 3 fields, got {0}")]
    BadArity(usize),
}

/// Errors raised by the policy store / management API.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy already exists: {0:?}")]
    PolicyExists(Vec<String>),

    #[error("policy not found: {0:?}")]
    PolicyMissing(Vec<String>),

    #[error("section `{0}` is neither a policy nor a grouping section")]
    InvalidSection(String),
}

/// Errors bubbled from an [`crate::adapter::Adapter`] implementation, cause
/// preserved.
#[derive(Debug, Error)]
#[error("adapter error: {0}")]
pub struct AdapterError(pub String);

/// Top-level error returned by the enforcer and management API.
#[derive(Debug, Error)]
pub enum EnforceError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
}

/// Crate-wide result alias.
pub type Result<T, E = EnforceError> = std::result::Result<T, E>;
