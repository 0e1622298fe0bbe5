use thiserror::Error;

/// Rejections raised while constructing a condition tree. These are always
/// surfaced at build time, never deferred to compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("AND and OR require at least one child condition")]
    EmptyComposite,

    #[error("IN requires a non-empty list of values")]
    EmptyIn,

    #[error("BETWEEN requires exactly two values, got {0}")]
    BetweenArity(usize),
}

/// Rejections raised when finalizing a query through its builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
