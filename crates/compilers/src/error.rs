use model::query::condition::Operator;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{operation} is not supported by the {target} target")]
    Unsupported {
        operation: String,
        target: &'static str,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("parameter {0} was bound twice in one compilation")]
    BindingConflict(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn unsupported(operator: Operator, target: &'static str) -> Self {
        CompileError::Unsupported {
            operation: operator.to_string(),
            target,
        }
    }
}
