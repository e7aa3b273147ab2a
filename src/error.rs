use thiserror::Error;

/// Errors raised while reading or evaluating Skeem code.
///
/// Every variant unwinds to the top-level recovery point in
/// [`Interpreter::eval_toplevel`](crate::eval::Interpreter::eval_toplevel);
/// none of them is ever observable as a language-level value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkeemError {
    /// Symbol not bound in any frame of the active chain.
    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    #[error("{procedure}: wrong argument type - {found} (expected {expected})")]
    WrongArgumentType {
        procedure: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("wrong number of arguments to {procedure} (got {got}, wanted {expected})")]
    WrongNumberOfArguments {
        procedure: String,
        expected: String,
        got: usize,
    },

    /// The operator position evaluated to something that cannot be applied.
    #[error("invalid function: {0}")]
    InvalidFunction(String),

    #[error("division by zero")]
    DivisionByZero,

    /// A `)` with no matching `(`.
    #[error("unbalanced expression")]
    UnbalancedExpression,

    #[error("no matching cond clause")]
    NoMatchingCondClause,

    /// Symbol-to-symbol alias chain longer than the configured cap.
    #[error("cyclic binding while resolving {0}")]
    CyclicBinding(String),

    /// Raised by `exit`. Unwinds like an error; the driver turns it into a
    /// process exit status.
    #[error("exit with status {0}")]
    Exit(i32),
}

impl SkeemError {
    pub fn wrong_type(procedure: &str, expected: &'static str, found: &'static str) -> Self {
        SkeemError::WrongArgumentType {
            procedure: procedure.to_string(),
            expected,
            found,
        }
    }

    /// Returns the requested status if this is an `exit` unwind.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            SkeemError::Exit(status) => Some(*status),
            _ => None,
        }
    }
}

pub type SkeemResult<T> = Result<T, SkeemError>;
