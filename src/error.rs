use std::{error::Error, fmt::Display};

/// Errors surfaced by the typemap engine itself (spec error taxonomy: bad arity,
/// scope overflow). Lookup misses, scope underflow and template-variable misuse are
/// represented as `None`/silent no-ops rather than errors, per the engine's narrow
/// error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypemapError {
    /// `%apply`/`copy` called with mismatched source/destination arities.
    BadArity { expected: usize, found: usize },
}

impl Display for TypemapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypemapError::BadArity { expected, found } => f.write_fmt(format_args!(
                "mismatched parameter count: expected {expected}, found {found}"
            )),
        }
    }
}

impl Error for TypemapError {}

pub type TResult<T> = Result<T, TypemapError>;
