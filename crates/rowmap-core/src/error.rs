//! Error types for rowmap operations.

use std::fmt;

/// The primary error type for all rowmap operations.
#[derive(Debug)]
pub enum Error {
    /// Malformed statement composition; a programmer error surfaced with the
    /// statement context attached.
    Build(BuildError),
    /// Statement execution failure (constraint violation, connectivity, ...).
    Execution(ExecutionError),
    /// Value decoding failure while materializing a row.
    Type(TypeError),
    /// A single-row fetch matched no rows. A distinguished, expected outcome,
    /// not an execution failure.
    NotFound,
    /// Serialization/deserialization errors (index documents).
    Serde(String),
    /// Custom error with message.
    Custom(String),
}

/// Statement composition error.
#[derive(Debug)]
pub struct BuildError {
    /// Target table of the statement being composed.
    pub table: String,
    /// What went wrong.
    pub message: String,
}

/// Statement execution error.
#[derive(Debug)]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// Constraint violation (unique, foreign key, ...).
    Constraint,
    /// Connection lost or could not be established.
    Connection,
    /// Statement timed out.
    Timeout,
    /// Other database error.
    Database,
}

/// Value decoding error.
#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Build a composition error for the given table.
    pub fn build(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Build(BuildError {
            table: table.into(),
            message: message.into(),
        })
    }

    /// Build an execution error of the given kind.
    pub fn execution(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Error::Execution(ExecutionError {
            kind,
            message: message.into(),
            source: None,
        })
    }

    /// Is this the distinguished no-matching-row outcome?
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Build(e) => write!(f, "Statement build error on '{}': {}", e.table, e.message),
            Error::Execution(e) => write!(f, "Execution error: {}", e.message),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::NotFound => write!(f, "No matching row"),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Execution(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::Build(err)
    }
}

impl From<ExecutionError> for Error {
    fn from(err: ExecutionError) -> Self {
        Error::Execution(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

/// Result type alias for rowmap operations.
pub type Result<T> = std::result::Result<T, Error>;
