use std::path::PathBuf;

/// Result type alias for the core pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the core pipeline
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// Go source that could not be parsed
    Syntax { file: PathBuf, message: String },
    /// A structurally invalid type expression (e.g. a map type missing its `]`)
    InvalidType(String),
    /// A comment tag that does not match its grammar
    Comment(String),
    /// Module/package resolution through the Go toolchain failed
    Toolchain(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Syntax { file, message } => {
                write!(f, "syntax error in {}: {}", file.display(), message)
            }
            Error::InvalidType(msg) => write!(f, "invalid type expression: {}", msg),
            Error::Comment(msg) => write!(f, "comment parse error: {}", msg),
            Error::Toolchain(msg) => write!(f, "go toolchain error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
