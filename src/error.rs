use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for discovery, registration and schema mutation
#[derive(Debug)]
pub enum Error {
    /// Discovery was attempted without a method registry
    NoRegistry,
    /// A block-list entry is not a valid regular expression
    InvalidPattern { pattern: String, message: String },
    /// No declaration in the source file matches the callable
    SymbolNotFound {
        method: String,
        symbol: String,
        file: PathBuf,
    },
    /// The type cannot be described by a schema
    UnsupportedType { type_name: String },
    /// The runtime signature and the source declaration disagree
    ArgumentMismatch { method: String, message: String },
    /// The registry supplied runtime values of an unexpected shape
    InvalidCallable { method: String, message: String },
    /// A method with this name is already registered
    DuplicateMethod(String),
    /// Building a method failed; `detail` carries a dump of the callable
    Method {
        method: String,
        detail: String,
        source: Box<Error>,
    },
    /// A schema mutation failed at the given location
    Mutation { location: String, message: String },
    Io { path: PathBuf, source: std::io::Error },
    Parse { file: PathBuf, message: String },
    Serialization(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NoRegistry => write!(f, "server provider undefined"),
            Error::InvalidPattern { pattern, message } => {
                write!(f, "invalid method block-list pattern {:?}: {}", pattern, message)
            }
            Error::SymbolNotFound {
                method,
                symbol,
                file,
            } => write!(
                f,
                "no declaration found: method name: {} (symbol {} in {})",
                method,
                symbol,
                file.display()
            ),
            Error::UnsupportedType { type_name } => write!(f, "unsupported type: {}", type_name),
            Error::ArgumentMismatch { method, message } => {
                write!(f, "argument mismatch in {}: {}", method, message)
            }
            Error::InvalidCallable { method, message } => {
                write!(f, "invalid callable for {}: {}", method, message)
            }
            Error::DuplicateMethod(name) => write!(f, "method already registered: {}", name),
            Error::Method {
                method,
                detail,
                source,
            } => write!(
                f,
                "make method error method={} cb={} error={}",
                method, detail, source
            ),
            Error::Mutation { location, message } => {
                write!(f, "schema mutation failed at {}: {}", location, message)
            }
            Error::Io { path, source } => write!(f, "IO error {}: {}", path.display(), source),
            Error::Parse { file, message } => {
                write!(f, "parse error {}: {}", file.display(), message)
            }
            Error::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Method { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}

impl Error {
    /// Wraps an I/O error with the path that caused it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// The method name this error is attributed to, if any
    pub fn method(&self) -> Option<&str> {
        match self {
            Error::SymbolNotFound { method, .. }
            | Error::ArgumentMismatch { method, .. }
            | Error::InvalidCallable { method, .. }
            | Error::Method { method, .. } => Some(method),
            Error::DuplicateMethod(name) => Some(name),
            _ => None,
        }
    }
}
