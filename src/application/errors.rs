//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Voice library errors
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid category: {0:?}")]
    InvalidCategory(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LibraryError> for CommandError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::InvalidCategory(name) => {
                CommandError::InvalidArgs(format!("invalid voice category {:?}", name))
            }
            other => CommandError::ExecutionFailed(other.to_string()),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_category_maps_to_invalid_args() {
        let err: CommandError = LibraryError::InvalidCategory("../etc".to_string()).into();
        assert!(matches!(err, CommandError::InvalidArgs(_)));
        assert!(err.to_string().contains("../etc"));
    }

    #[test]
    fn test_io_error_maps_to_execution_failed() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CommandError = LibraryError::Io(io).into();
        assert!(matches!(err, CommandError::ExecutionFailed(_)));
    }
}
