pub use masterror::{AppError, AppResult};

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Create rule compilation error
///
/// Rule compilation failures abort the run before any query is evaluated.
pub fn rule_compile_error(stage: &str, rule: &str, message: impl Into<String>) -> AppError {
    AppError::bad_request(format!("{} error: {} {}", stage, rule, message.into()))
}

/// Create rule evaluation error
pub fn evaluation_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Create query file parse error at a 1-based line
pub fn query_parse_error(path: &str, line: usize, message: impl Into<String>) -> AppError {
    AppError::bad_request(format!(
        "Query parse error in '{}' at line {}: {}",
        path,
        line,
        message.into()
    ))
}

/// Create database error from a driver error
///
/// Used for prepare and explain failures, which are reported rather than fatal.
pub fn database_error(err: impl std::fmt::Display) -> AppError {
    AppError::service(err.to_string())
}

/// Create connection error
pub fn connection_error(err: impl std::fmt::Display) -> AppError {
    AppError::service(format!("database: connection error: {}", err))
}

/// Create cancellation error
pub fn cancelled_error() -> AppError {
    AppError::service("vet run cancelled")
}

/// Human-readable text of an error
///
/// `AppError`'s `Display` renders only the error kind; diagnostics need the
/// message it was built with.
pub fn error_message(err: &AppError) -> String {
    match err.message.as_deref() {
        Some(message) => message.to_string(),
        None => err.kind.to_string()
    }
}
