//! Parameters and results of the `vet` command.

use std::path::PathBuf;

use crate::{cli::Format, rules::VetReport};

/// Parameters for the vet command.
///
/// # Example
///
/// ```
/// use sql_query_vet::{app::VetParams, cli::Format};
///
/// let params = VetParams {
///     config_file:   None,
///     working_dir:   ".".into(),
///     no_database:   true,
///     output_format: Format::Text,
///     no_color:      true
/// };
/// assert!(params.config_file.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct VetParams {
    /// Explicit configuration file, relative to `working_dir`
    pub config_file:   Option<PathBuf>,
    /// Directory the configuration is looked up in
    pub working_dir:   PathBuf,
    /// Never open database connections
    pub no_database:   bool,
    pub output_format: Format,
    pub no_color:      bool
}

/// Outcome of a completed vet run.
#[derive(Debug, Clone)]
pub struct VetResult {
    /// `0` when nothing tripped, `1` otherwise
    pub exit_code: i32,
    /// Rendered diagnostics; empty in text mode when nothing tripped
    pub output:    String,
    /// Whether `output` belongs on stderr
    pub to_stderr: bool,
    pub report:    VetReport
}
