//! Helper functions for the vet command.

use super::convert::convert_format;
use crate::{cli::Format, output::OutputOptions, rules::VetReport};

/// Calculates the process exit code of a completed run.
///
/// - `0` - No violations
/// - `1` - At least one rule tripped, a database check failed or a group failed to load
///
/// Fatal errors never reach this point; the binary maps them to `2`.
///
/// # Example
///
/// ```
/// use sql_query_vet::{app::calculate_exit_code, rules::VetReport};
///
/// let report = VetReport::new();
/// assert_eq!(calculate_exit_code(&report), 0);
/// ```
pub fn calculate_exit_code(report: &VetReport) -> i32 {
    if report.has_failures() { 1 } else { 0 }
}

/// Creates output options from CLI parameters.
pub fn create_output_options(format: Format, no_color: bool) -> OutputOptions {
    OutputOptions {
        format:  convert_format(format),
        colored: !no_color
    }
}
