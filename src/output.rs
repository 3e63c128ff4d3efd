use colored::Colorize;

use crate::rules::{LoadFailure, VetReport, Violation, ViolationKind};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

impl OutputOptions {
    /// Text diagnostics go to stderr, structured formats to stdout
    pub fn writes_to_stderr(&self) -> bool {
        self.format == OutputFormat::Text
    }
}

/// Render a vet report
///
/// Text output is one line per group that failed to load, then one line per
/// violation in discovery order, with no summary. An empty report renders as
/// an empty string.
pub fn format_report(report: &VetReport, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(report).unwrap_or_default(),
        OutputFormat::Text => format_text_report(report, opts)
    }
}

fn format_text_report(report: &VetReport, opts: &OutputOptions) -> String {
    let mut output = String::new();
    for failure in &report.load_failures {
        if opts.colored {
            output.push_str(&format_load_failure_colored(failure));
        } else {
            output.push_str(&failure.to_string());
        }
        output.push('\n');
    }
    for violation in &report.violations {
        if opts.colored {
            output.push_str(&format_colored(violation));
        } else {
            output.push_str(&violation.to_string());
        }
        output.push('\n');
    }
    output
}

fn format_colored(violation: &Violation) -> String {
    let rule = match violation.kind {
        ViolationKind::Rule => violation.rule_name.red().bold(),
        ViolationKind::Prepare | ViolationKind::Explain => violation.rule_name.yellow().bold()
    };
    let mut line = format!(
        "{}: {}: {}",
        violation.filename.bold(),
        violation.query_name.cyan(),
        rule
    );
    if let Some(message) = &violation.message {
        line.push_str(&format!(": {}", message));
    }
    line
}

fn format_load_failure_colored(failure: &LoadFailure) -> String {
    format!(
        "{}: {}",
        format!("sql[{}]", failure.group).red().bold(),
        failure.message
    )
}
