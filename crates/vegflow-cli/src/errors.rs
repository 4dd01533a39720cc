use console::style;
use std::fmt;
use vegflow_core::VegflowError;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }

    /// Machine-readable form for `--json`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "error",
            "message": self.message,
            "context": self.context,
            "suggestions": self.suggestions,
        })
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for an unusable year range
pub fn invalid_year_range(start_year: i32, end_year: i32, reason: &str) -> CliError {
    CliError::new("Invalid year range")
        .with_context(format!("Requested {} to {}: {}", start_year, end_year, reason))
        .with_suggestion("Landsat 8 composites are available from 2013 through last year")
        .with_suggestion("Put the earlier year first: --start-year 2019 --end-year 2021")
        .with_help("Run: vegflow months --help")
}

/// Create error for an ROI that cannot be tiled
pub fn invalid_roi(location: &str, reason: &str) -> CliError {
    CliError::new("ROI geometry cannot be tiled")
        .with_context(format!("Problem at {}: {}", location, reason))
        .with_suggestion("Check that the file holds at least one polygon with a non-zero area")
        .with_suggestion("Check that the coordinates match the declared CRS")
        .with_help("Run: vegflow tile --help")
}

/// Create error for an unsupported ROI file
pub fn unsupported_format(extension: &str, supported: &[String]) -> CliError {
    CliError::new(format!("Unsupported ROI format: .{}", extension))
        .with_context(format!("Supported extensions: {}", supported.join(", ")))
        .with_suggestion("Export the ROI as GeoJSON or Shapefile")
        .with_help("Run: vegflow tile --help")
}

/// Create error for an unreachable imagery service
pub fn imagery_unavailable(reason: &str) -> CliError {
    CliError::new("Imagery service unavailable")
        .with_context(format!("Error: {}", reason))
        .with_suggestion("Check the service is running and reachable")
        .with_suggestion("Point to it with --imagery-url or VEGFLOW_IMAGERY_URL")
        .with_help("Run: vegflow config")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check vegflow.toml for syntax errors")
        .with_suggestion("Or check the VEGFLOW_* environment variables")
        .with_help("Run: vegflow config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(core) = error.chain().find_map(|e| e.downcast_ref::<VegflowError>()) {
        return from_core(core, &error);
    }

    let message = format!("{:#}", error);
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.to_lowercase().contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
            .with_suggestion("Or choose another --data-dir")
    } else {
        CliError::new(message)
    }
}

fn from_core(core: &VegflowError, error: &anyhow::Error) -> CliError {
    match core {
        VegflowError::InvalidRange { start_year, end_year, reason } => {
            invalid_year_range(*start_year, *end_year, reason)
        }
        VegflowError::InvalidGeometry { location, reason } => invalid_roi(location, reason),
        VegflowError::UnsupportedFormat { extension, supported } => {
            unsupported_format(extension, supported)
        }
        VegflowError::Imagery { reason } => imagery_unavailable(reason),
        VegflowError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        _ => CliError::new(format!("{:#}", error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_core_error_is_found_through_context() {
        let result: anyhow::Result<()> = Err(VegflowError::InvalidRange {
            start_year: 2025,
            end_year: 2020,
            reason: "start year is after end year".to_string(),
        })
        .context("Failed to plan download");

        let cli_error = from_anyhow(result.unwrap_err());
        assert_eq!(cli_error.message, "Invalid year range");
        assert!(cli_error.context.unwrap().contains("2025 to 2020"));
    }

    #[test]
    fn test_plain_error_keeps_message() {
        let cli_error = from_anyhow(anyhow::anyhow!("something odd"));
        assert_eq!(cli_error.message, "something odd");
        assert!(cli_error.suggestions.is_empty());
    }

    #[test]
    fn test_json_form() {
        let json = invalid_config("max_workers", "must be greater than 0").to_json();
        assert_eq!(json["status"], "error");
        assert_eq!(json["suggestions"].as_array().unwrap().len(), 2);
    }
}
