use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An option was given a value outside its accepted set.
///
/// Raised eagerly when a pipeline is configured: a silently corrected value
/// would change every anchor on the site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value `{value}` for option `{option}` (accepted: {accepted})")]
pub struct ConfigurationError {
    /// Name of the offending option (e.g. `anchor.placement`).
    pub option: String,
    /// The rejected value, as written by the caller.
    pub value: String,
    /// Human-readable list of accepted values.
    pub accepted: String,
}

impl ConfigurationError {
    /// Create a configuration error for `option`.
    pub fn new(
        option: impl Into<String>,
        value: impl Into<String>,
        accepted: impl Into<String>,
    ) -> Self {
        Self {
            option: option.into(),
            value: value.into(),
            accepted: accepted.into(),
        }
    }
}

/// Errors that can occur while configuring or running the rendering pipeline.
#[derive(Debug, Error)]
pub enum SiteError {
    /// Invalid option value.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A configuration file could not be decoded.
    #[error("Config format error: {0}")]
    ConfigFormat(String),
    /// IO error while reading sources or configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// The HTML rewriter rejected the rendered markup.
    #[error("HTML rewrite error: {0}")]
    Rewrite(String),
}

impl SiteError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MarkdownAdapter {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Returns true if this error comes from an invalid option value.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SiteError::Configuration(_))
    }
}
