#![deny(missing_docs)]
//! mdsite core: markdown parsing, slugs, errors, and template filters.

/// Core error types.
pub mod error;
/// Date filters and shortcodes for page templates.
pub mod filters;
/// Markdown parsing utilities and extension hooks.
pub mod parse;
/// Slug generation utilities.
pub mod slug;

pub use error::{ConfigurationError, SiteError, SourceLocation};
pub use filters::{current_year, html_date_string, readable_date};
pub use parse::{AstTransform, MarkdownParser, ParseOptions, TextTransform, parse_mdast};
pub use slug::{SlugRegistry, slugify};
