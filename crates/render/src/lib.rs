#![deny(missing_docs)]
//! Markdown rendering pipeline for mdsite.
//!
//! Markdown goes in; an HTML fragment comes out together with the headings
//! it contains (level, text, unique slug) and an optional table of contents.
//!
//! ```
//! use mdsite_render::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let doc = pipeline.render("[[toc]]\n\n# Setup\n\n## Setup\n")?;
//! assert_eq!(doc.slugs().collect::<Vec<_>>(), ["setup", "setup-1"]);
//! assert!(doc.html.starts_with(r#"<div class="table-of-contents">"#));
//! # Ok::<(), mdsite_core::SiteError>(())
//! ```

/// Pipeline configuration and loaders.
pub mod config;
/// Pipeline composition and batch rendering.
pub mod pipeline;
/// Markdown to HTML emission.
pub mod renderer;
/// HTML post-processing stages.
pub mod transform;
/// Shared output types.
pub mod types;

pub use config::PipelineConfig;
pub use pipeline::{
    BatchInput, BatchOptions, BatchProcessingResult, BatchResult, BatchStats, HtmlTransform,
    Pipeline,
};
pub use renderer::{RenderOptions, render};
pub use transform::{
    AnchorOptions, ListType, Placement, TocEntry, TocOptions, build_toc, decorate, inject,
};
pub use types::{Heading, HeadingLevels, RenderedDocument};
