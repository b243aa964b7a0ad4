//! The rendering pipeline and parallel batch rendering.
//!
//! A [`Pipeline`] is built once from a [`PipelineConfig`] and reused for every
//! document. Each render runs, in order:
//!
//! 1. text transforms
//! 2. markdown parsing
//! 3. AST transforms
//! 4. HTML emission
//! 5. heading decoration
//! 6. table-of-contents injection (when enabled)
//! 7. HTML transforms

use crate::config::PipelineConfig;
use crate::renderer::render_with_parser;
use crate::transform::{anchor, toc};
use crate::types::{Heading, RenderedDocument};
use mdsite_core::{AstTransform, MarkdownParser, SiteError, TextTransform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// A stage that rewrites the final HTML (e.g. a syntax highlighter).
pub trait HtmlTransform: Send + Sync {
    /// Rewrites `html`; `headings` are the decorated headings of the document.
    fn transform(&self, html: String, headings: &[Heading]) -> String;
}

impl<F> HtmlTransform for F
where
    F: Fn(String, &[Heading]) -> String + Send + Sync,
{
    fn transform(&self, html: String, headings: &[Heading]) -> String {
        self(html, headings)
    }
}

/// Configured rendering pipeline. Cheap to share across threads.
pub struct Pipeline {
    config: PipelineConfig,
    parser: MarkdownParser,
    html_transforms: Vec<Box<dyn HtmlTransform>>,
}

impl Pipeline {
    /// Builds a pipeline, validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, SiteError> {
        config.validate()?;
        let mut parser = MarkdownParser::new(config.markdown.parse_options());
        if let Some(options) = &config.toc {
            parser.add_text_transform(toc::MarkerScanner::new(options.marker.clone()));
        }
        Ok(Self {
            config,
            parser,
            html_transforms: Vec::new(),
        })
    }

    /// The configuration this pipeline was built from.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Adds a transform applied to the markdown source before parsing.
    pub fn add_text_transform<T: TextTransform + 'static>(&mut self, transform: T) -> &mut Self {
        self.parser.add_text_transform(transform);
        self
    }

    /// Adds a transform applied to the parsed tree before HTML emission.
    pub fn add_ast_transform<T: AstTransform + 'static>(&mut self, transform: T) -> &mut Self {
        self.parser.add_ast_transform(transform);
        self
    }

    /// Adds a transform applied to the finished HTML.
    pub fn add_html_transform<T: HtmlTransform + 'static>(&mut self, transform: T) -> &mut Self {
        self.html_transforms.push(Box::new(transform));
        self
    }

    /// Renders one document.
    ///
    /// Malformed markdown never fails; only the HTML rewriter can.
    pub fn render(&self, source: &str) -> Result<RenderedDocument, SiteError> {
        let html = render_with_parser(source, &self.config.markdown, &self.parser);
        let (html, headings) = anchor::decorate(&html, &self.config.anchor)?;

        let (mut html, toc_html) = match &self.config.toc {
            Some(options) => toc::inject_block(&html, &headings, options),
            None => (html, None),
        };

        for transform in &self.html_transforms {
            html = transform.transform(html, &headings);
        }

        Ok(RenderedDocument {
            html,
            headings,
            toc: toc_html,
        })
    }

    /// Renders many documents in parallel.
    pub fn render_batch(
        &self,
        inputs: Vec<BatchInput>,
        options: &BatchOptions,
    ) -> BatchProcessingResult {
        let start = Instant::now();

        let pool = match options.max_threads {
            Some(max_threads) if max_threads > 0 => rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build()
                .map_err(|err| log::warn!("Falling back to the global thread pool: {}", err))
                .ok(),
            _ => None,
        };

        let total = inputs.len() as u32;
        let succeeded = AtomicU32::new(0);
        let failed = AtomicU32::new(0);

        let process_input = |input: BatchInput| -> BatchResult {
            match self.render(&input.source) {
                Ok(document) => {
                    succeeded.fetch_add(1, Ordering::Relaxed);
                    BatchResult {
                        id: input.id,
                        document: Some(document),
                        error: None,
                    }
                }
                Err(err) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    log::warn!("Failed to render {}: {}", input.id, err);
                    BatchResult {
                        id: input.id,
                        document: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        };

        let results: Vec<BatchResult> = if options.continue_on_error {
            match &pool {
                Some(pool) => pool.install(|| inputs.into_par_iter().map(process_input).collect()),
                None => inputs.into_par_iter().map(process_input).collect(),
            }
        } else {
            // Sequential so that nothing after the first failure is rendered.
            let mut results = Vec::with_capacity(inputs.len());
            for input in inputs {
                let result = process_input(input);
                let stop = result.error.is_some();
                results.push(result);
                if stop {
                    break;
                }
            }
            results
        };

        let elapsed = start.elapsed();
        log::debug!("Rendered {} document(s) in {:?}", results.len(), elapsed);

        BatchProcessingResult {
            results,
            stats: BatchStats {
                total,
                succeeded: succeeded.load(Ordering::Relaxed),
                failed: failed.load(Ordering::Relaxed),
                processing_time_ms: elapsed.as_secs_f64() * 1000.0,
            },
        }
    }
}

/// A single document to render in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInput {
    /// Document identifier (typically the file path).
    pub id: String,
    /// Markdown source.
    pub source: String,
}

/// Result for a single document in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Identifier matching the input.
    pub id: String,
    /// Rendered document (present on success).
    pub document: Option<RenderedDocument>,
    /// Error message (present on failure).
    pub error: Option<String>,
}

/// Statistics for batch processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// Number of documents submitted.
    pub total: u32,
    /// Number of documents rendered.
    pub succeeded: u32,
    /// Number of documents that failed.
    pub failed: u32,
    /// Wall-clock time in milliseconds.
    pub processing_time_ms: f64,
}

/// Options for batch processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchOptions {
    /// Maximum worker threads; `None` uses the global rayon pool.
    pub max_threads: Option<usize>,
    /// Keep going after a failed document. When false, documents are
    /// rendered in order and the batch stops at the first failure.
    pub continue_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_threads: None,
            continue_on_error: true,
        }
    }
}

/// All results of a batch plus statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProcessingResult {
    /// One result per processed input, in input order.
    pub results: Vec<BatchResult>,
    /// Processing statistics.
    pub stats: BatchStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TocOptions;

    fn site() -> Pipeline {
        Pipeline::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn renders_headings_with_anchors_and_toc() {
        let doc = site().render("[[toc]]\n\n# Intro\n\n## Usage\n").unwrap();
        assert_eq!(doc.slugs().collect::<Vec<_>>(), vec!["intro", "usage"]);
        assert!(doc.html.starts_with("<div class=\"table-of-contents\">"));
        assert!(doc.html.contains(
            "<h2 id=\"usage\">Usage <a class=\"direct-link\" href=\"#usage\" aria-hidden=\"true\">#</a></h2>"
        ));
        assert!(!doc.html.contains("[[toc]]"));
        assert!(doc.toc.is_some());
    }

    #[test]
    fn toc_without_marker_is_returned_but_not_inserted() {
        let doc = site().render("# Only\n").unwrap();
        assert!(doc.toc.is_some());
        assert!(!doc.html.contains("table-of-contents"));
    }

    #[test]
    fn disabled_toc_leaves_marker_text() {
        let config = PipelineConfig {
            toc: None,
            ..PipelineConfig::default()
        };
        let doc = Pipeline::new(config).unwrap().render("[[toc]]\n\n# A\n").unwrap();
        assert!(doc.html.starts_with("<p>[[toc]]</p>\n"));
        assert_eq!(doc.toc, None);
    }

    #[test]
    fn marker_followed_by_paragraph_text_is_injected() {
        let doc = site().render("[[toc]]\nIntro line.\n\n# A\n").unwrap();
        let block = doc.toc.as_deref().unwrap();
        assert!(doc.html.starts_with(&format!("{}\n<p>Intro line.</p>\n", block)));
        assert!(!doc.html.contains("[[toc]]"));
    }

    #[test]
    fn marker_in_fenced_code_is_rendered_as_code() {
        let doc = site().render("```\n[[toc]]\n```\n\n# A\n").unwrap();
        assert!(doc.html.starts_with("<pre><code>[[toc]]\n</code></pre>\n"));
        assert!(!doc.html.contains("table-of-contents"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            toc: Some(TocOptions {
                marker: String::new(),
                ..TocOptions::default()
            }),
            ..PipelineConfig::default()
        };
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn html_transforms_run_last_in_order() {
        let mut pipeline = site();
        pipeline
            .add_html_transform(|html: String, headings: &[Heading]| {
                format!("{}<!-- {} -->", html, headings.len())
            })
            .add_html_transform(|html: String, _: &[Heading]| html.replace("<!--", "<!-- n:"));
        let doc = pipeline.render("# A\n").unwrap();
        assert!(doc.html.ends_with("<!-- n: 1 -->"));
    }

    #[test]
    fn batch_renders_every_input_in_order() {
        let inputs: Vec<BatchInput> = (0..8)
            .map(|i| BatchInput {
                id: format!("doc-{}.md", i),
                source: format!("# Setup\n\n## Setup\n\ntext {}\n", i),
            })
            .collect();
        let options = BatchOptions {
            max_threads: Some(2),
            ..BatchOptions::default()
        };

        let batch = site().render_batch(inputs, &options);
        assert_eq!(batch.stats.total, 8);
        assert_eq!(batch.stats.succeeded, 8);
        assert_eq!(batch.stats.failed, 0);
        assert_eq!(batch.results[3].id, "doc-3.md");
        for result in &batch.results {
            let doc = result.document.as_ref().unwrap();
            assert_eq!(doc.slugs().collect::<Vec<_>>(), vec!["setup", "setup-1"]);
        }
    }

    #[test]
    fn batch_stats_serialize_in_camel_case() {
        let batch = site().render_batch(Vec::new(), &BatchOptions::default());
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["stats"]["total"], 0);
        assert!(json["stats"].get("processingTimeMs").is_some());
    }
}
