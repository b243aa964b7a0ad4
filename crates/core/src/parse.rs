//! Markdown parsing on top of markdown-rs, with pre- and post-parse hooks.

use crate::{SiteError, SourceLocation};
use markdown::mdast::Node;
use markdown::message::{Message, Place};
use std::borrow::Cow;

/// Which markdown constructs the parser recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Embedded HTML becomes `Html` nodes instead of paragraph text.
    pub raw_html: bool,
    /// Bare URLs, `www.` hosts and e-mail addresses become links.
    pub autolink_literals: bool,
    /// GFM pipe tables.
    pub tables: bool,
    /// `~~strikethrough~~`.
    pub strikethrough: bool,
}

impl ParseOptions {
    /// CommonMark with tables and strikethrough.
    pub const fn markdown() -> Self {
        Self {
            raw_html: false,
            autolink_literals: false,
            tables: true,
            strikethrough: true,
        }
    }

    /// markdown-rs options for these constructs.
    ///
    /// Built on demand: markdown-rs options may hold non-`Send` hooks, so they
    /// are never stored.
    pub fn markdown_options(self) -> markdown::ParseOptions {
        markdown::ParseOptions {
            constructs: markdown::Constructs {
                html_flow: self.raw_html,
                html_text: self.raw_html,
                gfm_autolink_literal: self.autolink_literals,
                gfm_table: self.tables,
                gfm_strikethrough: self.strikethrough,
                ..markdown::Constructs::default()
            },
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::markdown()
    }
}

/// Rewrites markdown source before it is parsed.
pub trait TextTransform: Send + Sync {
    /// Returns the rewritten source, borrowing `input` when nothing changed.
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

impl<F> TextTransform for F
where
    F: for<'a> Fn(&'a str) -> Cow<'a, str> + Send + Sync,
{
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str> {
        self(input)
    }
}

/// Edits the syntax tree between parsing and HTML emission.
pub trait AstTransform: Send + Sync {
    /// Mutates `root` in place.
    fn transform(&self, root: &mut Node);
}

impl<F> AstTransform for F
where
    F: Fn(&mut Node) + Send + Sync,
{
    fn transform(&self, root: &mut Node) {
        self(root)
    }
}

/// A markdown parser with registered transforms, run in registration order.
pub struct MarkdownParser {
    options: ParseOptions,
    before: Vec<Box<dyn TextTransform>>,
    after: Vec<Box<dyn AstTransform>>,
}

impl MarkdownParser {
    /// Creates a parser without transforms.
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Registers a source rewrite.
    pub fn add_text_transform<T: TextTransform + 'static>(&mut self, transform: T) {
        self.before.push(Box::new(transform));
    }

    /// Registers a tree edit.
    pub fn add_ast_transform<T: AstTransform + 'static>(&mut self, transform: T) {
        self.after.push(Box::new(transform));
    }

    /// Runs the text transforms, parses, then runs the AST transforms.
    pub fn parse(&self, input: &str) -> Result<Node, SiteError> {
        let source = self
            .before
            .iter()
            .fold(Cow::Borrowed(input), |source, transform| {
                Cow::Owned(transform.transform(&source).into_owned())
            });

        let mut root = parse_mdast(&source, &self.options)?;
        for transform in &self.after {
            transform.transform(&mut root);
        }
        Ok(root)
    }
}

/// Parses markdown into an MDAST tree.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, SiteError> {
    markdown::to_mdast(input, &options.markdown_options()).map_err(|message| {
        let location = location_of(&message);
        SiteError::parse_error(message.reason, location.line, location.column)
    })
}

fn location_of(message: &Message) -> SourceLocation {
    let point = message.place.as_deref().map(|place| match place {
        Place::Point(point) => point,
        Place::Position(position) => &position.start,
    });
    point.map_or(SourceLocation::new(1, 1), |point| {
        SourceLocation::new(point.line, point.column)
    })
}
