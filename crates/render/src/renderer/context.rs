//! Rendering context for the markdown renderer.

use super::RenderOptions;
use markdown::mdast::Node;
use std::collections::HashMap;

/// The kind of block currently being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Document root - not inside any specific block element.
    Root,
    /// Inside a paragraph element (`<p>`).
    Paragraph,
    /// Inside a list element (`<ul>` or `<ol>`).
    List {
        /// Loose lists wrap item content in `<p>`.
        loose: bool,
    },
    /// Inside a blockquote.
    Blockquote,
    /// Inside a heading or table cell: inline content without `<p>`.
    Phrasing,
}

/// Target of a link reference definition (`[label]: url "title"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Destination URL.
    pub url: String,
    /// Optional title.
    pub title: Option<String>,
}

/// Manages the current rendering state.
///
/// Holds the output buffer, the stack of open block scopes and the link
/// reference definitions collected before rendering starts.
pub struct Context<'a> {
    html: String,
    stack: Vec<Scope>,
    options: &'a RenderOptions,
    definitions: HashMap<String, LinkTarget>,
}

impl<'a> Context<'a> {
    /// Creates a new context.
    pub fn new(options: &'a RenderOptions) -> Self {
        Self {
            html: String::with_capacity(4096),
            stack: vec![Scope::Root],
            options,
            definitions: HashMap::new(),
        }
    }

    /// Records every link reference definition in the tree.
    ///
    /// The first definition of an identifier wins.
    pub fn collect_definitions(&mut self, node: &Node) {
        if let Node::Definition(definition) = node {
            self.definitions
                .entry(definition.identifier.clone())
                .or_insert_with(|| LinkTarget {
                    url: definition.url.clone(),
                    title: definition.title.clone(),
                });
        }
        if let Some(children) = node.children() {
            for child in children {
                self.collect_definitions(child);
            }
        }
    }

    /// Looks up a link reference definition by normalized identifier.
    pub fn resolve(&self, identifier: &str) -> Option<&LinkTarget> {
        self.definitions.get(identifier)
    }

    /// Writes a raw string to the buffer without escaping (for safe HTML tags).
    pub fn push_raw(&mut self, s: &str) {
        self.html.push_str(s);
    }

    /// Writes text content to the buffer with HTML escaping.
    pub fn push_text(&mut self, s: &str) {
        self.html.push_str(&html_escape::encode_text(s));
    }

    /// Writes an HTML-escaped attribute value to the buffer.
    pub fn push_attr_value(&mut self, s: &str) {
        self.html
            .push_str(&html_escape::encode_double_quoted_attribute(s));
    }

    /// Writes ` name="value"` with the value escaped.
    pub fn push_attr(&mut self, name: &str, value: &str) {
        self.html.push(' ');
        self.html.push_str(name);
        self.html.push_str("=\"");
        self.push_attr_value(value);
        self.html.push('"');
    }

    /// Returns true if the buffer already ends with a newline (or is empty).
    pub fn at_line_start(&self) -> bool {
        self.html.is_empty() || self.html.ends_with('\n')
    }

    /// Returns a reference to the current scope at the top of the stack.
    pub fn current_scope(&self) -> Scope {
        self.stack.last().copied().unwrap_or(Scope::Root)
    }

    /// Returns true if the innermost list is tight.
    ///
    /// Tight lists render item paragraphs without `<p>` wrappers.
    pub fn is_in_tight_list(&self) -> bool {
        matches!(self.current_scope(), Scope::List { loose: false })
    }

    /// Returns true if currently inside a paragraph or other phrasing context.
    ///
    /// Raw HTML met here is inline and must not be followed by a line break.
    pub fn is_in_phrasing(&self) -> bool {
        matches!(self.current_scope(), Scope::Paragraph | Scope::Phrasing)
    }

    /// Enters a new scope by pushing it onto the stack.
    pub fn enter(&mut self, scope: Scope) {
        self.stack.push(scope);
    }

    /// Exits the current scope by popping from the stack.
    pub fn exit(&mut self) -> Option<Scope> {
        self.stack.pop()
    }

    /// Returns whether raw HTML passthrough is enabled.
    pub fn raw_html_allowed(&self) -> bool {
        self.options.allow_raw_html
    }

    /// Returns whether soft line breaks become `<br />`.
    pub fn soft_breaks_as_newline(&self) -> bool {
        self.options.soft_break_as_newline
    }

    /// Consumes the context and returns the rendered HTML.
    pub fn finish(self) -> String {
        self.html
    }
}
