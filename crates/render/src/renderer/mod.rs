//! MDAST-based Markdown to HTML renderer.
//!
//! Converts markdown input into an HTML fragment. Headings are emitted as
//! plain `<hN>` elements; anchors and identifiers are added afterwards by
//! [`crate::transform::anchor`].
//!
//! # Module Structure
//!
//! - `context` - Rendering context for tracking state during traversal
//! - `render` - AST node rendering functions

mod context;
mod render;

use context::Context;

use markdown::mdast::Node;
use mdsite_core::{MarkdownParser, ParseOptions};
use render::render_node;
use serde::{Deserialize, Serialize};

/// Rendering options for the markdown renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Whether embedded HTML passes through unescaped.
    #[serde(rename = "allowRawHtml")]
    pub allow_raw_html: bool,
    /// Whether single line breaks inside paragraphs become `<br />`.
    #[serde(rename = "softBreakAsNewline")]
    pub soft_break_as_newline: bool,
    /// Whether bare URLs and e-mail addresses become links.
    #[serde(rename = "autoLinkUrls")]
    pub autolink_urls: bool,
}

impl RenderOptions {
    /// CommonMark-strict rendering: raw HTML escaped, soft breaks kept, no bare-URL links.
    pub const fn strict() -> Self {
        Self {
            allow_raw_html: false,
            soft_break_as_newline: false,
            autolink_urls: false,
        }
    }

    /// The site preset: raw HTML, soft breaks as `<br />`, bare-URL links.
    pub const fn site() -> Self {
        Self {
            allow_raw_html: true,
            soft_break_as_newline: true,
            autolink_urls: true,
        }
    }

    /// Parser constructs implied by these options.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            raw_html: self.allow_raw_html,
            autolink_literals: self.autolink_urls,
            ..ParseOptions::markdown()
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::strict()
    }
}

/// Converts Markdown input to HTML (entry point).
///
/// Never fails: markdown degrades to literal text, and a parser error falls
/// back to a single escaped paragraph.
///
/// # Examples
///
/// ```
/// use mdsite_render::renderer::{render, RenderOptions};
///
/// let html = render("# Hello\n\nSee https://example.com", &RenderOptions::site());
/// assert!(html.starts_with("<h1>Hello</h1>"));
/// assert!(html.contains(r#"<a href="https://example.com">"#));
/// ```
pub fn render(source: &str, options: &RenderOptions) -> String {
    let parser = MarkdownParser::new(options.parse_options());
    render_with_parser(source, options, &parser)
}

/// Renders with a caller-provided parser (which may carry text/AST transforms).
pub fn render_with_parser(
    source: &str,
    options: &RenderOptions,
    parser: &MarkdownParser,
) -> String {
    match parser.parse(source) {
        Ok(tree) => render_tree(&tree, options),
        Err(err) => {
            log::warn!("Markdown parse failed, rendering source as literal text: {}", err);
            literal_fallback(source)
        }
    }
}

/// Renders an already-parsed MDAST tree.
pub fn render_tree(tree: &Node, options: &RenderOptions) -> String {
    let mut ctx = Context::new(options);
    ctx.collect_definitions(tree);
    render_node(tree, &mut ctx);
    ctx.finish()
}

fn literal_fallback(source: &str) -> String {
    if source.trim().is_empty() {
        return String::new();
    }
    format!("<p>{}</p>\n", html_escape::encode_text(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(input: &str) -> String {
        render(input, &RenderOptions::strict())
    }

    fn site(input: &str) -> String {
        render(input, &RenderOptions::site())
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(strict(""), "");
        assert_eq!(site("\n\n"), "");
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(strict("This is a paragraph."), "<p>This is a paragraph.</p>\n");
    }

    #[test]
    fn test_headings_are_plain() {
        assert_eq!(
            strict("# Title\n\n## Section\n"),
            "<h1>Title</h1>\n<h2>Section</h2>\n"
        );
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            strict("Some **bold**, *em*, `co<de>` and ~~gone~~."),
            "<p>Some <strong>bold</strong>, <em>em</em>, <code>co&lt;de&gt;</code> and <del>gone</del>.</p>\n"
        );
    }

    #[test]
    fn test_link_with_title() {
        assert_eq!(
            strict(r#"[Rust](https://www.rust-lang.org/ "The & language")"#),
            "<p><a href=\"https://www.rust-lang.org/\" title=\"The &amp; language\">Rust</a></p>\n"
        );
    }

    #[test]
    fn test_script_links_render_as_text() {
        assert_eq!(strict("[x](javascript:alert(1))"), "<p>x</p>\n");
        assert_eq!(strict("[x](JavaScript:alert(1))"), "<p>x</p>\n");
        assert_eq!(strict("[x](vbscript:msgbox)"), "<p>x</p>\n");
        assert_eq!(strict("[x](file:///etc/passwd)"), "<p>x</p>\n");
        assert_eq!(
            strict("[x][evil]\n\n[evil]: javascript:void(0)\n"),
            "<p>x</p>\n"
        );
    }

    #[test]
    fn test_data_urls_only_for_raster_images() {
        assert_eq!(
            strict("![dot](data:image/png;base64,iVBORw0KGgo=)"),
            "<p><img src=\"data:image/png;base64,iVBORw0KGgo=\" alt=\"dot\" /></p>\n"
        );
        assert_eq!(
            strict("![page](data:text/html;base64,PHNjcmlwdD4=)"),
            "<p>page</p>\n"
        );
        assert_eq!(
            strict("![svg][s]\n\n[s]: data:image/svg+xml;base64,PHN2Zz4=\n"),
            "<p>svg</p>\n"
        );
        assert_eq!(strict("[x](data:text/html,hi)"), "<p>x</p>\n");
    }

    #[test]
    fn test_reference_definitions_resolve() {
        let html = strict("See [the docs][docs] and ![logo][img].\n\n[docs]: /docs\n[img]: /logo.png \"Logo\"\n");
        assert_eq!(
            html,
            "<p>See <a href=\"/docs\">the docs</a> and <img src=\"/logo.png\" alt=\"logo\" title=\"Logo\" />.</p>\n"
        );
    }

    #[test]
    fn test_raw_html_passthrough() {
        let input = "<div class=\"note\">Hello</div>\n\nText with <span>inline</span> html.";
        assert_eq!(
            site(input),
            "<div class=\"note\">Hello</div>\n<p>Text with <span>inline</span> html.</p>\n"
        );
    }

    #[test]
    fn test_raw_html_escaped_when_disabled() {
        let input = "<div class=\"note\">Hello</div>\n";
        assert_eq!(
            strict(input),
            "<p>&lt;div class=\"note\"&gt;Hello&lt;/div&gt;</p>\n"
        );
    }

    #[test]
    fn test_soft_breaks() {
        let input = "first line\nsecond line";
        assert_eq!(strict(input), "<p>first line\nsecond line</p>\n");
        assert_eq!(site(input), "<p>first line<br />\nsecond line</p>\n");
    }

    #[test]
    fn test_hard_break_always_renders() {
        assert_eq!(strict("a\\\nb"), "<p>a<br />\nb</p>\n");
    }

    #[test]
    fn test_bare_urls() {
        let input = "Visit https://example.com today.";
        assert_eq!(strict(input), "<p>Visit https://example.com today.</p>\n");
        assert_eq!(
            site(input),
            "<p>Visit <a href=\"https://example.com\">https://example.com</a> today.</p>\n"
        );
    }

    #[test]
    fn test_angle_autolink_without_linkify() {
        assert_eq!(
            strict("<https://example.com>"),
            "<p><a href=\"https://example.com\">https://example.com</a></p>\n"
        );
    }

    #[test]
    fn test_tight_and_loose_lists() {
        assert_eq!(
            strict("- one\n- two\n"),
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n"
        );
        assert_eq!(
            strict("1. one\n\n2. two\n"),
            "<ol>\n<li>\n<p>one</p>\n</li>\n<li>\n<p>two</p>\n</li>\n</ol>\n"
        );
        assert_eq!(
            strict("3. three\n4. four\n"),
            "<ol start=\"3\">\n<li>three</li>\n<li>four</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_fenced_code() {
        assert_eq!(
            strict("```rust\nfn main() {}\n```\n"),
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n"
        );
        assert_eq!(strict("```\n```\n"), "<pre><code></code></pre>\n");
    }

    #[test]
    fn test_blockquote_and_rule() {
        assert_eq!(
            strict("> quoted\n\n---\n"),
            "<blockquote>\n<p>quoted</p>\n</blockquote>\n<hr />\n"
        );
    }

    #[test]
    fn test_table() {
        let input = "| a | b |\n|:--|--:|\n| 1 | 2 |\n";
        assert_eq!(
            strict(input),
            "<table>\n<thead>\n<tr>\n<th style=\"text-align: left\">a</th>\n<th style=\"text-align: right\">b</th>\n</tr>\n</thead>\n<tbody>\n<tr>\n<td style=\"text-align: left\">1</td>\n<td style=\"text-align: right\">2</td>\n</tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn test_toc_marker_renders_as_paragraph() {
        assert_eq!(strict("[[toc]]"), "<p>[[toc]]</p>\n");
    }

    #[test]
    fn test_unclosed_markup_degrades_to_text() {
        assert_eq!(strict("**not closed"), "<p>**not closed</p>\n");
        assert_eq!(strict("[dangling]"), "<p>[dangling]</p>\n");
    }

    #[test]
    fn test_literal_fallback_escapes() {
        assert_eq!(literal_fallback("<b>x</b>"), "<p>&lt;b&gt;x&lt;/b&gt;</p>\n");
        assert_eq!(literal_fallback("  "), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let input = "# A\n\ntext https://x.org\n\n- [ ] item\n";
        assert_eq!(site(input), site(input));
    }
}
