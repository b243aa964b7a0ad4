//! Table of contents built from decorated headings.

use crate::types::{Heading, HeadingLevels};
use mdsite_core::{ConfigurationError, TextTransform};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// List element used for every level of the table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ListType {
    /// `<ul>`
    #[default]
    Ul,
    /// `<ol>`
    Ol,
}

impl ListType {
    /// Tag name of the list element.
    pub fn tag(&self) -> &'static str {
        match self {
            ListType::Ul => "ul",
            ListType::Ol => "ol",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ListType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ul" => Ok(ListType::Ul),
            "ol" => Ok(ListType::Ol),
            other => Err(ConfigurationError::new("toc.listType", other, "ul, ol")),
        }
    }
}

impl TryFrom<String> for ListType {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ListType> for String {
    fn from(list_type: ListType) -> Self {
        list_type.tag().to_string()
    }
}

/// Options for the table-of-contents injector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TocOptions {
    /// Markup placed inside the container, before the list.
    pub header_html: String,
    /// CSS class of the container `<div>`.
    pub container_class: String,
    /// Paragraph text that marks where the table of contents goes.
    pub marker: String,
    /// List element for every nesting level.
    pub list_type: ListType,
    /// Restricts the listed headings; `None` lists every decorated heading.
    pub include_levels: Option<HeadingLevels>,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            header_html: "<h2>Table of Contents</h2>".to_string(),
            container_class: "table-of-contents".to_string(),
            marker: "[[toc]]".to_string(),
            list_type: ListType::Ul,
            include_levels: None,
        }
    }
}

impl TocOptions {
    /// Checks the options that types alone cannot enforce.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.marker.trim().is_empty() {
            return Err(ConfigurationError::new(
                "toc.marker",
                self.marker.clone(),
                "any non-blank text",
            ));
        }
        Ok(())
    }

    fn includes(&self, heading: &Heading) -> bool {
        self.include_levels
            .as_ref()
            .is_none_or(|levels| levels.contains(heading.level))
    }
}

/// One node of the table-of-contents tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// The heading this entry links to.
    pub heading: Heading,
    /// Entries nested under this one.
    pub children: Vec<TocEntry>,
}

/// Nests headings by level.
///
/// A deeper heading becomes a child of the previous one (one step, however
/// large the level gap); an equal or shallower heading closes entries until
/// it finds a shallower parent.
pub fn build_toc(headings: &[Heading]) -> Vec<TocEntry> {
    let mut roots: Vec<TocEntry> = Vec::new();
    let mut stack: Vec<TocEntry> = Vec::new();

    for heading in headings {
        while stack
            .last()
            .is_some_and(|open| open.heading.level >= heading.level)
        {
            close_top(&mut stack, &mut roots);
        }
        stack.push(TocEntry {
            heading: heading.clone(),
            children: Vec::new(),
        });
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }
    roots
}

fn close_top(stack: &mut Vec<TocEntry>, roots: &mut Vec<TocEntry>) {
    if let Some(entry) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(entry),
            None => roots.push(entry),
        }
    }
}

/// Renders a tree as the full table-of-contents block.
pub fn render_toc(entries: &[TocEntry], options: &TocOptions) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"");
    html.push_str(&html_escape::encode_double_quoted_attribute(
        &options.container_class,
    ));
    html.push_str("\">");
    html.push_str(&options.header_html);
    render_list(entries, options.list_type, &mut html);
    html.push_str("</div>");
    html
}

fn render_list(entries: &[TocEntry], list_type: ListType, html: &mut String) {
    let tag = list_type.tag();
    html.push('<');
    html.push_str(tag);
    html.push('>');
    for entry in entries {
        html.push_str("<li><a href=\"#");
        html.push_str(&html_escape::encode_double_quoted_attribute(
            &entry.heading.slug,
        ));
        html.push_str("\">");
        html.push_str(&html_escape::encode_text(&entry.heading.text));
        html.push_str("</a>");
        if !entry.children.is_empty() {
            render_list(&entry.children, list_type, html);
        }
        html.push_str("</li>");
    }
    html.push_str("</");
    html.push_str(tag);
    html.push('>');
}

/// Builds the block for `headings`, or `None` when nothing would be listed.
pub fn toc_block(headings: &[Heading], options: &TocOptions) -> Option<String> {
    let listed: Vec<Heading> = headings
        .iter()
        .filter(|heading| options.includes(heading))
        .cloned()
        .collect();
    if listed.is_empty() {
        return None;
    }
    Some(render_toc(&build_toc(&listed), options))
}

/// Paragraph text that stands in for a marker between parsing and injection.
const PLACEHOLDER: &str = "%%mdsite-toc%%";

/// Finds markers in markdown source before it is parsed.
///
/// A marker counts when it is alone on a line outside code blocks, matched
/// ASCII case-insensitively. The line becomes a placeholder paragraph of its
/// own, so lines after it start a new paragraph. Matching the source means a
/// marker that markdown would otherwise rewrite (an HTML comment, `*toc*`)
/// still works.
pub fn mark_markers<'a>(source: &'a str, marker: &str) -> Cow<'a, str> {
    let marker = marker.trim();
    if marker.is_empty() {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len() + PLACEHOLDER.len());
    let mut fence: Option<(char, usize)> = None;
    let mut previous_blank = true;
    let mut changed = false;

    for line in source.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some((ch, len, rest)) = fence_run(content) {
            fence = match fence {
                None => Some((ch, len)),
                Some((open, open_len))
                    if open == ch && len >= open_len && rest.trim().is_empty() =>
                {
                    None
                }
                still_open => still_open,
            };
            out.push_str(line);
            previous_blank = false;
            continue;
        }

        let indent = content.len() - content.trim_start().len();
        if fence.is_some() || indent > 3 || !content.trim().eq_ignore_ascii_case(marker) {
            out.push_str(line);
            previous_blank = content.trim().is_empty();
            continue;
        }

        if !previous_blank {
            out.push('\n');
        }
        out.push_str(PLACEHOLDER);
        out.push_str("\n\n");
        previous_blank = true;
        changed = true;
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(source)
    }
}

/// Returns the fence character, run length and trailing text of a code fence line.
fn fence_run(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next().filter(|ch| matches!(ch, '`' | '~'))?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then(|| (ch, len, &trimmed[len..]))
}

/// Source rewrite that runs [`mark_markers`] ahead of parsing.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    marker: String,
}

impl MarkerScanner {
    /// Scans for `marker`.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl TextTransform for MarkerScanner {
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str> {
        mark_markers(input, &self.marker)
    }
}

/// Replaces every paragraph consisting of `marker` in `html` with `replacement`.
///
/// The marker matches ASCII case-insensitively; a newline right after the
/// paragraph is consumed along with it. Returns the rewritten HTML and the
/// number of paragraphs replaced.
pub fn replace_marker(html: &str, marker: &str, replacement: &str) -> (String, usize) {
    let needle = format!("<p>{}</p>", html_escape::encode_text(marker)).to_ascii_lowercase();
    let haystack = html.to_ascii_lowercase();

    let mut out = String::with_capacity(html.len() + replacement.len());
    let mut cursor = 0;
    let mut count = 0;

    while let Some(found) = haystack[cursor..].find(&needle) {
        let start = cursor + found;
        let mut end = start + needle.len();
        if html[end..].starts_with('\n') {
            end += 1;
        }
        out.push_str(&html[cursor..start]);
        out.push_str(replacement);
        cursor = end;
        count += 1;
    }
    out.push_str(&html[cursor..]);
    (out, count)
}

/// Substitutes the table of contents and returns it alongside the HTML.
///
/// Placeholders left by [`mark_markers`] are replaced, as are paragraphs
/// holding the literal marker (HTML rendered without the scanner). Without
/// headings these paragraphs are removed; without any of them the HTML is
/// returned unchanged and the block only comes back as the second value.
pub fn inject_block(
    html: &str,
    headings: &[Heading],
    options: &TocOptions,
) -> (String, Option<String>) {
    let block = toc_block(headings, options);
    let replacement = block
        .as_deref()
        .map(|block| format!("{}\n", block))
        .unwrap_or_default();

    let (html, placed) = replace_marker(html, PLACEHOLDER, &replacement);
    let (html, literal) = replace_marker(&html, &options.marker, &replacement);
    if placed + literal == 0 && block.is_some() {
        log::debug!("No table of contents marker; block left out of the HTML");
    } else {
        log::debug!("Replaced {} table of contents marker(s)", placed + literal);
    }
    (html, block)
}

/// Substitutes the table of contents at each marker of `html`.
pub fn inject(html: &str, headings: &[Heading], options: &TocOptions) -> String {
    inject_block(html, headings, options).0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, text: &str) -> Heading {
        Heading {
            level,
            text: text.to_string(),
            slug: mdsite_core::slugify(text),
        }
    }

    fn shape(entries: &[TocEntry]) -> String {
        entries
            .iter()
            .map(|entry| {
                if entry.children.is_empty() {
                    entry.heading.level.to_string()
                } else {
                    format!("{}[{}]", entry.heading.level, shape(&entry.children))
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn nests_by_level() {
        let headings = [
            heading(1, "A"),
            heading(2, "B"),
            heading(2, "C"),
            heading(3, "D"),
            heading(1, "E"),
        ];
        let tree = build_toc(&headings);
        assert_eq!(shape(&tree), "1[2,2[3]],1");
        assert_eq!(tree[0].children[1].children[0].heading.text, "D");
    }

    #[test]
    fn level_gaps_nest_one_step() {
        let tree = build_toc(&[heading(1, "A"), heading(4, "B"), heading(2, "C")]);
        assert_eq!(shape(&tree), "1[4,2]");
    }

    #[test]
    fn document_may_start_deep() {
        let tree = build_toc(&[heading(3, "A"), heading(2, "B"), heading(3, "C")]);
        assert_eq!(shape(&tree), "3,2[3]");
    }

    #[test]
    fn renders_nested_block() {
        let block = toc_block(
            &[heading(2, "Intro"), heading(3, "Fish & Chips"), heading(2, "End")],
            &TocOptions::default(),
        )
        .unwrap();
        insta::assert_snapshot!(block, @r##"<div class="table-of-contents"><h2>Table of Contents</h2><ul><li><a href="#intro">Intro</a><ul><li><a href="#fish-chips">Fish &amp; Chips</a></li></ul></li><li><a href="#end">End</a></li></ul></div>"##);
    }

    #[test]
    fn renders_ordered_lists_and_filters_levels() {
        let options = TocOptions {
            list_type: ListType::Ol,
            include_levels: Some(HeadingLevels::new([2]).unwrap()),
            header_html: String::new(),
            ..TocOptions::default()
        };
        let block = toc_block(&[heading(1, "Title"), heading(2, "Usage")], &options).unwrap();
        insta::assert_snapshot!(block, @r##"<div class="table-of-contents"><ol><li><a href="#usage">Usage</a></li></ol></div>"##);
    }

    #[test]
    fn no_listed_headings_means_no_block() {
        assert_eq!(toc_block(&[], &TocOptions::default()), None);

        let options = TocOptions {
            include_levels: Some(HeadingLevels::new([6]).unwrap()),
            ..TocOptions::default()
        };
        assert_eq!(toc_block(&[heading(1, "A")], &options), None);
    }

    #[test]
    fn replaces_every_marker_case_insensitively() {
        let html = "<p>[[toc]]</p>\n<p>body</p>\n<p>[[TOC]]</p>\n";
        let (out, count) = replace_marker(html, "[[toc]]", "X\n");
        assert_eq!(count, 2);
        assert_eq!(out, "X\n<p>body</p>\nX\n");
    }

    #[test]
    fn marker_inside_text_is_not_replaced() {
        let html = "<p>see [[toc]] here</p>\n";
        let (out, count) = replace_marker(html, "[[toc]]", "X");
        assert_eq!(count, 0);
        assert_eq!(out, html);
    }

    #[test]
    fn inject_without_headings_drops_marker() {
        let out = inject("<p>[[toc]]</p>\n<p>text</p>\n", &[], &TocOptions::default());
        assert_eq!(out, "<p>text</p>\n");
    }

    #[test]
    fn inject_without_marker_is_identity() {
        let html = "<h1 id=\"a\">A</h1>\n";
        assert_eq!(inject(html, &[heading(1, "A")], &TocOptions::default()), html);
    }

    #[test]
    fn marker_line_is_split_from_its_paragraph() {
        let out = mark_markers("[[toc]]\nIntro line.\n\n# A\n", "[[toc]]");
        assert_eq!(out, "%%mdsite-toc%%\n\nIntro line.\n\n# A\n");

        let out = mark_markers("Before.\n[[TOC]]\n", "[[toc]]");
        assert_eq!(out, "Before.\n\n%%mdsite-toc%%\n\n");
    }

    #[test]
    fn markers_in_code_blocks_are_kept() {
        let source = "```md\n[[toc]]\n```\n\n~~~~\n[[toc]]\n~~~\n[[toc]]\n~~~~\n\n    [[toc]]\n";
        assert!(matches!(mark_markers(source, "[[toc]]"), Cow::Borrowed(_)));
    }

    #[test]
    fn source_without_marker_is_borrowed() {
        let source = "# A\n\nsee [[toc]] here\n";
        assert!(matches!(mark_markers(source, "[[toc]]"), Cow::Borrowed(_)));
    }

    #[test]
    fn placeholder_and_literal_marker_are_both_replaced() {
        let html = "<p>%%mdsite-toc%%</p>\n<p>[[toc]]</p>\n<h1 id=\"a\">A</h1>\n";
        let (out, block) = inject_block(html, &[heading(1, "A")], &TocOptions::default());
        let block = block.unwrap();
        assert_eq!(out, format!("{block}\n{block}\n<h1 id=\"a\">A</h1>\n"));
    }

    #[test]
    fn blank_marker_is_rejected() {
        let options = TocOptions {
            marker: "  ".into(),
            ..TocOptions::default()
        };
        let err = options.validate().unwrap_err();
        assert_eq!(err.option, "toc.marker");
        assert!(TocOptions::default().validate().is_ok());
    }

    #[test]
    fn list_type_rejects_unknown_values() {
        let err = serde_json::from_str::<TocOptions>(r#"{"listType": "dl"}"#).unwrap_err();
        assert!(err.to_string().contains("option `toc.listType`"), "{err}");
    }
}
