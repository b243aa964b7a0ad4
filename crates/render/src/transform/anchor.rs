//! Heading anchors: unique `id` attributes plus a permalink glyph.
//!
//! Decoration runs in two passes over the rendered HTML. The first collects
//! every `h1`..`h6` with its text; slugs are then assigned in document order
//! through a fresh [`SlugRegistry`]; the second pass writes the `id` and the
//! permalink into each decorated heading.

use crate::types::{Heading, HeadingLevels};
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use mdsite_core::{ConfigurationError, SiteError, SlugRegistry};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::str::FromStr;

/// Position of the permalink glyph relative to the heading text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Placement {
    /// `<a …>#</a> Heading`
    Before,
    /// `Heading <a …>#</a>`
    #[default]
    After,
}

impl Placement {
    /// The configuration spelling of this placement.
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Before => "before",
            Placement::After => "after",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Placement::Before),
            "after" => Ok(Placement::After),
            other => Err(ConfigurationError::new("anchor.placement", other, "before, after")),
        }
    }
}

impl TryFrom<String> for Placement {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Placement> for String {
    fn from(placement: Placement) -> Self {
        placement.as_str().to_string()
    }
}

/// Options for the heading anchor decorator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct AnchorOptions {
    /// Heading levels that receive an id and a permalink.
    pub levels: HeadingLevels,
    /// Where the permalink goes relative to the heading text.
    pub placement: Placement,
    /// Permalink content, inserted as HTML.
    pub symbol: String,
    /// CSS class of the permalink; omitted when empty.
    pub class: String,
    /// Whether the permalink is hidden from assistive technology.
    pub aria_hidden: bool,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            levels: HeadingLevels::default(),
            placement: Placement::After,
            symbol: "#".to_string(),
            class: "direct-link".to_string(),
            aria_hidden: true,
        }
    }
}

impl AnchorOptions {
    /// Builds the permalink element for `slug`.
    pub fn permalink_html(&self, slug: &str) -> String {
        let mut html = String::from("<a");
        if !self.class.is_empty() {
            html.push_str(" class=\"");
            html.push_str(&html_escape::encode_double_quoted_attribute(&self.class));
            html.push('"');
        }
        html.push_str(" href=\"#");
        html.push_str(&html_escape::encode_double_quoted_attribute(slug));
        html.push('"');
        if self.aria_hidden {
            html.push_str(" aria-hidden=\"true\"");
        }
        html.push('>');
        html.push_str(&self.symbol);
        html.push_str("</a>");
        html
    }
}

/// A heading as found in the HTML, before slug assignment.
#[derive(Debug)]
struct FoundHeading {
    level: u8,
    id: Option<String>,
    text: String,
}

/// Decorates the headings of `html` and returns them in document order.
///
/// Only headings whose level is in `options.levels` are decorated and
/// reported. A heading that already has an `id` keeps it as its slug base.
pub fn decorate(html: &str, options: &AnchorOptions) -> Result<(String, Vec<Heading>), SiteError> {
    let found = collect_headings(html)?;

    let mut registry = SlugRegistry::new();
    let mut plan = Vec::with_capacity(found.len());
    let mut headings = Vec::new();

    for heading in found {
        if !options.levels.contains(heading.level) {
            if let Some(id) = heading.id {
                registry.register(id);
            }
            plan.push(None);
            continue;
        }

        let slug = match heading.id {
            Some(id) => registry.register(id),
            None => registry.next_slug(&heading.text),
        };
        plan.push(Some(slug.clone()));
        headings.push(Heading {
            level: heading.level,
            text: heading.text,
            slug,
        });
    }

    if headings.is_empty() {
        return Ok((html.to_string(), headings));
    }

    log::debug!("Decorating {} heading(s)", headings.len());
    let decorated = inject_anchors(html, &plan, options)?;
    Ok((decorated, headings))
}

fn collect_headings(html: &str) -> Result<Vec<FoundHeading>, SiteError> {
    let found: RefCell<Vec<FoundHeading>> = RefCell::new(Vec::new());
    let mut handlers = Vec::with_capacity(12);

    for level in 1..=6u8 {
        let found = &found;
        handlers.push(element!(format!("h{}", level), move |el| {
            found.borrow_mut().push(FoundHeading {
                level,
                id: el.get_attribute("id"),
                text: String::new(),
            });
            Ok(())
        }));
        handlers.push(text!(format!("h{}", level), move |chunk| {
            if let Some(heading) = found.borrow_mut().last_mut() {
                heading.text.push_str(chunk.as_str());
            }
            Ok(())
        }));
    }

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|err| SiteError::Rewrite(err.to_string()))?;

    let mut found = found.into_inner();
    for heading in &mut found {
        heading.text = html_escape::decode_html_entities(&heading.text)
            .trim()
            .to_string();
    }
    Ok(found)
}

fn inject_anchors(
    html: &str,
    plan: &[Option<String>],
    options: &AnchorOptions,
) -> Result<String, SiteError> {
    let cursor = Cell::new(0usize);
    let mut handlers = Vec::with_capacity(6);

    for level in 1..=6u8 {
        let cursor = &cursor;
        handlers.push(element!(format!("h{}", level), move |el| {
            let index = cursor.get();
            cursor.set(index + 1);

            if let Some(Some(slug)) = plan.get(index) {
                el.set_attribute("id", slug)?;
                let permalink = options.permalink_html(slug);
                match options.placement {
                    Placement::Before => {
                        el.prepend(&format!("{} ", permalink), ContentType::Html)
                    }
                    Placement::After => el.append(&format!(" {}", permalink), ContentType::Html),
                }
            }
            Ok(())
        }));
    }

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|err| SiteError::Rewrite(err.to_string()))
}
