//! Rendering functions for the markdown renderer.

use super::context::{Context, Scope};
use markdown::mdast::{AlignKind, Node};

/// Renders text, turning soft line breaks into `<br />` when configured.
fn render_text(value: &str, ctx: &mut Context) {
    if !ctx.soft_breaks_as_newline() {
        ctx.push_text(value);
        return;
    }

    for (i, line) in value.split('\n').enumerate() {
        if i > 0 {
            ctx.push_raw("<br />\n");
        }
        ctx.push_text(line);
    }
}

fn render_children(children: &[Node], ctx: &mut Context) {
    for child in children {
        render_node(child, ctx);
    }
}

/// Renders a paragraph node, suppressing `<p>` wrappers in tight lists.
fn render_paragraph(para: &markdown::mdast::Paragraph, ctx: &mut Context) {
    let in_tight_list = ctx.is_in_tight_list();
    if !in_tight_list {
        ctx.push_raw("<p>");
    }

    ctx.enter(Scope::Paragraph);
    render_children(&para.children, ctx);
    ctx.exit();

    if !in_tight_list {
        ctx.push_raw("</p>\n");
    }
}

/// Renders a heading as a plain `<hN>` element.
///
/// Identifiers and permalinks are added by the anchor decorator.
fn render_heading(heading: &markdown::mdast::Heading, ctx: &mut Context) {
    let tag = format!("h{}", heading.depth);
    ctx.push_raw(&format!("<{}>", tag));
    ctx.enter(Scope::Phrasing);
    render_children(&heading.children, ctx);
    ctx.exit();
    ctx.push_raw(&format!("</{}>\n", tag));
}

/// Renders a list node as `<ul>` or `<ol>`.
fn render_list(list: &markdown::mdast::List, ctx: &mut Context) {
    let loose = list.spread
        || list
            .children
            .iter()
            .any(|child| matches!(child, Node::ListItem(item) if item.spread));

    let tag = if list.ordered { "ol" } else { "ul" };
    ctx.push_raw("<");
    ctx.push_raw(tag);
    if let Some(start) = list.start
        && list.ordered
        && start != 1
    {
        ctx.push_attr("start", &start.to_string());
    }
    ctx.push_raw(">\n");

    ctx.enter(Scope::List { loose });
    render_children(&list.children, ctx);
    ctx.exit();

    ctx.push_raw(&format!("</{}>\n", tag));
}

/// Renders a list item node as `<li>`.
///
/// In tight lists the item's paragraphs are unwrapped; a nested block after
/// them starts on its own line.
fn render_list_item(item: &markdown::mdast::ListItem, ctx: &mut Context) {
    ctx.push_raw("<li>");
    if !ctx.is_in_tight_list() {
        ctx.push_raw("\n");
    }

    for child in &item.children {
        if !matches!(child, Node::Paragraph(_)) && !ctx.at_line_start() {
            ctx.push_raw("\n");
        }
        render_node(child, ctx);
    }

    ctx.push_raw("</li>\n");
}

/// Renders a fenced or indented code block.
fn render_code(code: &markdown::mdast::Code, ctx: &mut Context) {
    ctx.push_raw("<pre><code");
    if let Some(lang) = &code.lang {
        ctx.push_attr("class", &format!("language-{}", lang));
    }
    ctx.push_raw(">");
    if !code.value.is_empty() {
        ctx.push_text(&code.value);
        ctx.push_raw("\n");
    }
    ctx.push_raw("</code></pre>\n");
}

/// Image payloads accepted in `data:` URLs.
const SAFE_DATA_IMAGES: [&str; 4] = [
    "data:image/gif;",
    "data:image/png;",
    "data:image/jpeg;",
    "data:image/webp;",
];

/// Rejects URLs with a script-capable or local scheme.
///
/// Whitespace and control characters are ignored and the scheme is matched
/// case-insensitively, as browsers do. `data:` is allowed for raster images only.
pub(crate) fn validate_link(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace() && !ch.is_control())
        .take(32)
        .collect::<String>()
        .to_ascii_lowercase();

    if normalized.starts_with("javascript:")
        || normalized.starts_with("vbscript:")
        || normalized.starts_with("file:")
    {
        return false;
    }
    if normalized.starts_with("data:") {
        return SAFE_DATA_IMAGES
            .iter()
            .any(|prefix| normalized.starts_with(prefix));
    }
    true
}

fn push_link_open(url: &str, title: Option<&str>, ctx: &mut Context) {
    ctx.push_raw("<a");
    ctx.push_attr("href", url);
    if let Some(title) = title {
        ctx.push_attr("title", title);
    }
    ctx.push_raw(">");
}

fn push_image(url: &str, alt: &str, title: Option<&str>, ctx: &mut Context) {
    if !validate_link(url) {
        log::debug!("Unsafe image URL rendered as its alt text: {}", url);
        ctx.push_text(alt);
        return;
    }
    ctx.push_raw("<img");
    ctx.push_attr("src", url);
    ctx.push_attr("alt", alt);
    if let Some(title) = title {
        ctx.push_attr("title", title);
    }
    ctx.push_raw(" />");
}

/// Renders a link node as `<a>`.
fn render_link(link: &markdown::mdast::Link, ctx: &mut Context) {
    if !validate_link(&link.url) {
        log::debug!("Unsafe link URL rendered as text: {}", link.url);
        render_children(&link.children, ctx);
        return;
    }
    push_link_open(&link.url, link.title.as_deref(), ctx);
    render_children(&link.children, ctx);
    ctx.push_raw("</a>");
}

/// Renders `[text][label]` by resolving the label against the definitions.
fn render_link_reference(reference: &markdown::mdast::LinkReference, ctx: &mut Context) {
    match ctx.resolve(&reference.identifier).cloned() {
        Some(target) if validate_link(&target.url) => {
            push_link_open(&target.url, target.title.as_deref(), ctx);
            render_children(&reference.children, ctx);
            ctx.push_raw("</a>");
        }
        Some(target) => {
            log::debug!("Unsafe link URL rendered as text: {}", target.url);
            render_children(&reference.children, ctx);
        }
        None => {
            log::debug!("Unresolved link reference: {}", reference.identifier);
            render_children(&reference.children, ctx);
        }
    }
}

/// Renders `![alt][label]` by resolving the label against the definitions.
fn render_image_reference(reference: &markdown::mdast::ImageReference, ctx: &mut Context) {
    match ctx.resolve(&reference.identifier).cloned() {
        Some(target) => push_image(&target.url, &reference.alt, target.title.as_deref(), ctx),
        None => ctx.push_text(&reference.alt),
    }
}

/// Renders raw HTML, either as passthrough or escaped based on options.
fn render_html(html: &markdown::mdast::Html, ctx: &mut Context) {
    if ctx.raw_html_allowed() {
        ctx.push_raw(&html.value);
    } else {
        log::debug!("Raw HTML in markdown will be escaped: {}", html.value);
        ctx.push_text(&html.value);
    }

    if !ctx.is_in_phrasing() && !ctx.at_line_start() {
        ctx.push_raw("\n");
    }
}

/// Renders a blockquote node as `<blockquote>`.
fn render_blockquote(quote: &markdown::mdast::Blockquote, ctx: &mut Context) {
    ctx.push_raw("<blockquote>\n");
    ctx.enter(Scope::Blockquote);
    render_children(&quote.children, ctx);
    ctx.exit();
    ctx.push_raw("</blockquote>\n");
}

/// Renders a table row; the first row of a table is the header row.
fn render_table_row(
    row: &markdown::mdast::TableRow,
    ctx: &mut Context,
    is_header: bool,
    aligns: &[AlignKind],
) {
    ctx.push_raw("<tr>\n");

    let tag = if is_header { "th" } else { "td" };
    for (i, cell) in row.children.iter().enumerate() {
        let Node::TableCell(cell) = cell else {
            continue;
        };

        ctx.push_raw("<");
        ctx.push_raw(tag);
        match aligns.get(i) {
            Some(AlignKind::Left) => ctx.push_raw(" style=\"text-align: left\""),
            Some(AlignKind::Right) => ctx.push_raw(" style=\"text-align: right\""),
            Some(AlignKind::Center) => ctx.push_raw(" style=\"text-align: center\""),
            Some(AlignKind::None) | None => {}
        }
        ctx.push_raw(">");

        ctx.enter(Scope::Phrasing);
        render_children(&cell.children, ctx);
        ctx.exit();

        ctx.push_raw(&format!("</{}>\n", tag));
    }

    ctx.push_raw("</tr>\n");
}

/// Renders a table node as `<table>` with `<thead>` and optional `<tbody>`.
fn render_table(table: &markdown::mdast::Table, ctx: &mut Context) {
    ctx.push_raw("<table>\n<thead>\n");
    if let Some(Node::TableRow(row)) = table.children.first() {
        render_table_row(row, ctx, true, &table.align);
    }
    ctx.push_raw("</thead>\n");

    if table.children.len() > 1 {
        ctx.push_raw("<tbody>\n");
        for row in table.children.iter().skip(1) {
            if let Node::TableRow(row) = row {
                render_table_row(row, ctx, false, &table.align);
            }
        }
        ctx.push_raw("</tbody>\n");
    }

    ctx.push_raw("</table>\n");
}

/// Recursively renders an AST node to HTML, updating the context state.
pub fn render_node(node: &Node, ctx: &mut Context) {
    match node {
        Node::Root(root) => render_children(&root.children, ctx),
        Node::Text(text) => render_text(&text.value, ctx),
        Node::Paragraph(para) => render_paragraph(para, ctx),
        Node::Heading(heading) => render_heading(heading, ctx),
        Node::Link(link) => render_link(link, ctx),
        Node::LinkReference(reference) => render_link_reference(reference, ctx),
        Node::Image(img) => push_image(&img.url, &img.alt, img.title.as_deref(), ctx),
        Node::ImageReference(reference) => render_image_reference(reference, ctx),
        Node::Strong(strong) => {
            ctx.push_raw("<strong>");
            render_children(&strong.children, ctx);
            ctx.push_raw("</strong>");
        }
        Node::Emphasis(emphasis) => {
            ctx.push_raw("<em>");
            render_children(&emphasis.children, ctx);
            ctx.push_raw("</em>");
        }
        Node::Delete(delete) => {
            ctx.push_raw("<del>");
            render_children(&delete.children, ctx);
            ctx.push_raw("</del>");
        }
        Node::InlineCode(code) => {
            ctx.push_raw("<code>");
            ctx.push_text(&code.value);
            ctx.push_raw("</code>");
        }
        Node::Break(_) => ctx.push_raw("<br />\n"),
        Node::List(list) => render_list(list, ctx),
        Node::ListItem(item) => render_list_item(item, ctx),
        Node::Code(code) => render_code(code, ctx),
        Node::Blockquote(quote) => render_blockquote(quote, ctx),
        Node::ThematicBreak(_) => ctx.push_raw("<hr />\n"),
        Node::Html(html) => render_html(html, ctx),
        Node::Table(table) => render_table(table, ctx),
        Node::TableRow(_) | Node::TableCell(_) => {}
        Node::Definition(_) => {}
        _ => {
            log::warn!("Unhandled markdown node type: {:?}", node);
        }
    }
}
