use std::fmt;

use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::debug;

use crate::block::{Block, Document, Inline, List, ListKind, Table};
use crate::config::Config;
use crate::render::Render;

/// Tags that start a new line in the serialized output.
const BLOCK_TAGS: &[&str] = &[
    "section", "div", "h1", "h2", "h3", "p", "table", "thead", "tbody", "tr", "ul", "ol", "li",
    "pre",
];

/// Containers whose children start on their own line.
const CONTAINER_TAGS: &[&str] = &["section", "table", "thead", "tbody", "tr", "ul", "ol"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => f.write_str(&encode_text(text)),
            Node::Element(element) => write!(f, "{}", element),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            write!(f, " {}=\"{}\"", name, encode_double_quoted_attribute(value))?;
        }
        f.write_str(">")?;
        if CONTAINER_TAGS.contains(&self.tag) {
            f.write_str("\n")?;
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)?;
        if BLOCK_TAGS.contains(&self.tag) {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

/// A complete HTML page: head metadata plus the rendered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
    pub title: String,
    pub stylesheet: String,
    pub body: Vec<Node>,
}

impl fmt::Display for HtmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n")?;
        f.write_str("<meta charset=\"utf-8\">\n")?;
        writeln!(f, "<title>{}</title>", encode_text(&self.title))?;
        writeln!(f, "<style>\n{}</style>", self.stylesheet)?;
        f.write_str("</head>\n<body>\n")?;
        for node in &self.body {
            write!(f, "{}", node)?;
        }
        f.write_str("</body>\n</html>\n")
    }
}

/// Renders a document as a standalone HTML page.
pub struct HtmlRenderer<'a> {
    config: &'a Config,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    fn stylesheet(&self) -> String {
        let theme = &self.config.theme;
        let document = &self.config.document;
        let primary = theme.primary.hex();
        let mut css = String::new();

        css.push_str("@page {\n  size: letter;\n  margin: 1in;\n");
        css.push_str(&format!(
            "  @top-left {{ content: {}; color: {}; }}\n",
            css_string(&document.title),
            primary
        ));
        if !document.document_id.is_empty() {
            css.push_str(&format!(
                "  @top-right {{ content: {}; color: {}; }}\n",
                css_string(&document.document_id),
                primary
            ));
        }
        if let Some(date) = &self.config.page.generated {
            css.push_str(&format!(
                "  @bottom-left {{ content: {}; }}\n",
                css_string(&format!("Generated: {}", date))
            ));
        }
        if self.config.page.numbers {
            css.push_str("  @bottom-center { content: \"Page \" counter(page); }\n");
        }
        css.push_str(&format!(
            "  @bottom-right {{ content: {}; }}\n}}\n",
            css_string(&document.classification)
        ));

        css.push_str("body { font-family: Helvetica, Arial, sans-serif; font-size: 10pt; color: #1F2937; }\n");
        for level in 1..=3u8 {
            css.push_str(&format!(
                "h{} {{ color: {}; }}\n",
                level,
                theme.heading_color(level).hex()
            ));
        }
        css.push_str("h1 { font-size: 18pt; }\nh2 { font-size: 14pt; }\nh3 { font-size: 12pt; }\n");
        let break_level = self.config.page.break_level;
        if (1..=3).contains(&break_level) {
            css.push_str(&format!(
                "h{0} {{ page-break-before: always; }}\nh{0}:first-child {{ page-break-before: auto; }}\n",
                break_level
            ));
        }
        css.push_str("h1, h2, h3 { page-break-after: avoid; }\n");
        css.push_str("table { border-collapse: collapse; width: 100%; font-size: 9pt; }\n");
        css.push_str("th, td { border: 0.5pt solid #E5E7EB; padding: 6pt; text-align: left; }\n");
        css.push_str(&format!(
            "th {{ background: {}; color: #FFFFFF; }}\n",
            theme.table_header().hex()
        ));
        css.push_str("tbody tr:nth-child(even) { background: #F9FAFB; }\n");
        css.push_str("thead { display: table-header-group; }\n");
        if self.config.page.title_page {
            css.push_str(".title-page { page-break-after: always; text-align: center; padding-top: 100pt; }\n");
            css.push_str(&format!(
                ".doc-title {{ font-size: 28pt; font-weight: bold; color: {}; }}\n",
                primary
            ));
            css.push_str(&format!(
                ".doc-subtitle {{ font-size: 16pt; color: {}; margin-top: 12pt; }}\n",
                theme.secondary.hex()
            ));
            css.push_str(&format!(
                ".doc-info-table {{ width: auto; margin: 50pt auto 0; }}\n\
                 .doc-info-table td {{ border: 1pt solid {}; background: #F3F4F6; padding: 10pt; }}\n",
                primary
            ));
        }
        css.push_str(
            "pre.code-block { background: #F3F4F6; padding: 8pt; border-radius: 4pt; font-size: 8pt; white-space: pre-wrap; }\n",
        );
        css
    }
}

impl Render for HtmlRenderer<'_> {
    type Artifact = HtmlDocument;

    fn render(&self, doc: &Document) -> HtmlDocument {
        let mut body = BodyBuilder::default();
        if self.config.page.title_page {
            body.block(title_page_element(self.config));
        }

        for block in doc {
            match block {
                Block::Heading { level, content } => {
                    let tag = match level {
                        1 => "h1",
                        2 => "h2",
                        _ => "h3",
                    };
                    body.block(inline_children(Element::new(tag), content));
                }
                Block::Paragraph { content } => body.paragraph(content),
                Block::Table(table) => body.block(table_element(table)),
                Block::List(list) => body.block(list_element(list)),
                Block::CodeBlock { lines } => {
                    let code = Element::new("code").child(Node::Text(lines.join("\n")));
                    body.block(Element::new("pre").attr("class", "code-block").child(code));
                }
            }
        }

        let body = body.finish();
        debug!(blocks = doc.len(), nodes = body.len(), "rendered html document");

        HtmlDocument {
            title: self.config.document.title.clone(),
            stylesheet: self.stylesheet(),
            body,
        }
    }
}

/// Collects body nodes, holding the current paragraph open until the next
/// block-level element or the end of the document.
#[derive(Default)]
struct BodyBuilder {
    nodes: Vec<Node>,
    open_paragraph: Option<Element>,
}

impl BodyBuilder {
    fn paragraph(&mut self, content: &Inline) {
        self.close_paragraph();
        self.open_paragraph = Some(inline_children(Element::new("p"), content));
    }

    fn block(&mut self, element: Element) {
        self.close_paragraph();
        self.nodes.push(element.into());
    }

    fn close_paragraph(&mut self) {
        if let Some(paragraph) = self.open_paragraph.take() {
            self.nodes.push(paragraph.into());
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.close_paragraph();
        self.nodes
    }
}

fn title_page_element(config: &Config) -> Element {
    let document = &config.document;
    let mut section = Element::new("section").attr("class", "title-page").child(
        Element::new("div")
            .attr("class", "doc-title")
            .child(Node::Text(document.title.clone())),
    );
    if !document.subtitle.is_empty() {
        section.push(
            Element::new("div")
                .attr("class", "doc-subtitle")
                .child(Node::Text(document.subtitle.clone())),
        );
    }

    let mut tbody = Element::new("tbody");
    for row in document.info_rows() {
        let label = Element::new("strong").child(Node::Text(format!("{}:", row.label)));
        tbody.push(
            Element::new("tr")
                .child(Element::new("td").child(label))
                .child(Element::new("td").child(Node::Text(row.value))),
        );
    }
    section.child(
        Element::new("table")
            .attr("class", "doc-info-table")
            .child(tbody),
    )
}

fn inline_children(mut parent: Element, inline: &Inline) -> Element {
    match inline {
        Inline::Sequence(children) => {
            for child in children {
                parent = inline_children(parent, child);
            }
        }
        other => parent.push(inline_node(other)),
    }
    parent
}

fn inline_node(inline: &Inline) -> Node {
    match inline {
        Inline::Text(text) => Node::Text(text.clone()),
        Inline::Code(text) => Element::new("code").child(Node::Text(text.clone())).into(),
        Inline::Bold(inner) => inline_children(Element::new("strong"), inner).into(),
        Inline::Italic(inner) => inline_children(Element::new("em"), inner).into(),
        Inline::Sequence(_) => inline_children(Element::new("span"), inline).into(),
    }
}

fn table_element(table: &Table) -> Element {
    let columns = table.column_count();
    let row = |cells: &[Inline], tag: &'static str| -> Element {
        let mut tr = Element::new("tr");
        for i in 0..columns {
            let cell = Element::new(tag);
            tr.push(match cells.get(i) {
                Some(content) => inline_children(cell, content),
                None => cell,
            });
        }
        tr
    };

    let mut element = Element::new("table");
    if let Some(header) = table.header() {
        element.push(Element::new("thead").child(row(header, "th")));
    }
    let mut tbody = Element::new("tbody");
    for cells in table.body() {
        tbody.push(row(cells, "td"));
    }
    element.child(tbody)
}

fn list_element(list: &List) -> Element {
    let tag = match list.kind {
        ListKind::Bullet => "ul",
        ListKind::Ordered => "ol",
    };
    list.items.iter().fold(Element::new(tag), |element, item| {
        element.child(inline_children(Element::new("li"), item))
    })
}

/// Quote a value as a CSS string literal safe to embed in a `<style>` block.
fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '<' => out.push_str("\\3C "),
            '\n' => out.push_str("\\A "),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn body(markdown: &str) -> String {
        HtmlRenderer::new(&Config::default())
            .render(&parse(markdown))
            .body
            .iter()
            .map(Node::to_string)
            .collect()
    }

    #[test]
    fn heading_levels() {
        assert_eq!(body("# A\n## B\n### C"), "<h1>A</h1>\n<h2>B</h2>\n<h3>C</h3>\n");
    }

    #[test]
    fn paragraphs_close_before_blocks() {
        assert_eq!(
            body("one\n\ntwo\n# Next"),
            "<p>one</p>\n<p>two</p>\n<h1>Next</h1>\n"
        );
    }

    #[test]
    fn inline_formatting() {
        assert_eq!(
            body("**bold *and* italic** with `x < y`"),
            "<p><strong>bold <em>and</em> italic</strong> with <code>x &lt; y</code></p>\n"
        );
    }

    #[test]
    fn table_with_header() {
        assert_eq!(
            body("| A | B |\n|---|---|\n| 1 |"),
            "<table>\n<thead>\n<tr>\n<th>A</th><th>B</th></tr>\n</thead>\n\
             <tbody>\n<tr>\n<td>1</td><td></td></tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn headerless_table_has_only_body() {
        let html = body("| A | B |\n| 1 | 2 |");
        assert!(!html.contains("<thead>"));
        assert_eq!(html.matches("<td>").count(), 4);
    }

    #[test]
    fn lists() {
        assert_eq!(
            body("- a\n- b\n1. c"),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n<ol>\n<li>c</li>\n</ol>\n"
        );
    }

    #[test]
    fn code_block_is_escaped_verbatim() {
        assert_eq!(
            body("```\n<b>**x**</b>\n\n  y\n```"),
            "<pre class=\"code-block\"><code>&lt;b&gt;**x**&lt;/b&gt;\n\n  y</code></pre>\n"
        );
    }

    #[test]
    fn page_shell_uses_config() {
        let mut config = Config::default();
        config.document.title = "Q&A \"Guide\"".to_string();
        config.document.document_id = "DOC-7".to_string();

        let html = HtmlRenderer::new(&config).render(&parse("text")).to_string();
        assert!(html.starts_with("<!DOCTYPE html>\n"));
        assert!(html.contains("<title>Q&amp;A \"Guide\"</title>"));
        assert!(html.contains("@top-left { content: \"Q&A \\\"Guide\\\"\"; color: #1E3A8A; }"));
        assert!(html.contains("@top-right { content: \"DOC-7\";"));
        assert!(html.contains("counter(page)"));
        assert!(html.contains("content: \"Internal Use Only\""));
        assert!(html.contains("h1 { page-break-before: always; }"));
        assert!(html.contains("h2 { color: #3B82F6; }"));
        assert!(html.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn title_page_leads_the_body() {
        let mut config = Config::default();
        config.page.title_page = true;
        config.document.title = "Purchase Orders".to_string();
        config.document.subtitle = "Standard Operating Procedure".to_string();
        config.document.document_id = "SOP-001".to_string();

        let doc = HtmlRenderer::new(&config).render(&parse("# Scope"));
        let html: String = doc.body.iter().map(Node::to_string).collect();
        assert_eq!(
            html,
            "<section class=\"title-page\">\n\
             <div class=\"doc-title\">Purchase Orders</div>\n\
             <div class=\"doc-subtitle\">Standard Operating Procedure</div>\n\
             <table class=\"doc-info-table\">\n<tbody>\n\
             <tr>\n<td><strong>Document ID:</strong></td><td>SOP-001</td></tr>\n\
             <tr>\n<td><strong>Classification:</strong></td><td>Internal Use Only</td></tr>\n\
             </tbody>\n</table>\n</section>\n\
             <h1>Scope</h1>\n"
        );
        assert!(doc.stylesheet.contains(".title-page { page-break-after: always;"));
    }

    #[test]
    fn no_title_page_by_default() {
        let doc = HtmlRenderer::new(&Config::default()).render(&parse("# Scope"));
        assert_eq!(doc.body.len(), 1);
        assert!(!doc.stylesheet.contains(".title-page"));
    }

    #[test]
    fn break_level_selects_heading_rule() {
        let mut config = Config::default();
        config.page.break_level = 2;
        let css = HtmlRenderer::new(&config).stylesheet();
        assert!(css.contains("h2 { page-break-before: always; }"));
        assert!(!css.contains("h1 { page-break-before: always; }"));

        config.page.break_level = 0;
        let css = HtmlRenderer::new(&config).stylesheet();
        assert!(!css.contains("page-break-before: always"));
    }

    #[test]
    fn footer_boxes() {
        let mut config = Config::default();
        let css = HtmlRenderer::new(&config).stylesheet();
        assert!(!css.contains("@bottom-left"));
        assert!(css.contains("@bottom-center { content: \"Page \" counter(page); }"));

        config.page.generated = Some("January 12, 2026".to_string());
        config.page.numbers = false;
        let css = HtmlRenderer::new(&config).stylesheet();
        assert!(css.contains("@bottom-left { content: \"Generated: January 12, 2026\"; }"));
        assert!(!css.contains("counter(page)"));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let element = Element::new("a").attr("title", "say \"hi\"");
        assert_eq!(element.to_string(), "<a title=\"say &quot;hi&quot;\"></a>");
    }

    #[test]
    fn css_strings_cannot_close_style() {
        assert_eq!(css_string("</style>"), "\"\\3C /style>\"");
    }
}
