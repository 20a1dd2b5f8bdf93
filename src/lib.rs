mod block;
mod classify;
mod config;
mod error;
mod flow;
mod html;
mod inline;
mod parser;
mod render;
mod typst;
mod wrap;

pub use block::{Block, Document, Inline, List, ListKind, Table};
pub use config::{Color, Config, DocumentConfig, InfoRow, PageConfig, ThemeConfig};
pub use error::{Error, Result};
pub use flow::{
    Cell, FlowDocument, FlowNode, FlowRenderer, FlowTable, Fragment, HeadingStyle, ListEntry,
    Marker, PageFrame, Run, RunStyle, TitlePage, column_widths,
};
pub use html::{Element, HtmlDocument, HtmlRenderer, Node};
pub use parser::{Diagnostic, DiagnosticKind, ParseOutcome};
pub use render::Render;

use tracing::debug;
use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_pdf::PdfOptions;

/// Parse markdown text into a document.
pub fn parse(markdown: &str) -> Document {
    parser::parse(markdown)
}

/// Parse markdown text, also returning everything the parser recovered from.
pub fn parse_with_diagnostics(markdown: &str) -> ParseOutcome {
    parser::parse_with_diagnostics(markdown)
}

/// Convert markdown to a standalone HTML page using the built-in config.
pub fn markdown_to_html(markdown: &str) -> String {
    markdown_to_html_with_config(markdown, &Config::compiled_default())
}

pub fn markdown_to_html_with_config(markdown: &str, config: &Config) -> String {
    document_to_html(&parse(markdown), config)
}

/// Render an already parsed document as a standalone HTML page.
pub fn document_to_html(doc: &Document, config: &Config) -> String {
    HtmlRenderer::new(config).render(doc).to_string()
}

/// Lay markdown out as paginated flow primitives.
pub fn markdown_to_flow(markdown: &str, config: &Config) -> FlowDocument {
    document_to_flow(&parse(markdown), config)
}

pub fn document_to_flow(doc: &Document, config: &Config) -> FlowDocument {
    FlowRenderer::new(config).render(doc)
}

/// Convert markdown to Typst markup.
pub fn markdown_to_typst(markdown: &str) -> String {
    markdown_to_typst_with_config(markdown, &Config::compiled_default())
}

pub fn markdown_to_typst_with_config(markdown: &str, config: &Config) -> String {
    document_to_typst(&parse(markdown), config)
}

pub fn document_to_typst(doc: &Document, config: &Config) -> String {
    typst::flow_to_typst(&document_to_flow(doc, config))
}

/// Serialize the parsed document as pretty-printed JSON.
pub fn markdown_to_json(markdown: &str) -> Result<String> {
    document_to_json(&parse(markdown))
}

pub fn document_to_json(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Convert markdown to PDF bytes.
pub fn markdown_to_pdf(markdown: &str) -> Result<Vec<u8>> {
    markdown_to_pdf_with_config(markdown, &Config::compiled_default())
}

pub fn markdown_to_pdf_with_config(markdown: &str, config: &Config) -> Result<Vec<u8>> {
    document_to_pdf(&parse(markdown), config)
}

/// Lay out, serialize and compile a parsed document to PDF bytes.
pub fn document_to_pdf(doc: &Document, config: &Config) -> Result<Vec<u8>> {
    use typst_library::layout::PagedDocument;

    let typst_content = document_to_typst(doc, config);
    debug!(bytes = typst_content.len(), "compiling typst markup");

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| Error::Compilation(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| Error::Pdf(format!("{:?}", e)))
}
