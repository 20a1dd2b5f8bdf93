use serde::Serialize;
use tracing::debug;

use crate::block::{Block, Document, Inline, ListKind, Table};
use crate::config::{Color, Config, InfoRow};
use crate::render::Render;
use crate::wrap::{flatten, wrap_line, wrap_runs};

/// Usable width of a US Letter page with one-inch side margins.
pub const CONTENT_WIDTH_PT: f32 = 468.0;
/// Table cells are pre-wrapped to this many characters.
pub const CELL_WRAP_CHARS: usize = 40;
/// Code lines longer than this are soft-wrapped.
pub const CODE_WRAP_CHARS: usize = 80;
/// Tables and lists up to this many rows are kept on one page.
const KEEP_TOGETHER_MAX: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

/// A stretch of text with one style
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            style: RunStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Fragment {
    Run(Run),
    LineBreak,
}

/// Pre-wrapped table cell content
pub type Cell = Vec<Fragment>;

/// Running header and footer drawn on every page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFrame {
    pub title: String,
    /// Right-aligned header tag
    pub document_id: Option<String>,
    pub classification: String,
    pub page_numbers: bool,
    /// Left footer date stamp
    pub generated: Option<String>,
    pub accent: Color,
}

/// Cover page drawn ahead of the content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePage {
    pub title: String,
    pub subtitle: Option<String>,
    pub info: Vec<InfoRow>,
    pub title_color: Color,
    pub subtitle_color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingStyle {
    pub size_pt: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Marker {
    Bullet,
    Number(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEntry {
    pub marker: Marker,
    pub content: Inline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowTable {
    /// Column widths in points
    pub widths: Vec<f32>,
    /// Repeated at the top of every page the table spans
    pub header: Option<Vec<Cell>>,
    pub rows: Vec<Vec<Cell>>,
    pub header_fill: Color,
    pub keep_together: bool,
}

/// One layout primitive. Headings always stay with the node that follows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FlowNode {
    TitlePage(TitlePage),
    PageBreak,
    Heading {
        level: u8,
        content: Inline,
        style: HeadingStyle,
    },
    Paragraph {
        content: Inline,
    },
    Table(FlowTable),
    List {
        entries: Vec<ListEntry>,
        keep_together: bool,
    },
    Preformatted {
        lines: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowDocument {
    pub frame: PageFrame,
    pub nodes: Vec<FlowNode>,
}

/// Column widths for a table, as a pure function of its column count.
pub fn column_widths(columns: usize, available: f32) -> Vec<f32> {
    let proportional = |weights: &[f32]| -> Vec<f32> {
        let total: f32 = weights.iter().sum();
        weights.iter().map(|w| available * w / total).collect()
    };

    match columns {
        0 => Vec::new(),
        1 => vec![available],
        2 => proportional(&[5.0, 8.0]),
        3 => proportional(&[4.0, 4.0, 5.0]),
        4 => vec![available / 4.0; 4],
        n => vec![available / n as f32; n],
    }
}

/// Maps a document onto paginated layout primitives.
pub struct FlowRenderer<'a> {
    config: &'a Config,
}

impl<'a> FlowRenderer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    fn frame(&self) -> PageFrame {
        let document = &self.config.document;
        PageFrame {
            title: document.title.clone(),
            document_id: Some(document.document_id.clone()).filter(|id| !id.is_empty()),
            classification: document.classification.clone(),
            page_numbers: self.config.page.numbers,
            generated: self.config.page.generated.clone(),
            accent: self.config.theme.primary.clone(),
        }
    }

    fn title_page(&self) -> TitlePage {
        let document = &self.config.document;
        TitlePage {
            title: document.title.clone(),
            subtitle: Some(document.subtitle.clone()).filter(|s| !s.is_empty()),
            info: document.info_rows(),
            title_color: self.config.theme.primary.clone(),
            subtitle_color: self.config.theme.secondary.clone(),
        }
    }

    fn heading_style(&self, level: u8) -> HeadingStyle {
        let size_pt = match level {
            1 => 18.0,
            2 => 14.0,
            _ => 12.0,
        };
        HeadingStyle {
            size_pt,
            color: self.config.theme.heading_color(level).clone(),
        }
    }

    fn table(&self, table: &Table) -> FlowTable {
        let columns = table.column_count();
        let row = |cells: &[Inline]| -> Vec<Cell> {
            let mut row: Vec<Cell> = cells
                .iter()
                .map(|cell| wrap_runs(&flatten(cell), CELL_WRAP_CHARS))
                .collect();
            row.resize_with(columns, Vec::new);
            row
        };

        FlowTable {
            widths: column_widths(columns, CONTENT_WIDTH_PT),
            header: table.header().map(row),
            rows: table.body().iter().map(|cells| row(cells)).collect(),
            header_fill: self.config.theme.table_header().clone(),
            keep_together: table.rows.len() <= KEEP_TOGETHER_MAX,
        }
    }
}

impl Render for FlowRenderer<'_> {
    type Artifact = FlowDocument;

    fn render(&self, doc: &Document) -> FlowDocument {
        let mut nodes = Vec::with_capacity(doc.len() + 2);
        if self.config.page.title_page {
            nodes.push(FlowNode::TitlePage(self.title_page()));
            nodes.push(FlowNode::PageBreak);
        }

        for block in doc {
            match block {
                Block::Heading { level, content } => {
                    if *level == self.config.page.break_level {
                        nodes.push(FlowNode::PageBreak);
                    }
                    nodes.push(FlowNode::Heading {
                        level: *level,
                        content: content.clone(),
                        style: self.heading_style(*level),
                    });
                }
                Block::Paragraph { content } => nodes.push(FlowNode::Paragraph {
                    content: content.clone(),
                }),
                Block::Table(table) => nodes.push(FlowNode::Table(self.table(table))),
                Block::List(list) => {
                    let entries = list
                        .items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| ListEntry {
                            marker: match list.kind {
                                ListKind::Bullet => Marker::Bullet,
                                ListKind::Ordered => Marker::Number(i + 1),
                            },
                            content: item.clone(),
                        })
                        .collect();
                    nodes.push(FlowNode::List {
                        entries,
                        keep_together: list.items.len() <= KEEP_TOGETHER_MAX,
                    });
                }
                Block::CodeBlock { lines } => nodes.push(FlowNode::Preformatted {
                    lines: lines
                        .iter()
                        .flat_map(|line| wrap_line(line, CODE_WRAP_CHARS, true))
                        .collect(),
                }),
            }
        }

        debug!(blocks = doc.len(), nodes = nodes.len(), "laid out flow document");

        FlowDocument {
            frame: self.frame(),
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn render(markdown: &str) -> FlowDocument {
        FlowRenderer::new(&Config::default()).render(&parse(markdown))
    }

    fn only_table(markdown: &str) -> FlowTable {
        match render(markdown).nodes.as_slice() {
            [FlowNode::Table(table)] => table.clone(),
            other => panic!("expected one table, got {other:?}"),
        }
    }

    #[rstest]
    #[case(1, vec![468.0])]
    #[case(2, vec![180.0, 288.0])]
    #[case(3, vec![144.0, 144.0, 180.0])]
    #[case(4, vec![117.0; 4])]
    #[case(5, vec![93.6; 5])]
    #[case(6, vec![78.0; 6])]
    fn widths_by_column_count(#[case] columns: usize, #[case] expected: Vec<f32>) {
        let widths = column_widths(columns, CONTENT_WIDTH_PT);
        assert_eq!(widths.len(), expected.len());
        for (got, want) in widths.iter().zip(&expected) {
            assert!((got - want).abs() < 0.01, "{widths:?} != {expected:?}");
        }
    }

    #[test]
    fn two_columns_split_five_to_eight() {
        let table = only_table("| Term | Meaning |\n|---|---|\n| PO | Purchase order |");
        let ratio = table.widths[0] / table.widths[1];
        assert!((ratio - 5.0 / 8.0).abs() < 1e-4);
    }

    #[test]
    fn five_columns_are_equal() {
        let table = only_table("| a | b | c | d | e |\n| 1 | 2 | 3 | 4 | 5 |");
        assert_eq!(table.widths.len(), 5);
        assert!(table.widths.iter().all(|w| (w - table.widths[0]).abs() < 1e-4));
    }

    #[test]
    fn cells_are_wrapped_and_rows_padded() {
        let long = "word ".repeat(20);
        let table = only_table(&format!("| A | B |\n|---|---|\n| {long} |"));
        assert!(table.header.is_some());

        let row = &table.rows[0];
        assert_eq!(row.len(), 2);
        assert!(row[0].contains(&Fragment::LineBreak));
        assert!(row[1].is_empty());
    }

    #[test]
    fn large_tables_may_break() {
        let rows = "| x | y |\n".repeat(6);
        assert!(!only_table(&rows).keep_together);
        assert!(only_table("| x | y |").keep_together);
    }

    #[test]
    fn page_break_before_top_level_heading_only() {
        let nodes = render("# One\n## Two\n### Three").nodes;
        assert!(matches!(
            nodes.as_slice(),
            [
                FlowNode::PageBreak,
                FlowNode::Heading { level: 1, .. },
                FlowNode::Heading { level: 2, .. },
                FlowNode::Heading { level: 3, .. },
            ]
        ));
    }

    #[test]
    fn break_level_follows_config() {
        let mut config = Config::default();
        config.page.break_level = 2;
        let nodes = FlowRenderer::new(&config).render(&parse("# A\n## B")).nodes;
        assert!(matches!(
            nodes.as_slice(),
            [
                FlowNode::Heading { level: 1, .. },
                FlowNode::PageBreak,
                FlowNode::Heading { level: 2, .. },
            ]
        ));

        config.page.break_level = 0;
        let nodes = FlowRenderer::new(&config).render(&parse("# A\n## B")).nodes;
        assert!(!nodes.contains(&FlowNode::PageBreak));
    }

    #[test]
    fn title_page_opens_document() {
        let mut config = Config::default();
        config.page.title_page = true;
        config.document.title = "ASR Purchase Order System".to_string();
        config.document.subtitle = "Standard Operating Procedure".to_string();
        config.document.document_id = "ASR-SOP-PO-001".to_string();

        let nodes = FlowRenderer::new(&config).render(&parse("## Scope")).nodes;
        let [FlowNode::TitlePage(page), FlowNode::PageBreak, FlowNode::Heading { .. }] =
            nodes.as_slice()
        else {
            panic!("expected title page first, got {nodes:?}");
        };
        assert_eq!(page.title, "ASR Purchase Order System");
        assert_eq!(page.subtitle.as_deref(), Some("Standard Operating Procedure"));
        assert_eq!(
            page.info,
            vec![
                InfoRow::new("Document ID", "ASR-SOP-PO-001"),
                InfoRow::new("Classification", "Internal Use Only"),
            ]
        );
    }

    #[test]
    fn no_title_page_by_default() {
        assert!(!render("text")
            .nodes
            .iter()
            .any(|node| matches!(node, FlowNode::TitlePage(_))));
    }

    #[test]
    fn heading_style_keyed_by_level() {
        let nodes = render("## Two").nodes;
        let [FlowNode::Heading { style, .. }] = nodes.as_slice() else {
            panic!("expected a heading");
        };
        assert_eq!(style.size_pt, 14.0);
        assert_eq!(style.color, Config::default().theme.secondary);
    }

    #[test]
    fn ordered_list_is_numbered() {
        let nodes = render("3. a\n7. b").nodes;
        let [FlowNode::List { entries, .. }] = nodes.as_slice() else {
            panic!("expected a list");
        };
        let markers: Vec<&Marker> = entries.iter().map(|e| &e.marker).collect();
        assert_eq!(markers, vec![&Marker::Number(1), &Marker::Number(2)]);
    }

    #[test]
    fn long_code_lines_are_soft_wrapped() {
        let line = "let value = ".to_string() + &"compute(x) + ".repeat(10);
        let nodes = render(&format!("```\n{line}\n```")).nodes;
        let [FlowNode::Preformatted { lines }] = nodes.as_slice() else {
            panic!("expected preformatted block");
        };
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= CODE_WRAP_CHARS));
    }

    #[test]
    fn frame_comes_from_config() {
        let mut config = Config::default();
        config.document.title = "Purchase Order SOP".to_string();
        config.document.document_id = "ASR-SOP-PO-001".to_string();
        config.page.generated = Some("January 12, 2026".to_string());

        let frame = FlowRenderer::new(&config).render(&parse("text")).frame;
        assert_eq!(frame.title, "Purchase Order SOP");
        assert_eq!(frame.document_id.as_deref(), Some("ASR-SOP-PO-001"));
        assert_eq!(frame.classification, "Internal Use Only");
        assert_eq!(frame.generated.as_deref(), Some("January 12, 2026"));
        assert!(frame.page_numbers);
    }

    #[test]
    fn page_numbers_can_be_turned_off() {
        let mut config = Config::default();
        config.page.numbers = false;
        assert!(!FlowRenderer::new(&config).render(&parse("text")).frame.page_numbers);
    }

    #[test]
    fn empty_document_has_no_nodes() {
        let flow = render("");
        assert!(flow.nodes.is_empty());
        assert!(flow.frame.document_id.is_none());
    }
}
