use std::fmt;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::block::{Block, Document, Inline, List, ListKind, Table};
use crate::classify::{self, Line, TokenKind};
use crate::inline;

/// Something the parser recovered from instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A table row or list item with no usable content was dropped.
    MalformedBlock,
    /// Input ended inside a code fence; the buffered lines were kept.
    UnterminatedFence,
    /// No blocks were produced.
    EmptyInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 1-based source line, if the condition belongs to one
    pub line: Option<usize>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        match self.kind {
            DiagnosticKind::MalformedBlock => f.write_str("dropped a row or item with no content"),
            DiagnosticKind::UnterminatedFence => {
                f.write_str("code fence is never closed; kept its lines as a code block")
            }
            DiagnosticKind::EmptyInput => f.write_str("document contains no blocks"),
        }
    }
}

/// A parsed document plus everything the parser had to recover from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse markdown text into a document
pub fn parse(markdown: &str) -> Document {
    parse_with_diagnostics(markdown).document
}

pub fn parse_with_diagnostics(markdown: &str) -> ParseOutcome {
    let mut assembler = Assembler::default();
    for line in classify::lines(markdown) {
        assembler.feed(line);
    }
    assembler.finish()
}

enum State<'a> {
    /// Between constructs, collecting prose lines into a paragraph
    Scanning(Vec<&'a str>),
    InTable(TableBuilder),
    InList(ListBuilder),
    InFence { lines: Vec<String>, opened_at: usize },
}

impl Default for State<'_> {
    fn default() -> Self {
        State::Scanning(Vec::new())
    }
}

#[derive(Default)]
struct Assembler<'a> {
    state: State<'a>,
    blocks: Vec<Block>,
    diagnostics: Vec<Diagnostic>,
}

struct TableBuilder {
    rows: Vec<Vec<Inline>>,
    has_header: bool,
}

struct ListBuilder {
    kind: ListKind,
    items: Vec<Inline>,
}

impl<'a> Assembler<'a> {
    fn feed(&mut self, line: Line<'a>) {
        let kind = classify::classify(&line);
        trace!(line = line.number, ?kind, "classified line");

        self.state = match std::mem::take(&mut self.state) {
            State::InFence {
                mut lines,
                opened_at,
            } => {
                if kind == TokenKind::FenceDelimiter {
                    self.emit(Block::CodeBlock { lines });
                    State::default()
                } else {
                    lines.push(line.text.to_string());
                    State::InFence { lines, opened_at }
                }
            }

            State::InTable(mut table) => match kind {
                TokenKind::TableRowCandidate => {
                    self.push_row(&mut table, &line);
                    State::InTable(table)
                }
                TokenKind::TableSeparator => {
                    // Only a separator right after the first row marks a header
                    if table.rows.len() == 1 && !table.has_header {
                        table.has_header = true;
                    } else {
                        trace!(line = line.number, "ignored misplaced table separator");
                    }
                    State::InTable(table)
                }
                _ => {
                    self.emit_table(table);
                    self.scan(Vec::new(), line, kind)
                }
            },

            State::InList(mut list) => match (kind, list.kind) {
                (TokenKind::BulletItem, ListKind::Bullet)
                | (TokenKind::OrderedItem, ListKind::Ordered) => {
                    self.push_item(&mut list, &line);
                    State::InList(list)
                }
                _ => {
                    self.emit_list(list);
                    self.scan(Vec::new(), line, kind)
                }
            },

            State::Scanning(paragraph) => self.scan(paragraph, line, kind),
        };
    }

    /// Handle a line with no construct open, apart from a paragraph.
    fn scan(&mut self, mut paragraph: Vec<&'a str>, line: Line<'a>, kind: TokenKind) -> State<'a> {
        if kind == TokenKind::Prose {
            paragraph.push(line.text.trim());
            return State::Scanning(paragraph);
        }

        self.flush_paragraph(paragraph);

        match kind {
            TokenKind::Blank | TokenKind::Prose => State::default(),
            TokenKind::Heading(level) => {
                let content = inline::format(classify::heading_text(line.text, level));
                self.emit(Block::Heading { level, content });
                State::default()
            }
            TokenKind::TableRowCandidate => {
                let mut table = TableBuilder {
                    rows: Vec::new(),
                    has_header: false,
                };
                self.push_row(&mut table, &line);
                State::InTable(table)
            }
            TokenKind::TableSeparator => {
                // A separator with no table above it has nothing to mark
                self.report(DiagnosticKind::MalformedBlock, Some(line.number));
                State::default()
            }
            TokenKind::BulletItem | TokenKind::OrderedItem => {
                let list_kind = if kind == TokenKind::BulletItem {
                    ListKind::Bullet
                } else {
                    ListKind::Ordered
                };
                let mut list = ListBuilder {
                    kind: list_kind,
                    items: Vec::new(),
                };
                self.push_item(&mut list, &line);
                State::InList(list)
            }
            TokenKind::FenceDelimiter => State::InFence {
                lines: Vec::new(),
                opened_at: line.number,
            },
        }
    }

    fn push_row(&mut self, table: &mut TableBuilder, line: &Line) {
        let cells = classify::split_cells(line.text);
        if cells.iter().all(|cell| cell.is_empty()) {
            self.report(DiagnosticKind::MalformedBlock, Some(line.number));
            return;
        }
        table.rows.push(cells.into_iter().map(inline::format).collect());
    }

    fn push_item(&mut self, list: &mut ListBuilder, line: &Line) {
        let text = classify::item_text(line.text);
        if text.is_empty() {
            self.report(DiagnosticKind::MalformedBlock, Some(line.number));
            return;
        }
        list.items.push(inline::format(text));
    }

    fn flush_paragraph(&mut self, paragraph: Vec<&str>) {
        if paragraph.is_empty() {
            return;
        }
        let content = inline::format(&paragraph.join(" "));
        self.emit(Block::Paragraph { content });
    }

    fn emit_table(&mut self, table: TableBuilder) {
        if table.rows.is_empty() {
            return;
        }
        self.emit(Block::Table(Table {
            rows: table.rows,
            has_header: table.has_header,
        }));
    }

    fn emit_list(&mut self, list: ListBuilder) {
        if list.items.is_empty() {
            return;
        }
        self.emit(Block::List(List {
            kind: list.kind,
            items: list.items,
        }));
    }

    fn emit(&mut self, block: Block) {
        debug!(block = block_name(&block), index = self.blocks.len(), "emitted block");
        self.blocks.push(block);
    }

    fn report(&mut self, kind: DiagnosticKind, line: Option<usize>) {
        let diagnostic = Diagnostic { kind, line };
        match kind {
            DiagnosticKind::EmptyInput => debug!("{}", diagnostic),
            _ => warn!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Close whatever is still open at end of input.
    fn finish(mut self) -> ParseOutcome {
        match std::mem::take(&mut self.state) {
            State::Scanning(paragraph) => self.flush_paragraph(paragraph),
            State::InTable(table) => self.emit_table(table),
            State::InList(list) => self.emit_list(list),
            State::InFence { lines, opened_at } => {
                self.report(DiagnosticKind::UnterminatedFence, Some(opened_at));
                self.emit(Block::CodeBlock { lines });
            }
        }

        if self.blocks.is_empty() {
            self.report(DiagnosticKind::EmptyInput, None);
        }

        ParseOutcome {
            document: Document::from(self.blocks),
            diagnostics: self.diagnostics,
        }
    }
}

fn block_name(block: &Block) -> &'static str {
    match block {
        Block::Heading { .. } => "heading",
        Block::Paragraph { .. } => "paragraph",
        Block::Table(_) => "table",
        Block::List(_) => "list",
        Block::CodeBlock { .. } => "code_block",
    }
}
