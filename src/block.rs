use serde::Serialize;

/// Inline text with formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Inline {
    Text(String),
    Bold(Box<Inline>),
    Italic(Box<Inline>),
    Code(String),
    Sequence(Vec<Inline>),
}

impl Inline {
    /// The text with all formatting markers removed.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Bold(inner) | Inline::Italic(inner) => inner.push_plain_text(out),
            Inline::Sequence(children) => {
                for child in children {
                    child.push_plain_text(out);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Inline::Text(text) | Inline::Code(text) => text.is_empty(),
            Inline::Bold(inner) | Inline::Italic(inner) => inner.is_empty(),
            Inline::Sequence(children) => children.iter().all(Inline::is_empty),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// A list (ordered or unordered)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct List {
    pub kind: ListKind,
    pub items: Vec<Inline>,
}

/// A pipe table. When `has_header` is set the first row is the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub rows: Vec<Vec<Inline>>,
    pub has_header: bool,
}

impl Table {
    pub fn header(&self) -> Option<&[Inline]> {
        if self.has_header {
            self.rows.first().map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Rows after the header, or every row when there is none.
    pub fn body(&self) -> &[Vec<Inline>] {
        if self.has_header && !self.rows.is_empty() {
            &self.rows[1..]
        } else {
            &self.rows
        }
    }

    /// Width of the widest row; ragged rows are padded by the renderers.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Block-level elements parsed from Markdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Block {
    Heading { level: u8, content: Inline },
    Paragraph { content: Inline },
    Table(Table),
    List(List),
    /// Raw lines between fence delimiters, never inline-formatted
    CodeBlock { lines: Vec<String> },
}

/// The parsed document. Built once by the parser and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }
}

impl From<Vec<Block>> for Document {
    fn from(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn plain_text_strips_formatting() {
        let inline = Inline::Sequence(vec![
            text("a "),
            Inline::Bold(Box::new(Inline::Sequence(vec![
                text("b "),
                Inline::Italic(Box::new(text("c"))),
            ]))),
            Inline::Code(" d".to_string()),
        ]);
        assert_eq!(inline.plain_text(), "a b c d");
    }

    #[test]
    fn table_header_and_body() {
        let table = Table {
            rows: vec![vec![text("A"), text("B")], vec![text("1")]],
            has_header: true,
        };
        assert_eq!(table.header(), Some(&[text("A"), text("B")][..]));
        assert_eq!(table.body().len(), 1);
        assert_eq!(table.column_count(), 2);

        let headerless = Table {
            has_header: false,
            ..table
        };
        assert_eq!(headerless.header(), None);
        assert_eq!(headerless.body().len(), 2);
    }

    #[test]
    fn empty_document() {
        let doc = Document::default();
        assert!(doc.is_empty());
        assert_eq!(doc.iter().count(), 0);
    }
}
