/// One source line and its 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub text: &'a str,
    pub number: usize,
}

impl<'a> Line<'a> {
    pub fn new(text: &'a str, number: usize) -> Self {
        Self { text, number }
    }
}

/// Provisional kind of a single line, before the assembler sees its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Heading(u8),
    BulletItem,
    OrderedItem,
    TableRowCandidate,
    TableSeparator,
    FenceDelimiter,
    Blank,
    Prose,
}

/// Split source text into numbered lines.
pub fn lines(source: &str) -> impl Iterator<Item = Line<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(i, text)| Line::new(text, i + 1))
}

/// Classify a line. Leading indentation is ignored.
pub fn classify(line: &Line) -> TokenKind {
    let text = line.text.trim_start();

    if text.starts_with("### ") {
        TokenKind::Heading(3)
    } else if text.starts_with("## ") {
        TokenKind::Heading(2)
    } else if text.starts_with("# ") {
        TokenKind::Heading(1)
    } else if text.starts_with("```") {
        TokenKind::FenceDelimiter
    } else if text.starts_with("- ") || text.starts_with("* ") {
        TokenKind::BulletItem
    } else if ordered_marker_len(text).is_some() {
        TokenKind::OrderedItem
    } else if is_table_separator(text) {
        TokenKind::TableSeparator
    } else if text.matches('|').count() > 1 {
        // A single pipe is ordinary prose
        TokenKind::TableRowCandidate
    } else if text.is_empty() {
        TokenKind::Blank
    } else {
        TokenKind::Prose
    }
}

/// Byte length of a `<digits>. ` marker at the start of `text`.
fn ordered_marker_len(text: &str) -> Option<usize> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && text[digits..].starts_with(". ") {
        Some(digits + 2)
    } else {
        None
    }
}

fn is_table_separator(text: &str) -> bool {
    if text.matches('|').count() <= 2 {
        return false;
    }

    let mut total = 0;
    let mut rule = 0;
    let mut dashes = 0;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        match c {
            '-' => {
                rule += 1;
                dashes += 1;
            }
            '|' | ':' => rule += 1,
            _ => {}
        }
    }

    // At least four in five characters must be rule characters
    dashes > 0 && rule * 5 >= total * 4
}

/// Heading text with the `#` marker of the given level removed.
pub fn heading_text(text: &str, level: u8) -> &str {
    let text = text.trim_start();
    text.get(usize::from(level) + 1..).unwrap_or("").trim()
}

/// List item text with its bullet or number marker removed.
pub fn item_text(text: &str) -> &str {
    let text = text.trim_start();
    let marker = if text.starts_with("- ") || text.starts_with("* ") {
        2
    } else {
        ordered_marker_len(text).unwrap_or(0)
    };
    text[marker..].trim()
}

/// Split a table row into trimmed cells. Outer pipes are optional.
pub fn split_cells(text: &str) -> Vec<&str> {
    let text = text.trim();
    let text = text.strip_prefix('|').unwrap_or(text);
    let text = text.strip_suffix('|').unwrap_or(text);
    text.split('|').map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kind(text: &str) -> TokenKind {
        classify(&Line::new(text, 1))
    }

    #[rstest]
    #[case("# Title", TokenKind::Heading(1))]
    #[case("## Section", TokenKind::Heading(2))]
    #[case("### Subsection", TokenKind::Heading(3))]
    #[case("#### Too deep", TokenKind::Prose)]
    #[case("#hashtag", TokenKind::Prose)]
    #[case("```", TokenKind::FenceDelimiter)]
    #[case("```rust", TokenKind::FenceDelimiter)]
    #[case("- item", TokenKind::BulletItem)]
    #[case("* item", TokenKind::BulletItem)]
    #[case("  - indented item", TokenKind::BulletItem)]
    #[case("**bold** start", TokenKind::Prose)]
    #[case("1. first", TokenKind::OrderedItem)]
    #[case("42. answer", TokenKind::OrderedItem)]
    #[case("1.5 litres", TokenKind::Prose)]
    #[case("| --- | --- |", TokenKind::TableSeparator)]
    #[case("|:---|---:|", TokenKind::TableSeparator)]
    #[case("| A | B |", TokenKind::TableRowCandidate)]
    #[case("| -1 | -2 | -3 |", TokenKind::TableRowCandidate)]
    #[case("a | b | c", TokenKind::TableRowCandidate)]
    #[case("|---|", TokenKind::TableRowCandidate)]
    #[case("either a | b", TokenKind::Prose)]
    #[case("", TokenKind::Blank)]
    #[case("   \t", TokenKind::Blank)]
    #[case("Plain words.", TokenKind::Prose)]
    fn classifies(#[case] text: &str, #[case] expected: TokenKind) {
        assert_eq!(kind(text), expected);
    }

    #[test]
    fn heading_wins_over_pipes() {
        assert_eq!(kind("# A | B | C"), TokenKind::Heading(1));
    }

    #[test]
    fn bullet_wins_over_pipes() {
        assert_eq!(kind("- a | b | c"), TokenKind::BulletItem);
    }

    #[test]
    fn lines_are_numbered_from_one() {
        let numbers: Vec<usize> = lines("a\r\nb\nc").map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(lines("a\r\nb").next().unwrap().text, "a");
    }

    #[test]
    fn strips_markers() {
        assert_eq!(heading_text("## Scope  ", 2), "Scope");
        assert_eq!(heading_text("# #1 priority", 1), "#1 priority");
        assert_eq!(item_text("- one"), "one");
        assert_eq!(item_text("  * two "), "two");
        assert_eq!(item_text("12. twelve"), "twelve");
        assert_eq!(item_text("- "), "");
    }

    #[test]
    fn splits_cells() {
        assert_eq!(split_cells("| A | B |"), vec!["A", "B"]);
        assert_eq!(split_cells("A | B"), vec!["A", "B"]);
        assert_eq!(split_cells("| A || C |"), vec!["A", "", "C"]);
        assert_eq!(split_cells("| | |"), vec!["", ""]);
    }
}
