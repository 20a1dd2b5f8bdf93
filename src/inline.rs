use crate::block::Inline;

/// Intermediate token after code spans have been cut out.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(String),
    Code(String),
    /// A matched bold span, opaque to italic pairing around it
    Strong(Vec<Piece>),
}

/// A run of pieces either outside or between a delimiter pair.
enum Region {
    Plain(Vec<Piece>),
    Enclosed(Vec<Piece>),
}

/// Resolve `` `code` ``, `**bold**` and `*italic*` markers.
///
/// Code spans are cut out first and never looked inside again. Bold pairs are
/// matched next, then italic pairs. An italic pair may enclose a whole bold
/// span or sit inside one, but never straddles its boundary. Unmatched
/// markers stay literal.
pub fn format(raw: &str) -> Inline {
    let mut pieces = Vec::new();
    for region in pair_delimiters(code_spans(raw), "**") {
        match region {
            Region::Plain(plain) => pieces.extend(plain),
            Region::Enclosed(enclosed) => pieces.push(Piece::Strong(enclosed)),
        }
    }
    Inline::Sequence(italics(pieces))
}

fn italics(pieces: Vec<Piece>) -> Vec<Inline> {
    let mut nodes = Vec::new();
    for region in pair_delimiters(pieces, "*") {
        match region {
            Region::Plain(pieces) => nodes.extend(leaves(pieces)),
            Region::Enclosed(pieces) => nodes.push(Inline::Italic(Box::new(group(leaves(pieces))))),
        }
    }
    merge_text(nodes)
}

fn code_spans(raw: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('`') else {
            break;
        };
        push_text(&mut pieces, &rest[..open]);
        if close == 0 {
            // Empty span stays literal
            push_text(&mut pieces, "``");
        } else {
            pieces.push(Piece::Code(after[..close].to_string()));
        }
        rest = &after[close + 1..];
    }

    push_text(&mut pieces, rest);
    pieces
}

/// Split pieces on the first-come, non-greedy pairs of `delim`.
fn pair_delimiters(pieces: Vec<Piece>, delim: &str) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut outside: Vec<Piece> = Vec::new();
    let mut inside: Option<Vec<Piece>> = None;

    for piece in pieces {
        let text = match piece {
            Piece::Text(text) => text,
            opaque => {
                inside.as_mut().unwrap_or(&mut outside).push(opaque);
                continue;
            }
        };

        let mut rest = text.as_str();
        while let Some(at) = rest.find(delim) {
            let before = &rest[..at];
            match inside.take() {
                None => {
                    push_text(&mut outside, before);
                    if !outside.is_empty() {
                        regions.push(Region::Plain(std::mem::take(&mut outside)));
                    }
                    inside = Some(Vec::new());
                }
                Some(mut enclosed) => {
                    push_text(&mut enclosed, before);
                    if enclosed.is_empty() {
                        push_text(&mut outside, &delim.repeat(2));
                    } else {
                        regions.push(Region::Enclosed(enclosed));
                    }
                }
            }
            rest = &rest[at + delim.len()..];
        }
        push_text(inside.as_mut().unwrap_or(&mut outside), rest);
    }

    // An opener that never closed is ordinary text
    if let Some(enclosed) = inside {
        push_text(&mut outside, delim);
        for piece in enclosed {
            match piece {
                Piece::Text(text) => push_text(&mut outside, &text),
                opaque => outside.push(opaque),
            }
        }
    }
    if !outside.is_empty() {
        regions.push(Region::Plain(outside));
    }

    regions
}

fn push_text(pieces: &mut Vec<Piece>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Piece::Text(last)) = pieces.last_mut() {
        last.push_str(text);
    } else {
        pieces.push(Piece::Text(text.to_string()));
    }
}

fn leaves(pieces: Vec<Piece>) -> Vec<Inline> {
    pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Text(text) => Inline::Text(text),
            Piece::Code(code) => Inline::Code(code),
            Piece::Strong(inner) => Inline::Bold(Box::new(group(italics(inner)))),
        })
        .collect()
}

fn merge_text(nodes: Vec<Inline>) -> Vec<Inline> {
    let mut merged: Vec<Inline> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match (merged.last_mut(), node) {
            (Some(Inline::Text(last)), Inline::Text(text)) => last.push_str(&text),
            (_, node) => merged.push(node),
        }
    }
    merged
}

/// A single child stands alone; several become a sequence.
fn group(mut nodes: Vec<Inline>) -> Inline {
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        Inline::Sequence(nodes)
    }
}
