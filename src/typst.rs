use crate::block::Inline;
use crate::config::Color;
use crate::flow::{
    FlowDocument, FlowNode, FlowTable, Fragment, Marker, PageFrame, Run, TitlePage,
};

const BODY_TEXT: &str = "#1F2937";
const MUTED_TEXT: &str = "#6B7280";
const TABLE_RULE: &str = "#E5E7EB";
const TABLE_STRIPE: &str = "#F9FAFB";
const CODE_FILL: &str = "#F3F4F6";

/// Convert a flow document to Typst markup
pub fn flow_to_typst(flow: &FlowDocument) -> String {
    let mut out = preamble(&flow.frame);

    let mut nodes = flow.nodes.iter().peekable();
    while let Some(node) = nodes.next() {
        match node {
            FlowNode::Heading { .. } => {
                // Keep heading with following content using a block that prevents breaks
                match nodes.next_if(|next| keeps_with_heading(next)) {
                    Some(next) => {
                        out.push_str("#block(breakable: false)[\n");
                        emit_node(node, &mut out);
                        emit_node(next, &mut out);
                        out.push_str("]\n\n");
                    }
                    None => emit_node(node, &mut out),
                }
            }
            _ => emit_node(node, &mut out),
        }
    }

    out
}

/// Page setup, running header and footer, and text defaults.
fn preamble(frame: &PageFrame) -> String {
    let mut title = String::new();
    escape_text(&frame.title, &mut title);
    let mut document_id = String::new();
    if let Some(id) = &frame.document_id {
        escape_text(id, &mut document_id);
    }
    let mut classification = String::new();
    escape_text(&frame.classification, &mut classification);
    let mut generated = String::new();
    if let Some(date) = &frame.generated {
        generated.push_str("Generated: ");
        escape_text(date, &mut generated);
    }
    let page = if frame.page_numbers {
        "Page #counter(page).display()"
    } else {
        ""
    };
    let accent = color(&frame.accent);

    format!(
        "#set page(\n\
         \x20 paper: \"us-letter\",\n\
         \x20 margin: (x: 1in, y: 100pt),\n\
         \x20 header: [\n\
         \x20   #set text(size: 8pt, fill: rgb(\"{MUTED_TEXT}\"))\n\
         \x20   #grid(columns: (1fr, auto), [{title}], [{document_id}])\n\
         \x20   #v(-4pt)\n\
         \x20   #line(length: 100%, stroke: 0.5pt + {accent})\n\
         \x20 ],\n\
         \x20 footer: context [\n\
         \x20   #set text(size: 8pt, fill: rgb(\"{MUTED_TEXT}\"))\n\
         \x20   #line(length: 100%, stroke: 0.5pt + {accent})\n\
         \x20   #v(-4pt)\n\
         \x20   #grid(columns: (1fr, auto, 1fr), [{generated}], [{page}], align(right)[{classification}])\n\
         \x20 ],\n\
         )\n\
         #set text(size: 10pt, fill: rgb(\"{BODY_TEXT}\"))\n\
         #set par(linebreaks: \"optimized\", justify: true)\n\n"
    )
}

fn keeps_with_heading(node: &FlowNode) -> bool {
    match node {
        FlowNode::Paragraph { .. } => true,
        FlowNode::List { keep_together, .. } => *keep_together,
        FlowNode::Table(table) => table.keep_together,
        FlowNode::TitlePage(_)
        | FlowNode::PageBreak
        | FlowNode::Heading { .. }
        | FlowNode::Preformatted { .. } => false,
    }
}

fn emit_node(node: &FlowNode, out: &mut String) {
    match node {
        FlowNode::TitlePage(page) => title_page_to_typst(page, out),
        FlowNode::PageBreak => out.push_str("#pagebreak(weak: true)\n\n"),
        FlowNode::Heading {
            level,
            content,
            style,
        } => {
            out.push_str(&format!(
                "#heading(level: {})[#text(size: {}pt, fill: {})[",
                level,
                style.size_pt,
                color(&style.color)
            ));
            inline_to_typst(content, out);
            out.push_str("]]\n\n");
        }
        FlowNode::Paragraph { content } => {
            inline_to_typst(content, out);
            out.push_str("\n\n");
        }
        FlowNode::Table(table) => table_to_typst(table, out),
        FlowNode::List {
            entries,
            keep_together,
        } => {
            // Small lists stay on one page, large ones may break
            if *keep_together {
                out.push_str("#block(breakable: false)[\n");
            }
            for entry in entries {
                match entry.marker {
                    Marker::Bullet => out.push_str("- "),
                    Marker::Number(n) => out.push_str(&format!("{}. ", n)),
                }
                inline_to_typst(&entry.content, out);
                out.push('\n');
            }
            if *keep_together {
                out.push(']');
            }
            out.push_str("\n\n");
        }
        FlowNode::Preformatted { lines } => {
            out.push_str(&format!(
                "#block(fill: rgb(\"{CODE_FILL}\"), inset: 8pt, radius: 4pt, width: 100%)[\n"
            ));
            out.push_str("#set text(size: 8pt)\n");
            out.push_str("#raw(block: true, ");
            out.push_str(&string_literal(&lines.join("\n")));
            out.push_str(")\n]\n\n");
        }
    }
}

fn title_page_to_typst(page: &TitlePage, out: &mut String) {
    let title_color = color(&page.title_color);

    out.push_str("#v(100pt)\n#align(center)[\n");
    out.push_str(&format!(
        "#text(size: 28pt, weight: \"bold\", fill: {})[",
        title_color
    ));
    escape_text(&page.title, out);
    out.push_str("]\n");
    if let Some(subtitle) = &page.subtitle {
        out.push_str(&format!(
            "\n#text(size: 16pt, fill: {})[",
            color(&page.subtitle_color)
        ));
        escape_text(subtitle, out);
        out.push_str("]\n");
    }
    out.push_str("]\n#v(50pt)\n");

    if page.info.is_empty() {
        out.push('\n');
        return;
    }
    out.push_str("#align(center)[#table(\n");
    out.push_str("  columns: (144pt, 216pt),\n");
    out.push_str(&format!("  stroke: 1pt + {},\n", title_color));
    out.push_str("  inset: 10pt,\n");
    out.push_str(&format!("  fill: rgb(\"{CODE_FILL}\"),\n"));
    out.push_str("  align: left + horizon,\n");
    for row in &page.info {
        out.push_str(&format!(
            "  text(fill: {}, weight: \"bold\")[",
            title_color
        ));
        escape_text(&row.label, out);
        out.push_str(":], [");
        escape_text(&row.value, out);
        out.push_str("],\n");
    }
    out.push_str(")]\n\n");
}

fn table_to_typst(table: &FlowTable, out: &mut String) {
    if table.widths.is_empty() {
        return;
    }

    let columns: Vec<String> = table.widths.iter().map(|w| format!("{}pt", w)).collect();
    // Striping counts the header as row 0
    let fill = match table.header {
        Some(_) => format!(
            "if y == 0 {{ {} }} else if calc.even(y) {{ rgb(\"{TABLE_STRIPE}\") }}",
            color(&table.header_fill)
        ),
        None => format!("if calc.odd(y) {{ rgb(\"{TABLE_STRIPE}\") }}"),
    };

    out.push_str(&format!(
        "#block(breakable: {})[\n",
        !table.keep_together
    ));
    out.push_str("#set text(size: 9pt)\n");
    out.push_str("#table(\n");
    out.push_str(&format!("  columns: ({}),\n", columns.join(", ")));
    out.push_str(&format!("  stroke: 0.5pt + rgb(\"{TABLE_RULE}\"),\n"));
    out.push_str("  inset: 6pt,\n");
    out.push_str(&format!("  fill: (x, y) => {},\n", fill));

    if let Some(header) = &table.header {
        out.push_str("  table.header(\n");
        for cell in header {
            out.push_str("    text(fill: white, weight: \"bold\")[");
            fragments_to_typst(cell, out);
            out.push_str("],\n");
        }
        out.push_str("  ),\n");
    }

    for row in &table.rows {
        out.push_str(" ");
        for cell in row {
            out.push_str(" [");
            fragments_to_typst(cell, out);
            out.push_str("],");
        }
        out.push('\n');
    }

    out.push_str(")\n]\n\n");
}

fn fragments_to_typst(fragments: &[Fragment], out: &mut String) {
    for fragment in fragments {
        match fragment {
            Fragment::Run(run) => run_to_typst(run, out),
            Fragment::LineBreak => out.push_str("#linebreak()"),
        }
    }
}

fn run_to_typst(run: &Run, out: &mut String) {
    let mut body = String::new();
    if run.style.code {
        body.push_str("#raw(");
        body.push_str(&string_literal(&run.text));
        body.push(')');
    } else {
        escape_text(&run.text, &mut body);
    }
    if run.style.italic {
        body = format!("#emph[{}]", body);
    }
    if run.style.bold {
        body = format!("#strong[{}]", body);
    }
    out.push_str(&body);
}

fn inline_to_typst(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(text) => escape_text(text, out),
        Inline::Bold(inner) => {
            out.push_str("#strong[");
            inline_to_typst(inner, out);
            out.push(']');
        }
        Inline::Italic(inner) => {
            out.push_str("#emph[");
            inline_to_typst(inner, out);
            out.push(']');
        }
        Inline::Code(text) => {
            out.push_str("#raw(");
            out.push_str(&string_literal(text));
            out.push(')');
        }
        Inline::Sequence(children) => {
            for child in children {
                inline_to_typst(child, out);
            }
        }
    }
}

/// Escape special Typst markup characters
fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '/' | '~' | '-'
            | '+' | '=' | '.' | '(' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
}

fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn color(color: &Color) -> String {
    format!("rgb(\"{}\")", color.hex())
}
