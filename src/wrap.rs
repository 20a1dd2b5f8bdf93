use crate::block::Inline;
use crate::flow::{Fragment, Run, RunStyle};

/// Soft-wrap one line to `width` characters.
///
/// Breaks fall before a whitespace run, which then leads the continuation
/// line, so joining the output gives back the input unchanged. Indentation
/// counts toward the budget. A token longer than `width` is split mid-word
/// only when `break_long` is set, otherwise it overflows.
pub fn wrap_line(line: &str, width: usize, break_long: bool) -> Vec<String> {
    let width = width.max(1);
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let mut wrapper = LineWrapper::new(width);
    let mut rest = line;
    while !rest.is_empty() {
        let space_end = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
        let (space, after) = rest.split_at(space_end);
        let word_end = after.find(char::is_whitespace).unwrap_or(after.len());
        let (word, after) = after.split_at(word_end);
        wrapper.place(space, word, break_long);
        rest = after;
    }
    wrapper.finish()
}

struct LineWrapper {
    width: usize,
    lines: Vec<String>,
    current: String,
    len: usize,
}

impl LineWrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: String::new(),
            len: 0,
        }
    }

    /// Place a whitespace run and the word that follows it.
    fn place(&mut self, space: &str, word: &str, break_long: bool) {
        let space_len = space.chars().count();
        let word_len = word.chars().count();

        if self.len > 0 && self.len + space_len + word_len > self.width {
            self.break_line();
        }
        self.fill(space);

        if break_long && word_len > self.width {
            self.fill(word);
            return;
        }
        // Only reached after a run of whitespace too long to share a line
        if self.len > 0 && self.len + word_len > self.width && word_len <= self.width {
            self.break_line();
        }
        self.current.push_str(word);
        self.len += word_len;
    }

    /// Append text a character at a time, breaking whenever the line is full.
    fn fill(&mut self, text: &str) {
        for c in text.chars() {
            if self.len >= self.width {
                self.break_line();
            }
            self.current.push(c);
            self.len += 1;
        }
    }

    fn break_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
        self.len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.lines.push(self.current);
        }
        self.lines
    }
}

/// Flatten an inline tree into styled runs.
pub fn flatten(inline: &Inline) -> Vec<Run> {
    let mut runs = Vec::new();
    flatten_into(inline, RunStyle::default(), &mut runs);
    runs
}

fn flatten_into(inline: &Inline, style: RunStyle, runs: &mut Vec<Run>) {
    match inline {
        Inline::Text(text) => push_run(runs, text, style),
        Inline::Code(text) => push_run(
            runs,
            text,
            RunStyle {
                code: true,
                ..style
            },
        ),
        Inline::Bold(inner) => flatten_into(
            inner,
            RunStyle {
                bold: true,
                ..style
            },
            runs,
        ),
        Inline::Italic(inner) => flatten_into(
            inner,
            RunStyle {
                italic: true,
                ..style
            },
            runs,
        ),
        Inline::Sequence(children) => {
            for child in children {
                flatten_into(child, style, runs);
            }
        }
    }
}

fn push_run(runs: &mut Vec<Run>, text: &str, style: RunStyle) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        // Code spans stay separate so they remain unbreakable units
        Some(last) if last.style == style && !style.code => last.text.push_str(text),
        _ => runs.push(Run {
            text: text.to_string(),
            style,
        }),
    }
}

/// Word-wrap styled runs to `width` characters, inserting line breaks.
///
/// Whitespace collapses to single spaces. Code runs are never split, and a
/// word longer than `width` stays whole.
pub fn wrap_runs(runs: &[Run], width: usize) -> Vec<Fragment> {
    let mut words: Vec<Vec<Run>> = Vec::new();
    let mut word: Vec<Run> = Vec::new();

    for run in runs {
        if run.style.code {
            word.push(run.clone());
            continue;
        }
        let mut piece = String::new();
        for c in run.text.chars() {
            if c.is_whitespace() {
                push_run(&mut word, &std::mem::take(&mut piece), run.style);
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                piece.push(c);
            }
        }
        push_run(&mut word, &piece, run.style);
    }
    if !word.is_empty() {
        words.push(word);
    }

    let mut fragments = Vec::new();
    let mut len = 0;
    for word in words {
        let word_len: usize = word.iter().map(|run| run.text.chars().count()).sum();
        if len > 0 && len + 1 + word_len > width {
            fragments.push(Fragment::LineBreak);
            len = 0;
        } else if len > 0 {
            fragments.push(Fragment::Run(Run::plain(" ")));
            len += 1;
        }
        fragments.extend(word.into_iter().map(Fragment::Run));
        len += word_len;
    }
    fragments
}
