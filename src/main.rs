use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use pulldown_cmark::{Event as MdEvent, Options, Parser as MdParser, Tag, TagEnd};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::prelude::{Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::block::Padding;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;

const PLACEHOLDER_NEW: &str = "<New>";
const PLACEHOLDER_DELETED: &str = "<Deleted>";

#[derive(Debug, Parser)]
#[command(
    name = "paradiff",
    version,
    about = "Compare two paragraph-structured documents and report changes"
)]
struct Cli {
    /// Original document (.md/.markdown/.mdx or plain text).
    original: PathBuf,

    /// Revised document.
    revised: PathBuf,

    /// Force the interactive viewer.
    #[arg(short, long)]
    interactive: bool,

    /// Force plain stdout rendering.
    #[arg(long)]
    plain: bool,

    /// Recompare when either input file changes (interactive only).
    #[arg(long)]
    watch: bool,

    /// Export instead of rendering to the terminal.
    #[arg(short, long, value_enum)]
    format: Option<ExportFormat>,

    /// Write the export to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show only paragraphs whose status is not Same.
    #[arg(long)]
    only_changes: bool,

    /// Locale for status labels and table headers in rendered output.
    #[arg(long, value_enum, default_value = "en")]
    labels: Locale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    /// Full change table as a standalone HTML page.
    Html,
    /// Raw records as comma-separated values.
    Csv,
    /// Changed paragraphs only, as a markdown table.
    Report,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Locale {
    En,
    Ko,
}

impl Locale {
    fn status_label(self, status: ChangeStatus) -> &'static str {
        match (self, status) {
            (Locale::En, ChangeStatus::Same) => "Same",
            (Locale::En, ChangeStatus::Modified) => "Modified",
            (Locale::En, ChangeStatus::Added) => "Added",
            (Locale::En, ChangeStatus::Deleted) => "Deleted",
            (Locale::Ko, ChangeStatus::Same) => "동일",
            (Locale::Ko, ChangeStatus::Modified) => "일부 수정",
            (Locale::Ko, ChangeStatus::Added) => "신설",
            (Locale::Ko, ChangeStatus::Deleted) => "삭제",
        }
    }

    fn headers(self) -> [&'static str; 3] {
        match self {
            Locale::En => ["Status", "Original", "Revised"],
            Locale::Ko => ["구분", "기존 문구", "개정 문구"],
        }
    }

    fn report_title(self) -> &'static str {
        match self {
            Locale::En => "Change report (modified/added/deleted paragraphs)",
            Locale::Ko => "변경 대비표 (수정/신설/삭제 항목)",
        }
    }

    fn no_changes(self) -> &'static str {
        match self {
            Locale::En => "No changed paragraphs.",
            Locale::Ko => "변경된 문단이 없습니다.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChangeStatus {
    Same,
    Modified,
    Added,
    Deleted,
}

impl ChangeStatus {
    fn canonical(self) -> &'static str {
        match self {
            ChangeStatus::Same => "Same",
            ChangeStatus::Modified => "Modified",
            ChangeStatus::Added => "Added",
            ChangeStatus::Deleted => "Deleted",
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            ChangeStatus::Same => "same",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Added => "added",
            ChangeStatus::Deleted => "deleted",
        }
    }

    fn color(self) -> Color {
        match self {
            ChangeStatus::Same => Color::Green,
            ChangeStatus::Modified => Color::Yellow,
            ChangeStatus::Added => Color::Blue,
            ChangeStatus::Deleted => Color::Red,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// One contiguous aligned region between the two sequences. Ranges are
/// half-open; consecutive opcodes partition both sequences exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Opcode {
    tag: OpTag,
    i1: usize,
    i2: usize,
    j1: usize,
    j2: usize,
}

/// A run of text that either matched or differed at the word level.
/// Markup (HTML underline, terminal bold) is applied only at rendering
/// boundaries, so plain-text export never has to strip tags.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Segment {
    text: String,
    emphasized: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct MarkedText {
    segments: Vec<Segment>,
}

impl MarkedText {
    fn from_plain(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            segments: vec![Segment {
                text: text.to_string(),
                emphasized: false,
            }],
        }
    }

    /// Appends one whitespace-delimited token. Separator spaces always land
    /// in unemphasized text so emphasis spans cover exactly the tokens that
    /// differ.
    fn push_word(&mut self, word: &str, emphasized: bool) {
        match self.segments.last_mut() {
            None => self.segments.push(Segment {
                text: word.to_string(),
                emphasized,
            }),
            Some(last) if last.emphasized == emphasized => {
                last.text.push(' ');
                last.text.push_str(word);
            }
            Some(last) if !last.emphasized => {
                last.text.push(' ');
                self.segments.push(Segment {
                    text: word.to_string(),
                    emphasized,
                });
            }
            Some(_) => self.segments.push(Segment {
                text: format!(" {word}"),
                emphasized: false,
            }),
        }
    }

    fn plain(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push_str(&segment.text);
        }
        out
    }

    fn to_html(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if segment.emphasized {
                out.push_str("<u>");
                out.push_str(&html_escape(&segment.text));
                out.push_str("</u>");
            } else {
                out.push_str(&html_escape(&segment.text));
            }
        }
        out
    }
}

/// One row of the change report. A missing side (`None`) means the
/// paragraph exists in only one version; serializers substitute the
/// placeholder markers.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ChangeRecord {
    status: ChangeStatus,
    original: Option<MarkedText>,
    revised: Option<MarkedText>,
}

impl ChangeRecord {
    fn original_plain(&self) -> String {
        match &self.original {
            Some(text) => text.plain(),
            None => PLACEHOLDER_NEW.to_string(),
        }
    }

    fn revised_plain(&self) -> String {
        match &self.revised {
            Some(text) => text.plain(),
            None => PLACEHOLDER_DELETED.to_string(),
        }
    }

    fn original_html(&self) -> String {
        match &self.original {
            Some(text) => text.to_html(),
            None => html_escape(PLACEHOLDER_NEW),
        }
    }

    fn revised_html(&self) -> String {
        match &self.revised {
            Some(text) => text.to_html(),
            None => html_escape(PLACEHOLDER_DELETED),
        }
    }
}

/// Longest-matching-blocks sequence aligner, used at paragraph granularity
/// by `align` and at token granularity by `highlight`.
struct Matcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> Matcher<'a, T> {
    fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<&T, Vec<usize>> = HashMap::new();
        for (j, item) in b.iter().enumerate() {
            b2j.entry(item).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    /// Finds the longest block of equal elements inside the given windows.
    /// Ties go to the earliest start in `a`, then the earliest start in `b`.
    fn longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let mut best_i = alo;
        let mut best_j = blo;
        let mut best_size = 0usize;

        // j2len[j] = length of the match ending at a[i-1], b[j].
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut row: HashMap<usize, usize> = HashMap::new();
            if let Some(indices) = self.b2j.get(&self.a[i]) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    row.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = row;
        }

        (best_i, best_j, best_size)
    }

    /// Maximal non-overlapping matching blocks in order, terminated by a
    /// zero-length sentinel at (len(a), len(b)).
    fn matching_blocks(&self) -> Vec<(usize, usize, usize)> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, size) = self.longest_match(alo, ahi, blo, bhi);
            if size > 0 {
                blocks.push((i, j, size));
                if alo < i && blo < j {
                    pending.push((alo, i, blo, j));
                }
                if i + size < ahi && j + size < bhi {
                    pending.push((i + size, ahi, j + size, bhi));
                }
            }
        }

        blocks.sort_unstable();

        // Adjacent blocks collapse into one.
        let mut merged: Vec<(usize, usize, usize)> = Vec::new();
        for (i, j, size) in blocks {
            match merged.last_mut() {
                Some((mi, mj, msize)) if *mi + *msize == i && *mj + *msize == j => {
                    *msize += size;
                }
                _ => merged.push((i, j, size)),
            }
        }

        merged.push((self.a.len(), self.b.len(), 0));
        merged
    }

    fn opcodes(&self) -> Vec<Opcode> {
        let mut out = Vec::new();
        let mut i = 0;
        let mut j = 0;

        for (ai, bj, size) in self.matching_blocks() {
            let tag = match (i < ai, j < bj) {
                (true, true) => Some(OpTag::Replace),
                (true, false) => Some(OpTag::Delete),
                (false, true) => Some(OpTag::Insert),
                (false, false) => None,
            };
            if let Some(tag) = tag {
                out.push(Opcode {
                    tag,
                    i1: i,
                    i2: ai,
                    j1: j,
                    j2: bj,
                });
            }
            i = ai + size;
            j = bj + size;
            if size > 0 {
                out.push(Opcode {
                    tag: OpTag::Equal,
                    i1: ai,
                    i2: i,
                    j1: bj,
                    j2: j,
                });
            }
        }

        out
    }
}

fn align(original: &[String], revised: &[String]) -> Vec<Opcode> {
    Matcher::new(original, revised).opcodes()
}

/// Word-level diff of two paragraphs. Tokens are maximal non-whitespace
/// runs; output is the space-joined tokens in original order with differing
/// tokens emphasized on their own side.
fn highlight(a: &str, b: &str) -> (MarkedText, MarkedText) {
    let a_words: Vec<&str> = a.split_whitespace().collect();
    let b_words: Vec<&str> = b.split_whitespace().collect();

    let mut a_out = MarkedText::default();
    let mut b_out = MarkedText::default();

    for op in Matcher::new(&a_words, &b_words).opcodes() {
        if matches!(op.tag, OpTag::Equal | OpTag::Replace | OpTag::Delete) {
            let emphasized = op.tag != OpTag::Equal;
            for word in &a_words[op.i1..op.i2] {
                a_out.push_word(word, emphasized);
            }
        }
        if matches!(op.tag, OpTag::Equal | OpTag::Replace | OpTag::Insert) {
            let emphasized = op.tag != OpTag::Equal;
            for word in &b_words[op.j1..op.j2] {
                b_out.push_word(word, emphasized);
            }
        }
    }

    (a_out, b_out)
}

/// Paragraph equality ignoring leading/trailing/interior whitespace runs,
/// so a whitespace-only edit does not count as a visible change.
fn whitespace_eq(a: &str, b: &str) -> bool {
    a.split_whitespace().eq(b.split_whitespace())
}

fn classify(original: &[String], revised: &[String], opcodes: &[Opcode]) -> Vec<ChangeRecord> {
    let mut records = Vec::new();

    for op in opcodes {
        match op.tag {
            OpTag::Equal => {
                for (i, j) in (op.i1..op.i2).zip(op.j1..op.j2) {
                    records.push(ChangeRecord {
                        status: ChangeStatus::Same,
                        original: Some(MarkedText::from_plain(&original[i])),
                        revised: Some(MarkedText::from_plain(&revised[j])),
                    });
                }
            }
            OpTag::Replace => {
                let len1 = op.i2 - op.i1;
                let len2 = op.j2 - op.j1;
                let paired = len1.min(len2);

                for k in 0..paired {
                    let orig = &original[op.i1 + k];
                    let rev = &revised[op.j1 + k];
                    if whitespace_eq(orig, rev) {
                        records.push(ChangeRecord {
                            status: ChangeStatus::Same,
                            original: Some(MarkedText::from_plain(orig)),
                            revised: Some(MarkedText::from_plain(rev)),
                        });
                    } else {
                        let (marked_orig, marked_rev) = highlight(orig, rev);
                        records.push(ChangeRecord {
                            status: ChangeStatus::Modified,
                            original: Some(marked_orig),
                            revised: Some(marked_rev),
                        });
                    }
                }
                for k in paired..len1 {
                    records.push(ChangeRecord {
                        status: ChangeStatus::Deleted,
                        original: Some(MarkedText::from_plain(&original[op.i1 + k])),
                        revised: None,
                    });
                }
                for k in paired..len2 {
                    records.push(ChangeRecord {
                        status: ChangeStatus::Added,
                        original: None,
                        revised: Some(MarkedText::from_plain(&revised[op.j1 + k])),
                    });
                }
            }
            OpTag::Delete => {
                for i in op.i1..op.i2 {
                    records.push(ChangeRecord {
                        status: ChangeStatus::Deleted,
                        original: Some(MarkedText::from_plain(&original[i])),
                        revised: None,
                    });
                }
            }
            OpTag::Insert => {
                for j in op.j1..op.j2 {
                    records.push(ChangeRecord {
                        status: ChangeStatus::Added,
                        original: None,
                        revised: Some(MarkedText::from_plain(&revised[j])),
                    });
                }
            }
        }
    }

    records
}

fn compare(original: &[String], revised: &[String]) -> Vec<ChangeRecord> {
    classify(original, revised, &align(original, revised))
}

fn flush_block(buf: &mut String, out: &mut Vec<String>) {
    let joined = buf.split_whitespace().collect::<Vec<_>>().join(" ");
    buf.clear();
    if !joined.is_empty() {
        out.push(joined);
    }
}

/// Markdown extraction: every paragraph, heading, list item, and code block
/// becomes one comparison unit.
fn markdown_paragraphs(source: &str) -> Vec<String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = MdParser::new_ext(source, options);
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for md_event in parser {
        match md_event {
            MdEvent::Start(
                Tag::Paragraph | Tag::Heading { .. } | Tag::Item | Tag::CodeBlock(_),
            ) => {
                flush_block(&mut current, &mut paragraphs);
            }
            MdEvent::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
            ) => {
                flush_block(&mut current, &mut paragraphs);
            }
            MdEvent::Text(text)
            | MdEvent::Code(text)
            | MdEvent::Html(text)
            | MdEvent::InlineHtml(text) => current.push_str(&text),
            MdEvent::SoftBreak | MdEvent::HardBreak => current.push(' '),
            MdEvent::Rule => flush_block(&mut current, &mut paragraphs),
            _ => {}
        }
    }
    flush_block(&mut current, &mut paragraphs);

    paragraphs
}

/// Plain-text extraction: blank-line-separated chunks, interior newlines
/// collapsed.
fn plain_paragraphs(source: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in source.lines() {
        if line.trim().is_empty() {
            flush_block(&mut current, &mut paragraphs);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line);
        }
    }
    flush_block(&mut current, &mut paragraphs);

    paragraphs
}

fn extract_paragraphs(path: &Path, source: &str) -> Vec<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("md" | "markdown" | "mdx") => markdown_paragraphs(source),
        _ => plain_paragraphs(source),
    }
}

fn load_paragraphs(path: &Path) -> Result<Vec<String>> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(extract_paragraphs(path, &source))
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const HTML_STYLE: &str = "\
table { width: 100%; border-collapse: collapse; margin-bottom: 2rem; font-size: 15px; }
th, td { border: 1px solid #ccc; padding: 0.75rem; vertical-align: top; text-align: left; }
th { background-color: #f2f2f2; }
tr.same { background-color: #d0f0c0; }
tr.modified { background-color: #fff3cd; }
tr.added { background-color: #b3d9ff; }
tr.deleted { background-color: #ffcccc; }
u { text-decoration: underline; font-weight: bold; }
";

fn render_html(records: &[ChangeRecord], locale: Locale) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>paradiff</title>\n<style>\n",
    );
    out.push_str(HTML_STYLE);
    out.push_str("</style>\n</head>\n<body>\n<table>\n<thead>\n<tr>");
    for header in locale.headers() {
        out.push_str("<th>");
        out.push_str(&html_escape(header));
        out.push_str("</th>");
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for record in records {
        out.push_str(&format!(
            "<tr class='{}'><td><b>{}</b></td><td>{}</td><td>{}</td></tr>\n",
            record.status.css_class(),
            html_escape(locale.status_label(record.status)),
            record.original_html(),
            record.revised_html(),
        ));
    }

    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// CSV always carries canonical status names and plain text, placeholders
/// included.
fn render_csv(records: &[ChangeRecord]) -> String {
    let mut out = String::from("Status,Original,Revised\n");
    for record in records {
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(record.status.canonical()),
            csv_field(&record.original_plain()),
            csv_field(&record.revised_plain()),
        ));
    }
    out
}

fn md_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// The filtered export: changed paragraphs only, as a markdown document
/// with a fixed 3-column table.
fn render_report(records: &[ChangeRecord], locale: Locale) -> String {
    let mut out = format!("# {}\n\n", locale.report_title());

    let changed: Vec<&ChangeRecord> = records
        .iter()
        .filter(|record| record.status != ChangeStatus::Same)
        .collect();

    if changed.is_empty() {
        out.push_str(locale.no_changes());
        out.push('\n');
        return out;
    }

    let headers = locale.headers();
    out.push_str(&format!(
        "| {} | {} | {} |\n| --- | --- | --- |\n",
        headers[0], headers[1], headers[2]
    ));
    for record in changed {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            md_cell(locale.status_label(record.status)),
            md_cell(&record.original_plain()),
            md_cell(&record.revised_plain()),
        ));
    }
    out
}

fn status_counts(records: &[ChangeRecord]) -> (usize, usize, usize, usize) {
    let mut counts = (0, 0, 0, 0);
    for record in records {
        match record.status {
            ChangeStatus::Same => counts.0 += 1,
            ChangeStatus::Modified => counts.1 += 1,
            ChangeStatus::Added => counts.2 += 1,
            ChangeStatus::Deleted => counts.3 += 1,
        }
    }
    counts
}

fn summary_line(records: &[ChangeRecord]) -> String {
    let (same, modified, added, deleted) = status_counts(records);
    format!("{same} same, {modified} modified, {added} added, {deleted} deleted")
}

/// Width-padded text table for non-interactive terminals.
fn render_plain_table(records: &[ChangeRecord], locale: Locale, only_changes: bool) -> String {
    let headers = locale.headers();
    let mut rows: Vec<[String; 3]> = vec![[
        headers[0].to_string(),
        headers[1].to_string(),
        headers[2].to_string(),
    ]];
    for record in records {
        if only_changes && record.status == ChangeStatus::Same {
            continue;
        }
        rows.push([
            locale.status_label(record.status).to_string(),
            record.original_plain(),
            record.revised_plain(),
        ]);
    }

    let mut widths = [3usize; 3];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for (idx, row) in rows.iter().enumerate() {
        out.push('|');
        for (col, cell) in row.iter().enumerate() {
            let width = widths[col];
            out.push_str(&format!(" {cell:<width$} |"));
        }
        out.push('\n');
        if idx == 0 {
            out.push('|');
            for width in widths {
                out.push_str(&format!(" {} |", "-".repeat(width)));
            }
            out.push('\n');
        }
    }
    out.push('\n');
    out.push_str(&summary_line(records));
    out.push('\n');
    out
}

#[derive(Clone, Debug)]
struct StyledSegment {
    text: String,
    style: Style,
}

#[derive(Clone, Debug, Default)]
struct DisplayLine {
    segments: Vec<StyledSegment>,
    plain: String,
}

fn push_segment(line: &mut DisplayLine, text: &str, style: Style) {
    if text.is_empty() {
        return;
    }
    line.plain.push_str(text);
    line.segments.push(StyledSegment {
        text: text.to_string(),
        style,
    });
}

fn side_line(prefix: &str, text: Option<&MarkedText>, placeholder: &str) -> DisplayLine {
    let mut line = DisplayLine::default();
    push_segment(&mut line, prefix, Style::default().fg(Color::DarkGray));
    match text {
        Some(marked) => {
            for segment in &marked.segments {
                let style = if segment.emphasized {
                    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    Style::default()
                };
                push_segment(&mut line, &segment.text, style);
            }
        }
        None => push_segment(
            &mut line,
            placeholder,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
    }
    line
}

fn build_display_lines(
    records: &[ChangeRecord],
    only_changes: bool,
    locale: Locale,
) -> Vec<DisplayLine> {
    let mut lines = Vec::new();

    for record in records {
        if only_changes && record.status == ChangeStatus::Same {
            continue;
        }

        let mut header = DisplayLine::default();
        push_segment(
            &mut header,
            locale.status_label(record.status),
            Style::default()
                .fg(record.status.color())
                .add_modifier(Modifier::BOLD),
        );
        lines.push(header);
        lines.push(side_line("  - ", record.original.as_ref(), PLACEHOLDER_NEW));
        lines.push(side_line(
            "  + ",
            record.revised.as_ref(),
            PLACEHOLDER_DELETED,
        ));
        lines.push(DisplayLine::default());
    }

    if lines.is_empty() {
        let mut empty = DisplayLine::default();
        push_segment(
            &mut empty,
            "(no records to show)",
            Style::default().fg(Color::DarkGray),
        );
        lines.push(empty);
    }

    lines
}

struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

fn pad_rect(area: Rect, horizontal: u16) -> Rect {
    Rect {
        x: area.x.saturating_add(horizontal),
        y: area.y,
        width: area.width.saturating_sub(horizontal.saturating_mul(2)),
        height: area.height,
    }
}

fn line_to_u16(line: usize) -> u16 {
    u16::try_from(line).unwrap_or(u16::MAX)
}

struct App {
    original_path: PathBuf,
    revised_path: PathBuf,
    locale: Locale,
    watch: bool,

    records: Vec<ChangeRecord>,
    lines: Vec<DisplayLine>,
    only_changes: bool,

    scroll: u16,
    viewport_height: u16,

    search_mode: bool,
    search_query: String,
    search_matches: Vec<usize>,
    current_match: usize,

    status: String,

    watcher: Option<FileWatcher>,
    watch_requested: bool,
}

impl App {
    fn new(cli: &Cli, records: Vec<ChangeRecord>) -> Self {
        let lines = build_display_lines(&records, cli.only_changes, cli.labels);
        Self {
            original_path: cli.original.clone(),
            revised_path: cli.revised.clone(),
            locale: cli.labels,
            watch: cli.watch,
            records,
            lines,
            only_changes: cli.only_changes,
            scroll: 0,
            viewport_height: 1,
            search_mode: false,
            search_query: String::new(),
            search_matches: Vec::new(),
            current_match: 0,
            status: String::new(),
            watcher: None,
            watch_requested: false,
        }
    }

    fn max_scroll(&self) -> u16 {
        let total = self.lines.len();
        let visible = self.viewport_height.max(1) as usize;
        line_to_u16(total.saturating_sub(visible))
    }

    fn set_scroll(&mut self, scroll: u16) {
        self.scroll = scroll.min(self.max_scroll());
    }

    fn set_scroll_to_line(&mut self, line: usize) {
        self.set_scroll(line_to_u16(line));
    }

    fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn rebuild_lines(&mut self) {
        self.lines = build_display_lines(&self.records, self.only_changes, self.locale);
        self.update_search_matches();
        self.clamp_scroll();
    }

    fn reload(&mut self) -> Result<()> {
        let original = load_paragraphs(&self.original_path)?;
        let revised = load_paragraphs(&self.revised_path)?;
        self.records = compare(&original, &revised);
        self.rebuild_lines();
        self.status = format!("Recompared: {}", summary_line(&self.records));
        Ok(())
    }

    fn ensure_watcher(&mut self) -> Result<()> {
        if !self.watch {
            self.watcher = None;
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&self.original_path, RecursiveMode::NonRecursive)?;
        watcher.watch(&self.revised_path, RecursiveMode::NonRecursive)?;
        self.watcher = Some(FileWatcher {
            _watcher: watcher,
            rx,
        });
        Ok(())
    }

    fn poll_watch(&mut self) {
        if let Some(watcher) = self.watcher.as_mut() {
            while let Ok(watch_event) = watcher.rx.try_recv() {
                if watch_event.is_ok() {
                    self.watch_requested = true;
                }
            }
        }
    }

    fn update_search_matches(&mut self) {
        if self.search_query.is_empty() {
            self.search_matches.clear();
            self.current_match = 0;
            return;
        }

        let needle = self.search_query.to_lowercase();
        self.search_matches = self
            .lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                if line.plain.to_lowercase().contains(&needle) {
                    Some(idx)
                } else {
                    None
                }
            })
            .collect();

        if self.search_matches.is_empty() {
            self.current_match = 0;
            return;
        }

        self.current_match = self
            .current_match
            .min(self.search_matches.len().saturating_sub(1));
        self.set_scroll_to_line(self.search_matches[self.current_match]);
    }

    fn jump_to_next_match(&mut self, reverse: bool) {
        if self.search_matches.is_empty() {
            return;
        }

        if reverse {
            if self.current_match == 0 {
                self.current_match = self.search_matches.len().saturating_sub(1);
            } else {
                self.current_match -= 1;
            }
        } else {
            self.current_match = (self.current_match + 1) % self.search_matches.len();
        }
        self.set_scroll_to_line(self.search_matches[self.current_match]);
    }

    fn toggle_filter(&mut self) {
        self.only_changes = !self.only_changes;
        self.rebuild_lines();
        self.status = if self.only_changes {
            "Showing changed paragraphs only".to_string()
        } else {
            "Showing all paragraphs".to_string()
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let root = pad_rect(frame.size(), 1);
        let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(root);

        self.viewport_height = chunks[0].height.saturating_sub(1).max(1);
        self.clamp_scroll();
        self.draw_content(frame, chunks[0]);
        self.draw_status(frame, pad_rect(chunks[1], 1));
    }

    fn draw_content(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines: Vec<Line> = self
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let is_match = self.search_matches.binary_search(&idx).is_ok();

                let spans = if line.segments.is_empty() {
                    vec![Span::raw("")]
                } else {
                    line.segments
                        .iter()
                        .map(|segment| {
                            let mut style = segment.style;
                            if is_match {
                                style = style.bg(Color::Rgb(40, 40, 40));
                            }
                            Span::styled(segment.text.clone(), style)
                        })
                        .collect()
                };
                Line::from(spans)
            })
            .collect();

        let paragraph = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .title(" paradiff ")
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .padding(Padding::new(1, 1, 0, 0)),
            )
            .scroll((self.scroll, 0))
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, area);
    }

    fn draw_status(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let files = format!(
            "{} -> {}",
            self.original_path.display(),
            self.revised_path.display()
        );

        let filter_hint = if self.only_changes {
            " filter:changes"
        } else {
            ""
        };
        let watch_hint = if self.watch { " watch:on" } else { "" };

        let search_hint = if self.search_mode {
            format!(" /{}", self.search_query)
        } else if self.search_query.is_empty() {
            String::new()
        } else {
            format!(
                " search='{}' {}/{}",
                self.search_query,
                if self.search_matches.is_empty() {
                    0
                } else {
                    self.current_match + 1
                },
                self.search_matches.len()
            )
        };

        let status_text = if self.status.is_empty() {
            format!(
                "{files} | {}{filter_hint}{search_hint}{watch_hint}",
                summary_line(&self.records)
            )
        } else {
            format!(
                "{files} | {}{filter_hint}{search_hint}{watch_hint} | {}",
                summary_line(&self.records),
                self.status
            )
        };

        frame.render_widget(
            Paragraph::new(format!(" {status_text}")).style(Style::default().fg(Color::Gray)),
            area,
        );
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.search_mode = false;
            }
            KeyCode::Backspace => {
                self.search_query.pop();
                self.current_match = 0;
                self.update_search_matches();
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.search_query.push(c);
                self.current_match = 0;
                self.update_search_matches();
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.search_mode {
            self.handle_search_input(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.set_scroll(self.scroll.saturating_add(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.set_scroll(self.scroll.saturating_sub(1));
            }
            KeyCode::Char('g') => {
                self.set_scroll(0);
            }
            KeyCode::Char('G') => {
                self.set_scroll(self.max_scroll());
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let delta = self.viewport_height.saturating_div(2).max(1);
                self.set_scroll(self.scroll.saturating_add(delta));
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let delta = self.viewport_height.saturating_div(2).max(1);
                self.set_scroll(self.scroll.saturating_sub(delta));
            }
            KeyCode::Char('c') => {
                self.toggle_filter();
            }
            KeyCode::Char('r') => {
                if let Err(err) = self.reload() {
                    self.status = format!("Recompare failed: {err:#}");
                }
            }
            KeyCode::Char('/') => {
                self.search_mode = true;
                self.search_query.clear();
                self.search_matches.clear();
                self.current_match = 0;
            }
            KeyCode::Char('n') => {
                self.jump_to_next_match(false);
            }
            KeyCode::Char('N') => {
                self.jump_to_next_match(true);
            }
            _ => {}
        }

        false
    }
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

fn run_interactive(mut app: App) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    app.ensure_watcher()?;

    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.watch_requested {
            if let Err(err) = app.reload() {
                app.status = format!("Recompare failed: {err:#}");
            }
            app.watch_requested = false;
        }

        app.poll_watch();

        if event::poll(Duration::from_millis(120))? {
            match event::read()? {
                CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn filtered(records: &[ChangeRecord], only_changes: bool) -> Vec<ChangeRecord> {
    if !only_changes {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| record.status != ChangeStatus::Same)
        .cloned()
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.interactive && cli.plain {
        return Err(anyhow!("--interactive and --plain cannot be used together"));
    }
    if cli.interactive && cli.format.is_some() {
        return Err(anyhow!(
            "--interactive and --format cannot be used together"
        ));
    }
    if cli.output.is_some() && cli.format.is_none() {
        return Err(anyhow!("--output requires --format"));
    }
    if cli.watch && (cli.plain || cli.format.is_some()) {
        return Err(anyhow!("--watch requires the interactive viewer"));
    }

    let original = load_paragraphs(&cli.original)?;
    let revised = load_paragraphs(&cli.revised)?;
    let records = compare(&original, &revised);

    if let Some(format) = cli.format {
        let rendered = match format {
            ExportFormat::Html => render_html(&filtered(&records, cli.only_changes), cli.labels),
            ExportFormat::Csv => render_csv(&filtered(&records, cli.only_changes)),
            ExportFormat::Report => render_report(&records, cli.labels),
        };
        match &cli.output {
            Some(path) => fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => print!("{rendered}"),
        }
        return Ok(());
    }

    let interactive = if cli.interactive {
        true
    } else if cli.plain {
        false
    } else {
        io::stdout().is_terminal()
    };

    if !interactive {
        print!(
            "{}",
            render_plain_table(&records, cli.labels, cli.only_changes)
        );
        return Ok(());
    }

    let app = App::new(&cli, records);
    run_interactive(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paras(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn emphasized_words(text: &MarkedText) -> Vec<String> {
        text.segments
            .iter()
            .filter(|segment| segment.emphasized)
            .flat_map(|segment| segment.text.split_whitespace().map(str::to_string))
            .collect()
    }

    fn tags(opcodes: &[Opcode]) -> Vec<OpTag> {
        opcodes.iter().map(|op| op.tag).collect()
    }

    fn statuses(records: &[ChangeRecord]) -> Vec<ChangeStatus> {
        records.iter().map(|record| record.status).collect()
    }

    #[test]
    fn identity_alignment_is_one_equal_opcode() {
        let x = paras(&["alpha", "beta", "gamma"]);
        let opcodes = align(&x, &x);
        assert_eq!(
            opcodes,
            vec![Opcode {
                tag: OpTag::Equal,
                i1: 0,
                i2: 3,
                j1: 0,
                j2: 3
            }]
        );

        let records = classify(&x, &x, &opcodes);
        assert_eq!(records.len(), 3);
        for (record, para) in records.iter().zip(&x) {
            assert_eq!(record.status, ChangeStatus::Same);
            assert_eq!(record.original.as_ref().unwrap().plain(), *para);
            assert_eq!(record.revised.as_ref().unwrap().plain(), *para);
        }
    }

    #[test]
    fn opcodes_partition_both_sequences() {
        let original = paras(&["intro", "kept one", "dropped", "kept two", "tail"]);
        let revised = paras(&["intro", "kept one", "kept two", "brand new", "tail"]);
        let opcodes = align(&original, &revised);

        let mut i = 0;
        let mut j = 0;
        for op in &opcodes {
            assert_eq!(op.i1, i);
            assert_eq!(op.j1, j);
            match op.tag {
                OpTag::Equal | OpTag::Replace => {
                    assert!(op.i2 > op.i1);
                    assert!(op.j2 > op.j1);
                }
                OpTag::Delete => {
                    assert!(op.i2 > op.i1);
                    assert_eq!(op.j1, op.j2);
                }
                OpTag::Insert => {
                    assert_eq!(op.i1, op.i2);
                    assert!(op.j2 > op.j1);
                }
            }
            i = op.i2;
            j = op.j2;
        }
        assert_eq!(i, original.len());
        assert_eq!(j, revised.len());
    }

    #[test]
    fn pure_insertion() {
        let original: Vec<String> = Vec::new();
        let revised = paras(&["a", "b"]);
        let opcodes = align(&original, &revised);
        assert_eq!(
            opcodes,
            vec![Opcode {
                tag: OpTag::Insert,
                i1: 0,
                i2: 0,
                j1: 0,
                j2: 2
            }]
        );

        let records = classify(&original, &revised, &opcodes);
        assert_eq!(statuses(&records), vec![ChangeStatus::Added; 2]);
        for record in &records {
            assert!(record.original.is_none());
            assert_eq!(record.original_plain(), PLACEHOLDER_NEW);
        }
        assert_eq!(records[0].revised.as_ref().unwrap().plain(), "a");
        assert_eq!(records[1].revised.as_ref().unwrap().plain(), "b");
    }

    #[test]
    fn pure_deletion() {
        let original = paras(&["a", "b"]);
        let revised: Vec<String> = Vec::new();
        let opcodes = align(&original, &revised);
        assert_eq!(
            opcodes,
            vec![Opcode {
                tag: OpTag::Delete,
                i1: 0,
                i2: 2,
                j1: 0,
                j2: 0
            }]
        );

        let records = classify(&original, &revised, &opcodes);
        assert_eq!(statuses(&records), vec![ChangeStatus::Deleted; 2]);
        for record in &records {
            assert!(record.revised.is_none());
            assert_eq!(record.revised_plain(), PLACEHOLDER_DELETED);
        }
    }

    #[test]
    fn empty_inputs_produce_no_records() {
        let empty: Vec<String> = Vec::new();
        assert!(align(&empty, &empty).is_empty());
        assert!(compare(&empty, &empty).is_empty());
    }

    #[test]
    fn replace_parity() {
        let original = paras(&["a"]);
        let revised = paras(&["b"]);
        let opcodes = align(&original, &revised);
        assert_eq!(
            opcodes,
            vec![Opcode {
                tag: OpTag::Replace,
                i1: 0,
                i2: 1,
                j1: 0,
                j2: 1
            }]
        );

        let records = classify(&original, &revised, &opcodes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ChangeStatus::Modified);
        assert_eq!(
            emphasized_words(records[0].original.as_ref().unwrap()),
            vec!["a"]
        );
        assert_eq!(
            emphasized_words(records[0].revised.as_ref().unwrap()),
            vec!["b"]
        );
    }

    #[test]
    fn whitespace_only_replace_collapses_to_same() {
        let original = paras(&["a  b"]);
        let revised = paras(&["a b"]);
        let records = compare(&original, &revised);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ChangeStatus::Same);
        assert_eq!(records[0].original.as_ref().unwrap().plain(), "a  b");
        assert_eq!(records[0].revised.as_ref().unwrap().plain(), "a b");
    }

    #[test]
    fn uneven_replace_pairs_then_deletes() {
        let original = paras(&["one", "two", "three"]);
        let revised = paras(&["uno"]);
        let records = compare(&original, &revised);
        assert_eq!(
            statuses(&records),
            vec![
                ChangeStatus::Modified,
                ChangeStatus::Deleted,
                ChangeStatus::Deleted
            ]
        );
        assert_eq!(records[1].original.as_ref().unwrap().plain(), "two");
        assert_eq!(records[2].original.as_ref().unwrap().plain(), "three");
    }

    #[test]
    fn uneven_replace_pairs_then_adds() {
        let original = paras(&["one"]);
        let revised = paras(&["uno", "dos", "tres"]);
        let records = compare(&original, &revised);
        assert_eq!(
            statuses(&records),
            vec![
                ChangeStatus::Modified,
                ChangeStatus::Added,
                ChangeStatus::Added
            ]
        );
        assert!(records[1].original.is_none());
        assert!(records[2].original.is_none());
    }

    #[test]
    fn mixed_edit_keeps_document_order() {
        let original = paras(&["intro", "body", "tail"]);
        let revised = paras(&["intro", "body two", "tail"]);
        let opcodes = align(&original, &revised);
        assert_eq!(
            tags(&opcodes),
            vec![OpTag::Equal, OpTag::Replace, OpTag::Equal]
        );

        let records = classify(&original, &revised, &opcodes);
        assert_eq!(
            statuses(&records),
            vec![
                ChangeStatus::Same,
                ChangeStatus::Modified,
                ChangeStatus::Same
            ]
        );
    }

    #[test]
    fn repeated_paragraphs_align_earliest_first() {
        let original = paras(&["x", "x"]);
        let revised = paras(&["x"]);
        let opcodes = align(&original, &revised);
        assert_eq!(tags(&opcodes), vec![OpTag::Equal, OpTag::Delete]);
        assert_eq!(opcodes[0].i1, 0);
        assert_eq!(opcodes[0].i2, 1);
    }

    #[test]
    fn record_sides_reconstruct_inputs() {
        let original = paras(&["intro", "old body", "shared", "goner"]);
        let revised = paras(&["intro", "new body", "shared", "fresh one", "fresh two"]);
        let records = compare(&original, &revised);

        let normalize = |text: &MarkedText| {
            text.plain()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        };

        let rebuilt_original: Vec<String> = records
            .iter()
            .filter_map(|record| record.original.as_ref())
            .map(normalize)
            .collect();
        assert_eq!(rebuilt_original, original);

        let rebuilt_revised: Vec<String> = records
            .iter()
            .filter_map(|record| record.revised.as_ref())
            .map(normalize)
            .collect();
        assert_eq!(rebuilt_revised, revised);
    }

    #[test]
    fn compare_is_deterministic() {
        let original = paras(&["a b c", "d", "e f", "d", "g"]);
        let revised = paras(&["a x c", "e f", "d", "h", "g"]);
        let first = compare(&original, &revised);
        let second = compare(&original, &revised);
        assert_eq!(first, second);
    }

    #[test]
    fn highlighter_marks_only_differing_words() {
        let (a_out, b_out) = highlight("the quick fox", "the slow fox");
        assert_eq!(a_out.plain(), "the quick fox");
        assert_eq!(b_out.plain(), "the slow fox");
        assert_eq!(emphasized_words(&a_out), vec!["quick"]);
        assert_eq!(emphasized_words(&b_out), vec!["slow"]);
    }

    #[test]
    fn highlighter_empty_inputs() {
        let (a_out, b_out) = highlight("", "");
        assert!(a_out.segments.is_empty());
        assert!(b_out.segments.is_empty());
        assert_eq!(a_out.plain(), "");
        assert_eq!(b_out.plain(), "");
    }

    #[test]
    fn highlighter_handles_pure_insertion_of_words() {
        let (a_out, b_out) = highlight("alpha beta", "alpha middle beta");
        assert!(emphasized_words(&a_out).is_empty());
        assert_eq!(emphasized_words(&b_out), vec!["middle"]);
        assert_eq!(b_out.plain(), "alpha middle beta");
    }

    #[test]
    fn highlighter_html_wraps_changed_words() {
        let (a_out, b_out) = highlight("the quick fox", "the slow fox");
        assert_eq!(a_out.to_html(), "the <u>quick</u> fox");
        assert_eq!(b_out.to_html(), "the <u>slow</u> fox");
    }

    #[test]
    fn cjk_text_tokenizes_by_whitespace_only() {
        let (a_out, b_out) = highlight("기존 문구 유지", "개정 문구 유지");
        assert_eq!(emphasized_words(&a_out), vec!["기존"]);
        assert_eq!(emphasized_words(&b_out), vec!["개정"]);
    }

    #[test]
    fn plain_text_extraction_splits_on_blank_lines() {
        let source = "first line\nstill first\n\n\nsecond\n";
        assert_eq!(
            plain_paragraphs(source),
            paras(&["first line still first", "second"])
        );
        assert!(plain_paragraphs("").is_empty());
        assert!(plain_paragraphs("  \n\t\n").is_empty());
    }

    #[test]
    fn markdown_extraction_yields_block_units() {
        let source = "# Title\n\npara one\nline two\n\n- item a\n- item b\n";
        assert_eq!(
            markdown_paragraphs(source),
            paras(&["Title", "para one line two", "item a", "item b"])
        );
    }

    #[test]
    fn extraction_dispatches_on_extension() {
        let md = extract_paragraphs(Path::new("doc.md"), "# Heading\n\nbody\n");
        assert_eq!(md, paras(&["Heading", "body"]));

        let txt = extract_paragraphs(Path::new("doc.txt"), "# Heading\n\nbody\n");
        assert_eq!(txt, paras(&["# Heading", "body"]));
    }

    #[test]
    fn html_export_escapes_and_classifies_rows() {
        let records = compare(
            &paras(&["<b>bold</b> stays", "gone"]),
            &paras(&["<b>bold</b> stays"]),
        );
        let html = render_html(&records, Locale::En);
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt; stays"));
        assert!(!html.contains("<td><b>bold</b>"));
        assert!(html.contains("<tr class='same'>"));
        assert!(html.contains("<tr class='deleted'>"));
        assert!(html.contains("&lt;Deleted&gt;"));
    }

    #[test]
    fn csv_export_quotes_and_uses_canonical_names() {
        let records = compare(&paras(&["a, \"b\""]), &paras(&["c"]));
        let csv = render_csv(&records);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Status,Original,Revised"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Modified,"));
        assert!(row.contains("\"a, \"\"b\"\"\""));
    }

    #[test]
    fn csv_export_emits_placeholders() {
        let records = compare(&paras(&[]), &paras(&["added"]));
        let csv = render_csv(&records);
        assert!(csv.contains("Added,<New>,added"));
    }

    #[test]
    fn report_contains_only_changed_rows() {
        let records = compare(&paras(&["kept", "old"]), &paras(&["kept", "new", "extra"]));
        let report = render_report(&records, Locale::En);
        assert!(report.contains("| Modified |"));
        assert!(report.contains("| Added |"));
        assert!(!report.contains("| Same |"));
    }

    #[test]
    fn report_for_identical_documents_says_no_changes() {
        let same = paras(&["only"]);
        let records = compare(&same, &same);
        let report = render_report(&records, Locale::Ko);
        assert!(report.contains("변경된 문단이 없습니다."));
        assert!(report.contains("변경 대비표"));
    }

    #[test]
    fn localized_labels_map_canonical_statuses() {
        assert_eq!(Locale::Ko.status_label(ChangeStatus::Modified), "일부 수정");
        assert_eq!(Locale::Ko.status_label(ChangeStatus::Added), "신설");
        assert_eq!(Locale::En.status_label(ChangeStatus::Deleted), "Deleted");
        assert_eq!(Locale::Ko.headers(), ["구분", "기존 문구", "개정 문구"]);
    }

    #[test]
    fn plain_table_filters_and_summarizes() {
        let records = compare(&paras(&["kept", "old"]), &paras(&["kept", "new"]));
        let all = render_plain_table(&records, Locale::En, false);
        assert!(all.contains("kept"));
        assert!(all.contains("1 same, 1 modified, 0 added, 0 deleted"));

        let changed = render_plain_table(&records, Locale::En, true);
        assert!(!changed.contains("| Same"));
        assert!(changed.contains("Modified"));
        // Counts still describe the whole comparison.
        assert!(changed.contains("1 same, 1 modified, 0 added, 0 deleted"));
    }

    #[test]
    fn display_lines_render_placeholders_and_filter() {
        let records = compare(&paras(&["kept", "old"]), &paras(&["kept"]));
        let all = build_display_lines(&records, false, Locale::En);
        assert!(all.iter().any(|line| line.plain.contains("Same")));
        assert!(all
            .iter()
            .any(|line| line.plain.contains(PLACEHOLDER_DELETED)));

        let changed = build_display_lines(&records, true, Locale::En);
        assert!(!changed.iter().any(|line| line.plain.contains("Same")));
        assert!(changed.iter().any(|line| line.plain.contains("Deleted")));
    }

    #[test]
    fn marked_text_keeps_spaces_outside_emphasis() {
        let mut text = MarkedText::default();
        text.push_word("the", false);
        text.push_word("quick", true);
        text.push_word("brown", true);
        text.push_word("fox", false);
        assert_eq!(text.plain(), "the quick brown fox");
        assert_eq!(text.to_html(), "the <u>quick brown</u> fox");
    }
}
