use crate::libshiken::assembler::GeneratedSet;
use crate::libshiken::config::{PaperConfig, PaperMetadata, SectionRules};
use crate::libshiken::shitsumon::{Entry, QuestionType};
use chrono::NaiveDate;
use log::{debug, info};
use std::fmt;

const FORM_FEED: char = '\u{000C}';
const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    QuestionPaper,
    AnswerKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    /// Columns per line.
    pub width: usize,
    /// Lines per page.
    pub height: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width: 80,
            height: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                writeln!(f, "{FORM_FEED}")?;
            }
            for line in &page.lines {
                writeln!(f, "{line}")?;
            }
        }
        Ok(())
    }
}

struct PageWriter {
    layout: PageLayout,
    pages: Vec<Page>,
    current: Vec<String>,
}

impl PageWriter {
    fn new(layout: PageLayout) -> Self {
        Self {
            layout: PageLayout {
                width: layout.width.max(20),
                height: layout.height.max(5),
            },
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    fn break_page(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(Page {
                lines: std::mem::take(&mut self.current),
            });
        }
    }

    fn line(&mut self, line: impl Into<String>) {
        if self.current.len() >= self.layout.height {
            self.break_page();
        }
        self.current.push(line.into());
    }

    fn blank(&mut self) {
        // no leading blank lines on a fresh page
        if !self.current.is_empty() {
            self.line(String::new());
        }
    }

    /// Keeps `lines` on one page whenever they fit on one.
    fn block(&mut self, lines: Vec<String>) {
        if !self.current.is_empty() && self.current.len() + lines.len() > self.layout.height {
            self.break_page();
        }
        lines.into_iter().for_each(|line| self.line(line));
    }

    fn finish(mut self) -> Document {
        self.break_page();
        Document { pages: self.pages }
    }
}

/// Greedy word wrap. Explicit newlines in `text` are kept; continuation
/// lines get `indent`.
pub fn wrap(text: &str, width: usize, indent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for (p, paragraph) in text.lines().enumerate() {
        let mut current = if p == 0 { String::new() } else { indent.to_string() };
        let mut has_word = false;
        for word in paragraph.split_whitespace() {
            let needed = current.chars().count() + usize::from(has_word) + word.chars().count();
            if has_word && needed > width {
                lines.push(std::mem::replace(&mut current, indent.to_string()));
                has_word = false;
            }
            if has_word {
                current.push(' ');
            }
            current.push_str(word);
            has_word = true;
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", " ".repeat(width.saturating_sub(len) / 2), text)
}

fn columns(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    format!("{}{}{}", left, " ".repeat(width.saturating_sub(used).max(1)), right)
}

/// `2025-03-14` becomes `14/03/2025`; anything unparsable is printed as given.
pub fn format_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%d/%m/%Y").to_string(),
        Err(err) => {
            debug!("[Export] Date {:?} left as is: {}", date, err);
            date.to_string()
        }
    }
}

fn section_title(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::MultipleChoice => "Section A (Objective Questions)",
        QuestionType::VeryShort => "Section B (Very Short Answer Questions)",
        QuestionType::Short => "Section C (Short Answer Questions)",
        QuestionType::Long => "Section D (Long Answer Questions)",
    }
}

fn write_header(
    writer: &mut PageWriter,
    set: &GeneratedSet,
    metadata: &PaperMetadata,
    max_marks: u32,
    kind: DocumentKind,
) {
    let width = writer.layout.width;
    for line in &metadata.institution {
        writer.line(center(line, width));
    }
    writer.blank();
    let title = match kind {
        DocumentKind::QuestionPaper => format!("{} - SET {}", metadata.exam_name, set.label),
        DocumentKind::AnswerKey => format!("{} - SET {} (ANSWER KEY)", metadata.exam_name, set.label),
    };
    writer.line(center(title.trim(), width));
    writer.blank();
    writer.line(columns(
        &format!("Subject: {}", metadata.subject),
        &format!("Max. Marks: {}", max_marks),
        width,
    ));
    writer.line(columns(
        &format!("Class: {}", metadata.class_name),
        &format!("Time Allowed: {}", metadata.time_allowed),
        width,
    ));
    writer.line(columns(
        &format!("Year: {}", metadata.year),
        &format!("Date: {}", format_date(&metadata.date)),
        width,
    ));
    writer.line("-".repeat(width));
    if let Some(note) = metadata.general_note.as_deref().filter(|n| !n.trim().is_empty()) {
        for line in wrap(&format!("Note: {note}"), width, "      ") {
            writer.line(line);
        }
    }
    writer.blank();
}

fn entry_lines(index: usize, entry: &Entry, width: usize, kind: DocumentKind) -> Vec<String> {
    let mut lines = Vec::new();
    for (m, question) in entry.questions().iter().enumerate() {
        if m > 0 {
            lines.push(center("OR", width));
        }
        let text = if m == 0 {
            format!("Q{}. {}", index + 1, question.text)
        } else {
            format!("{INDENT}{}", question.text)
        };
        lines.extend(wrap(&text, width, INDENT));
        if kind == DocumentKind::AnswerKey && !question.answer.is_empty() {
            let answer_indent = INDENT.repeat(2);
            let answer = format!("{answer_indent}{}", question.answer);
            lines.extend(wrap(&answer, width, &answer_indent));
        }
    }
    lines
}

fn write_section(
    writer: &mut PageWriter,
    question_type: QuestionType,
    entries: &[Entry],
    rules: &SectionRules,
    kind: DocumentKind,
) {
    if entries.is_empty() {
        return;
    }
    let width = writer.layout.width;
    let mut heading = vec![center(section_title(question_type), width)];
    let note = rules.note_text();
    let marks = rules.marks_line();
    if note.chars().count() + marks.chars().count() < width {
        heading.push(columns(&note, &marks, width));
    } else {
        heading.push(format!("{marks:>width$}"));
        heading.extend(wrap(&note, width, ""));
    }
    heading.push(String::new());
    if let Some(first) = entries.first() {
        heading.extend(entry_lines(0, first, width, kind));
    }
    writer.block(heading);

    for (index, entry) in entries.iter().enumerate().skip(1) {
        writer.blank();
        writer.block(entry_lines(index, entry, width, kind));
    }
    writer.blank();
}

/// Lays out every set on its own pages. The answer key prints each answer
/// under its question; OR-group members are separated by an `OR` line.
pub fn render(sets: &[GeneratedSet], config: &PaperConfig, kind: DocumentKind, layout: PageLayout) -> Document {
    let mut writer = PageWriter::new(layout);
    let max_marks = config.max_marks();
    for set in sets {
        writer.break_page();
        write_header(&mut writer, set, &config.metadata, max_marks, kind);
        for question_type in QuestionType::ALL {
            write_section(
                &mut writer,
                question_type,
                set.entries(question_type),
                config.sections.get(question_type),
                kind,
            );
        }
    }
    let document = writer.finish();
    info!(
        "[Export] Rendered {:?} for {} sets on {} pages",
        kind,
        sets.len(),
        document.pages.len()
    );
    document
}
