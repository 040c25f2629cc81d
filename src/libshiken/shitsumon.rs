use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub type QuestionId = u32;
pub type UnitId = u32;

static ANSWER_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)answer:").unwrap());
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "mcqs")]
    MultipleChoice,
    #[serde(rename = "vshorts")]
    VeryShort,
    #[serde(rename = "shorts")]
    Short,
    #[serde(rename = "longs")]
    Long,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::MultipleChoice,
        QuestionType::VeryShort,
        QuestionType::Short,
        QuestionType::Long,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "MCQs",
            QuestionType::VeryShort => "Very Short Answer",
            QuestionType::Short => "Short Answer",
            QuestionType::Long => "Long Answer",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionType::MultipleChoice => "mcq",
            QuestionType::VeryShort => "vshort",
            QuestionType::Short => "short",
            QuestionType::Long => "long",
        };
        f.write_str(name)
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mcq" | "mcqs" => Ok(QuestionType::MultipleChoice),
            "vshort" | "vshorts" | "very-short" => Ok(QuestionType::VeryShort),
            "short" | "shorts" => Ok(QuestionType::Short),
            "long" | "longs" => Ok(QuestionType::Long),
            other => Err(format!("unknown question type '{other}' (mcq, vshort, short, long)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub answer: String,
    pub unit: UnitId,
    pub question_type: QuestionType,
}

impl Question {
    pub(crate) fn new(id: QuestionId, unit: UnitId, question_type: QuestionType, raw: &str) -> Self {
        let (text, answer) = split_answer(raw);
        Question {
            id,
            text,
            answer,
            unit,
            question_type,
        }
    }

    pub fn set_raw_text(&mut self, raw: &str) {
        let (text, answer) = split_answer(raw);
        self.text = text;
        self.answer = answer;
    }

    /// Text and answer joined back together, the way an editor shows them.
    pub fn raw_text(&self) -> String {
        if self.answer.is_empty() {
            self.text.clone()
        } else {
            format!("{}\n{}", self.text, self.answer)
        }
    }
}

/// Mutually alternative questions: "answer any one of these".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrGroup {
    pub id: QuestionId,
    pub unit: UnitId,
    pub question_type: QuestionType,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Single(Question),
    Group(OrGroup),
}

impl Entry {
    pub fn id(&self) -> QuestionId {
        match self {
            Entry::Single(q) => q.id,
            Entry::Group(g) => g.id,
        }
    }

    pub fn unit(&self) -> UnitId {
        match self {
            Entry::Single(q) => q.unit,
            Entry::Group(g) => g.unit,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Entry::Group(_))
    }

    /// The single question, or every member of the group in order.
    pub fn questions(&self) -> &[Question] {
        match self {
            Entry::Single(q) => std::slice::from_ref(q),
            Entry::Group(g) => &g.questions,
        }
    }

    pub(crate) fn find_mut(&mut self, id: QuestionId) -> Option<&mut Question> {
        match self {
            Entry::Single(q) if q.id == id => Some(q),
            Entry::Single(_) => None,
            Entry::Group(g) => g.questions.iter_mut().find(|q| q.id == id),
        }
    }
}

/// Splits raw text at the first case-insensitive `Answer:` marker.
/// The marker stays at the front of the answer.
pub fn split_answer(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    match ANSWER_MARKER.find(trimmed) {
        Some(marker) => (
            trimmed[..marker.start()].trim().to_string(),
            trimmed[marker.start()..].trim().to_string(),
        ),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Splits a pasted block into question segments at blank lines.
pub fn split_blocks(raw: &str) -> Vec<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    BLANK_LINE
        .split(trimmed)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}
