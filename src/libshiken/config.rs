use crate::libshiken::error::ConfigError;
use crate::libshiken::shitsumon::QuestionType;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum NoteMode {
    Compulsory,
    Attempt { count: u32 },
    Custom { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRules {
    /// Questions to generate per set.
    pub count: u32,
    pub marks: u32,
    #[serde(default = "compulsory")]
    pub note: NoteMode,
}

fn compulsory() -> NoteMode {
    NoteMode::Compulsory
}

impl SectionRules {
    pub fn new(count: u32, marks: u32) -> Self {
        Self {
            count,
            marks,
            note: NoteMode::Compulsory,
        }
    }

    pub fn attempt_count(&self) -> u32 {
        match self.note {
            NoteMode::Attempt { count } => count,
            _ => self.count,
        }
    }

    pub fn total_marks(&self) -> u32 {
        self.attempt_count().saturating_mul(self.marks)
    }

    pub fn note_text(&self) -> String {
        match &self.note {
            NoteMode::Compulsory => String::from("All questions are compulsory."),
            NoteMode::Attempt { count } => format!("Attempt any {count} questions."),
            NoteMode::Custom { text } => text.clone(),
        }
    }

    pub fn marks_line(&self) -> String {
        format!(
            "({} x {} = {} Marks)",
            self.attempt_count(),
            self.marks,
            self.total_marks()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    pub mcqs: SectionRules,
    pub vshorts: SectionRules,
    pub shorts: SectionRules,
    pub longs: SectionRules,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            mcqs: SectionRules::new(5, 1),
            vshorts: SectionRules::new(5, 2),
            shorts: SectionRules::new(4, 5),
            longs: SectionRules::new(3, 10),
        }
    }
}

impl Sections {
    pub fn get(&self, question_type: QuestionType) -> &SectionRules {
        match question_type {
            QuestionType::MultipleChoice => &self.mcqs,
            QuestionType::VeryShort => &self.vshorts,
            QuestionType::Short => &self.shorts,
            QuestionType::Long => &self.longs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperMetadata {
    /// Centred lines printed above the title, e.g. the institute name.
    pub institution: Vec<String>,
    pub exam_name: String,
    pub class_name: String,
    pub year: String,
    pub subject: String,
    pub time_allowed: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub general_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub sets: usize,
    pub answer_key: bool,
    pub metadata: PaperMetadata,
    pub sections: Sections,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            sets: 2,
            answer_key: true,
            metadata: PaperMetadata::default(),
            sections: Sections::default(),
        }
    }
}

impl PaperConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: PaperConfig = serde_json::from_str(&json)?;
        config.validate()?;
        debug!("[Setup] Loaded paper config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sets == 0 {
            return Err(ConfigError::NoSets);
        }
        Ok(())
    }

    /// Sum over sections of marks per question times questions to attempt.
    pub fn max_marks(&self) -> u32 {
        QuestionType::ALL
            .iter()
            .map(|t| self.sections.get(*t).total_marks())
            .fold(0, u32::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paper_is_seventy_five_marks() {
        let config = PaperConfig::default();
        assert_eq!(config.max_marks(), 5 + 10 + 20 + 30);
    }

    #[test]
    fn attempt_mode_drives_marks_and_note() {
        let mut rules = SectionRules::new(4, 5);
        assert_eq!(rules.note_text(), "All questions are compulsory.");
        rules.note = NoteMode::Attempt { count: 3 };
        assert_eq!(rules.attempt_count(), 3);
        assert_eq!(rules.note_text(), "Attempt any 3 questions.");
        assert_eq!(rules.marks_line(), "(3 x 5 = 15 Marks)");
        rules.note = NoteMode::Custom {
            text: String::from("Answer in brief."),
        };
        assert_eq!(rules.attempt_count(), 4);
        assert_eq!(rules.note_text(), "Answer in brief.");
    }

    #[test]
    fn parses_partial_config_with_defaults() {
        let config: PaperConfig = serde_json::from_str(
            r#"{
                "sets": 3,
                "metadata": { "exam_name": "Mid-Term", "subject": "Physics" },
                "sections": {
                    "mcqs": { "count": 10, "marks": 1 },
                    "vshorts": { "count": 5, "marks": 2, "note": { "mode": "attempt", "count": 4 } },
                    "shorts": { "count": 4, "marks": 5, "note": { "mode": "custom", "text": "Any two." } },
                    "longs": { "count": 2, "marks": 10, "note": { "mode": "compulsory" } }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.sets, 3);
        assert!(config.answer_key);
        assert_eq!(config.metadata.subject, "Physics");
        assert_eq!(config.sections.vshorts.attempt_count(), 4);
        assert_eq!(config.max_marks(), 10 + 8 + 20 + 20);
    }

    #[test]
    fn huge_marks_saturate() {
        let mut config = PaperConfig::default();
        config.sections.longs = SectionRules::new(u32::MAX, 10);
        assert_eq!(config.sections.longs.total_marks(), u32::MAX);
        assert_eq!(config.sections.longs.marks_line(), format!("({} x 10 = {} Marks)", u32::MAX, u32::MAX));
        assert_eq!(config.max_marks(), u32::MAX);
    }

    #[test]
    fn zero_sets_is_rejected() {
        let config = PaperConfig {
            sets: 0,
            ..PaperConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoSets)));
    }

    #[test]
    fn demo_config_parses() {
        let config: PaperConfig = serde_json::from_str(include_str!("../../demos/paper.json")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.max_marks(), 2 + 4 + 5 + 20);
    }
}
