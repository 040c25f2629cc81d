use crate::libshiken::bank::{QuestionBank, Unit};
use crate::libshiken::error::{BankFileError, SelectionError};
use crate::libshiken::shitsumon::{Entry, QuestionType};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct ShikenJson {
    pub units: Vec<UnitJson>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct UnitJson {
    pub mcqs: Vec<EntryJson>,
    pub vshorts: Vec<EntryJson>,
    pub shorts: Vec<EntryJson>,
    pub longs: Vec<EntryJson>,
}

/// A raw question (text, optionally with `Answer:`) or an OR-group of them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum EntryJson {
    Question(String),
    Or { or: Vec<String> },
}

impl UnitJson {
    fn entries(&self, question_type: QuestionType) -> &[EntryJson] {
        match question_type {
            QuestionType::MultipleChoice => &self.mcqs,
            QuestionType::VeryShort => &self.vshorts,
            QuestionType::Short => &self.shorts,
            QuestionType::Long => &self.longs,
        }
    }

    fn from_unit(unit: &Unit) -> Self {
        let convert = |t: QuestionType| -> Vec<EntryJson> { unit.entries(t).iter().map(EntryJson::from_entry).collect() };
        UnitJson {
            mcqs: convert(QuestionType::MultipleChoice),
            vshorts: convert(QuestionType::VeryShort),
            shorts: convert(QuestionType::Short),
            longs: convert(QuestionType::Long),
        }
    }
}

impl EntryJson {
    fn from_entry(entry: &Entry) -> Self {
        match entry {
            Entry::Single(q) => EntryJson::Question(q.raw_text()),
            Entry::Group(g) => EntryJson::Or {
                or: g.questions.iter().map(|q| q.raw_text()).collect(),
            },
        }
    }
}

impl ShikenJson {
    /// Replays the file through the bank operations, so units get fresh
    /// sequential ids and groups go through the usual validation.
    pub fn into_bank(self) -> Result<QuestionBank, BankFileError> {
        let mut bank = QuestionBank::new();
        for unit_json in &self.units {
            let unit = bank.add_unit();
            for question_type in QuestionType::ALL {
                for entry in unit_json.entries(question_type) {
                    match entry {
                        EntryJson::Question(raw) => {
                            bank.add_question(unit, question_type, raw);
                        }
                        EntryJson::Or { or } => {
                            if or.len() < 2 {
                                return Err(BankFileError::Group {
                                    unit,
                                    source: SelectionError::TooFew(or.len()),
                                });
                            }
                            let ids: Vec<_> = or
                                .iter()
                                .filter_map(|raw| bank.add_question(unit, question_type, raw))
                                .collect();
                            bank.group(unit, question_type, &ids)
                                .map_err(|source| BankFileError::Group { unit, source })?;
                        }
                    }
                }
            }
            debug!("[Bank] Loaded Unit {}", unit);
        }
        Ok(bank)
    }

    pub fn from_bank(bank: &QuestionBank) -> Self {
        ShikenJson {
            units: bank.units().map(|(_, unit)| UnitJson::from_unit(unit)).collect(),
        }
    }
}

pub fn load_bank(path: &Path) -> Result<QuestionBank, BankFileError> {
    let json = std::fs::read_to_string(path)?;
    let content: ShikenJson = serde_json::from_str(&json)?;
    let bank = content.into_bank()?;
    info!("[Bank] Loaded {:?}: {:?}", path, bank.summary());
    Ok(bank)
}

pub fn save_bank(bank: &QuestionBank, path: &Path) -> Result<(), BankFileError> {
    let json = serde_json::to_string_pretty(&ShikenJson::from_bank(bank))?;
    std::fs::write(path, json)?;
    info!("[Bank] Exported bank to {:?}", path);
    Ok(())
}
