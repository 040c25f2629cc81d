use crate::libshiken::error::SelectionError;
use crate::libshiken::shitsumon::{
    split_blocks, Entry, OrGroup, Question, QuestionId, QuestionType, UnitId,
};
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

macro_rules! unit_or_return {
    ($units:expr, $unit_id:expr, $ret:expr) => {
        match $units.get_mut(&$unit_id) {
            None => {
                debug!("[Bank] Unit {} does not exist. Ignoring.", $unit_id);
                return $ret;
            }
            Some(unit) => unit,
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unit {
    pub mcqs: Vec<Entry>,
    pub vshorts: Vec<Entry>,
    pub shorts: Vec<Entry>,
    pub longs: Vec<Entry>,
}

impl Unit {
    pub fn entries(&self, question_type: QuestionType) -> &[Entry] {
        match question_type {
            QuestionType::MultipleChoice => &self.mcqs,
            QuestionType::VeryShort => &self.vshorts,
            QuestionType::Short => &self.shorts,
            QuestionType::Long => &self.longs,
        }
    }

    fn entries_mut(&mut self, question_type: QuestionType) -> &mut Vec<Entry> {
        match question_type {
            QuestionType::MultipleChoice => &mut self.mcqs,
            QuestionType::VeryShort => &mut self.vshorts,
            QuestionType::Short => &mut self.shorts,
            QuestionType::Long => &mut self.longs,
        }
    }

    fn all_entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.mcqs
            .iter_mut()
            .chain(self.vshorts.iter_mut())
            .chain(self.shorts.iter_mut())
            .chain(self.longs.iter_mut())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankSummary {
    pub units: usize,
    pub mcqs: usize,
    pub vshorts: usize,
    pub shorts: usize,
    pub longs: usize,
}

/// In-memory question bank for one authoring session.
///
/// Units are only ever added. Ids for questions and OR-groups come from one
/// shared counter and are never reused.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    units: BTreeMap<UnitId, Unit>,
    last_unit_id: UnitId,
    last_question_id: QuestionId,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self) -> UnitId {
        self.last_unit_id += 1;
        self.units.insert(self.last_unit_id, Unit::default());
        debug!("[Bank] Created Unit {}", self.last_unit_id);
        self.last_unit_id
    }

    pub fn unit(&self, unit_id: UnitId) -> Option<&Unit> {
        self.units.get(&unit_id)
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.units.iter().map(|(id, unit)| (*id, unit))
    }

    fn next_id(&mut self) -> QuestionId {
        self.last_question_id += 1;
        self.last_question_id
    }

    /// Appends a question to `unit_id`'s list for `question_type`.
    /// Returns `None` if the unit does not exist.
    pub fn add_question(
        &mut self,
        unit_id: UnitId,
        question_type: QuestionType,
        raw: &str,
    ) -> Option<QuestionId> {
        let id = self.last_question_id + 1;
        let unit = unit_or_return!(self.units, unit_id, None);
        self.last_question_id = id;
        unit.entries_mut(question_type)
            .push(Entry::Single(Question::new(id, unit_id, question_type, raw)));
        debug!("[Bank] Added {} question {} to Unit {}", question_type, id, unit_id);
        Some(id)
    }

    /// Looks a question up anywhere in the bank, including inside OR-groups.
    pub fn find_question(&self, id: QuestionId) -> Option<&Question> {
        self.units
            .values()
            .flat_map(|unit| QuestionType::ALL.into_iter().flat_map(move |t| unit.entries(t)))
            .flat_map(Entry::questions)
            .find(|q| q.id == id)
    }

    fn find_question_mut(&mut self, id: QuestionId) -> Option<&mut Question> {
        self.units
            .values_mut()
            .flat_map(Unit::all_entries_mut)
            .find_map(|entry| entry.find_mut(id))
    }

    /// Re-splits `raw` into text and answer for an existing question.
    /// Returns whether the question was found.
    pub fn update_question(&mut self, id: QuestionId, raw: &str) -> bool {
        match self.find_question_mut(id) {
            Some(question) => {
                question.set_raw_text(raw);
                debug!("[Bank] Updated question {}", id);
                true
            }
            None => {
                debug!("[Bank] Question {} not found. Ignoring update.", id);
                false
            }
        }
    }

    /// Removes the entry with `id` from one list. Removing a group drops its members too.
    pub fn remove_question(&mut self, unit_id: UnitId, id: QuestionId, question_type: QuestionType) {
        let unit = unit_or_return!(self.units, unit_id, ());
        let entries = unit.entries_mut(question_type);
        match entries.iter().position(|entry| entry.id() == id) {
            Some(index) => {
                let removed = entries.remove(index);
                debug!(
                    "[Bank] Removed {} {} from Unit {}",
                    if removed.is_group() { "OR-group" } else { "question" },
                    id,
                    unit_id
                );
            }
            None => debug!("[Bank] Entry {} not in Unit {} {}s. Ignoring.", id, unit_id, question_type),
        }
    }

    /// Splits a pasted block on blank lines. The first segment replaces
    /// `target_id`, every other segment becomes a new question.
    /// Returns the ids of the newly added questions.
    pub fn bulk_import(
        &mut self,
        unit_id: UnitId,
        question_type: QuestionType,
        target_id: QuestionId,
        pasted: &str,
    ) -> Vec<QuestionId> {
        let blocks = split_blocks(pasted);
        let Some((first, rest)) = blocks.split_first() else {
            return Vec::new();
        };
        self.update_question(target_id, first);
        let added: Vec<QuestionId> = rest
            .iter()
            .filter_map(|block| self.add_question(unit_id, question_type, block))
            .collect();
        info!(
            "[Bank] Imported {} block(s) into Unit {} {}s",
            added.len() + 1,
            unit_id,
            question_type
        );
        added
    }

    /// Moves the selected plain questions into a new OR-group appended to the list.
    pub fn group(
        &mut self,
        unit_id: UnitId,
        question_type: QuestionType,
        selected: &[QuestionId],
    ) -> Result<QuestionId, SelectionError> {
        let mut seen = HashSet::new();
        let selected: Vec<QuestionId> = selected.iter().copied().filter(|id| seen.insert(*id)).collect();
        if selected.len() < 2 {
            return Err(SelectionError::TooFew(selected.len()));
        }

        let entries = self
            .units
            .get(&unit_id)
            .map(|unit| unit.entries(question_type))
            .unwrap_or_default();
        for id in &selected {
            if entries.iter().any(|e| e.is_group() && e.questions().iter().any(|q| q.id == *id)) {
                return Err(SelectionError::AlreadyGrouped(*id));
            }
            match entries.iter().find(|e| e.id() == *id) {
                Some(Entry::Single(_)) => {}
                Some(Entry::Group(_)) => return Err(SelectionError::AlreadyGrouped(*id)),
                None => {
                    return Err(SelectionError::NotInList {
                        id: *id,
                        unit: unit_id,
                        question_type,
                    })
                }
            }
        }

        let group_id = self.next_id();
        let unit = unit_or_return!(
            self.units,
            unit_id,
            Err(SelectionError::NotInList {
                id: selected[0],
                unit: unit_id,
                question_type,
            })
        );
        let entries = unit.entries_mut(question_type);
        let (members, mut remaining): (Vec<Entry>, Vec<Entry>) =
            entries.drain(..).partition(|e| selected.contains(&e.id()));
        let questions = members
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Single(q) => Some(q),
                Entry::Group(_) => None,
            })
            .collect::<Vec<_>>();
        info!(
            "[Group] Grouped {} questions into OR-group {} (Unit {}, {})",
            questions.len(),
            group_id,
            unit_id,
            question_type
        );
        remaining.push(Entry::Group(OrGroup {
            id: group_id,
            unit: unit_id,
            question_type,
            questions,
        }));
        *entries = remaining;
        Ok(group_id)
    }

    /// Dissolves an OR-group, appending its members to the end of the list.
    pub fn ungroup(&mut self, unit_id: UnitId, group_id: QuestionId, question_type: QuestionType) {
        let unit = unit_or_return!(self.units, unit_id, ());
        let entries = unit.entries_mut(question_type);
        let Some(index) = entries.iter().position(|e| e.is_group() && e.id() == group_id) else {
            debug!("[Group] OR-group {} not found in Unit {}. Ignoring.", group_id, unit_id);
            return;
        };
        if let Entry::Group(group) = entries.remove(index) {
            info!(
                "[Group] Ungrouped OR-group {} ({} questions)",
                group_id,
                group.questions.len()
            );
            entries.extend(group.questions.into_iter().map(Entry::Single));
        }
    }

    /// Every entry of one type across all units, in unit order.
    pub fn pool(&self, question_type: QuestionType) -> Vec<Entry> {
        self.units
            .values()
            .flat_map(|unit| unit.entries(question_type).iter().cloned())
            .collect()
    }

    pub fn summary(&self) -> BankSummary {
        let count = |t: QuestionType| -> usize { self.units.values().map(|u| u.entries(t).len()).sum() };
        BankSummary {
            units: self.units.len(),
            mcqs: count(QuestionType::MultipleChoice),
            vshorts: count(QuestionType::VeryShort),
            shorts: count(QuestionType::Short),
            longs: count(QuestionType::Long),
        }
    }
}
