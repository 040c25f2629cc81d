use crate::libshiken::bank::QuestionBank;
use crate::libshiken::config::Sections;
use crate::libshiken::error::InsufficientPoolWarning;
use crate::libshiken::selector::select_fairly_with;
use crate::libshiken::shitsumon::{Entry, QuestionType};
use log::{info, warn};
use rand::{rng, Rng};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedSet {
    pub label: String,
    pub mcqs: Vec<Entry>,
    pub vshorts: Vec<Entry>,
    pub shorts: Vec<Entry>,
    pub longs: Vec<Entry>,
}

impl GeneratedSet {
    fn new(label: String) -> Self {
        Self {
            label,
            ..Default::default()
        }
    }

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
}

#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub sets: Vec<GeneratedSet>,
    pub warnings: Vec<InsufficientPoolWarning>,
}

/// `0 -> "A"`, `25 -> "Z"`, `26 -> "AA"`.
pub fn set_label(mut index: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

pub fn generate_sets(bank: &QuestionBank, num_sets: usize, sections: &Sections) -> Generation {
    generate_sets_with(&mut rng(), bank, num_sets, sections)
}

/// Builds `num_sets` sets. Each type's pool is selected from once, so no
/// entry appears in two sets of the same run.
pub fn generate_sets_with<R: Rng + ?Sized>(
    rng: &mut R,
    bank: &QuestionBank,
    num_sets: usize,
    sections: &Sections,
) -> Generation {
    let now = Instant::now();
    let num_sets = num_sets.max(1);
    let mut generation = Generation {
        sets: (0..num_sets).map(|i| GeneratedSet::new(set_label(i))).collect(),
        warnings: Vec::new(),
    };

    for question_type in QuestionType::ALL {
        let per_set = sections.get(question_type).count as usize;
        let pool = bank.pool(question_type);
        let requested = num_sets.saturating_mul(per_set);
        if pool.len() < requested {
            let warning = InsufficientPoolWarning {
                question_type,
                available: pool.len(),
                requested,
                sets: num_sets,
                per_set,
            };
            warn!("[Assemble] {}", warning);
            generation.warnings.push(warning);
        }

        let buckets = select_fairly_with(rng, pool, per_set, num_sets);
        for (set, bucket) in generation.sets.iter_mut().zip(buckets) {
            *set.entries_mut(question_type) = bucket;
        }
    }

    info!(
        "[Assemble] Generated {} sets in {} ms.",
        num_sets,
        now.elapsed().as_millis()
    );
    generation
}
