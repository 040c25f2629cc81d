use crate::libshiken::shitsumon::{Entry, UnitId};
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::{rng, Rng};
use std::collections::BTreeMap;

/// Round-robin position over the shuffled unit keys, shared by every bucket
/// of one selection run so later sets start drawing from a different unit.
#[derive(Debug)]
pub(crate) struct UnitCursor {
    keys: Vec<UnitId>,
    position: usize,
}

impl UnitCursor {
    pub(crate) fn new(keys: Vec<UnitId>) -> Self {
        Self { keys, position: 0 }
    }

    /// Pops one entry from the next non-empty unit, probing each unit at most
    /// once. Leaves the cursor just past the unit it drew from.
    pub(crate) fn draw(&mut self, pools: &mut BTreeMap<UnitId, Vec<Entry>>) -> Option<Entry> {
        for _ in 0..self.keys.len() {
            let unit = self.keys[self.position];
            self.position = (self.position + 1) % self.keys.len();
            if let Some(entry) = pools.get_mut(&unit).and_then(Vec::pop) {
                return Some(entry);
            }
        }
        None
    }
}

/// Picks up to `count_per_set` entries for each of `num_sets` sets without
/// replacement, see [`select_fairly_with`].
pub fn select_fairly(pool: Vec<Entry>, count_per_set: usize, num_sets: usize) -> Vec<Vec<Entry>> {
    select_fairly_with(&mut rng(), pool, count_per_set, num_sets)
}

/// OR-groups are dealt round-robin first, then plain questions fill the
/// remaining slots one unit at a time. Every returned set is shuffled.
///
/// Never fails: when the pool runs dry the later sets simply come back short.
pub fn select_fairly_with<R: Rng + ?Sized>(
    rng: &mut R,
    pool: Vec<Entry>,
    count_per_set: usize,
    num_sets: usize,
) -> Vec<Vec<Entry>> {
    let num_sets = num_sets.max(1);
    let mut sets: Vec<Vec<Entry>> = (0..num_sets).map(|_| Vec::new()).collect();
    let (mut groups, regular): (Vec<Entry>, Vec<Entry>) = pool.into_iter().partition(Entry::is_group);
    debug!(
        "[Select] {} OR-groups and {} questions for {} sets of {}",
        groups.len(),
        regular.len(),
        num_sets,
        count_per_set
    );

    groups.shuffle(rng);
    let mut groups = groups.into_iter().peekable();
    while groups.peek().is_some() && sets.iter().any(|set| set.len() < count_per_set) {
        for set in sets.iter_mut().filter(|set| set.len() < count_per_set) {
            match groups.next() {
                Some(group) => set.push(group),
                None => break,
            }
        }
    }

    let mut by_unit: BTreeMap<UnitId, Vec<Entry>> = BTreeMap::new();
    for entry in regular {
        by_unit.entry(entry.unit()).or_default().push(entry);
    }
    by_unit.values_mut().for_each(|questions| questions.shuffle(rng));
    let mut keys: Vec<UnitId> = by_unit.keys().copied().collect();
    keys.shuffle(rng);
    let mut cursor = UnitCursor::new(keys);

    for (index, set) in sets.iter_mut().enumerate() {
        while set.len() < count_per_set {
            match cursor.draw(&mut by_unit) {
                Some(entry) => set.push(entry),
                None => {
                    warn!(
                        "[Select] Pool exhausted: set {} has {} of {} entries",
                        index,
                        set.len(),
                        count_per_set
                    );
                    break;
                }
            }
        }
    }

    sets.iter_mut().for_each(|set| set.shuffle(rng));
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libshiken::shitsumon::{OrGroup, Question, QuestionId, QuestionType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn question(id: QuestionId, unit: UnitId) -> Question {
        Question {
            id,
            text: format!("q{id}"),
            answer: String::new(),
            unit,
            question_type: QuestionType::MultipleChoice,
        }
    }

    fn single(id: QuestionId, unit: UnitId) -> Entry {
        Entry::Single(question(id, unit))
    }

    fn group(id: QuestionId, unit: UnitId, members: &[QuestionId]) -> Entry {
        Entry::Group(OrGroup {
            id,
            unit,
            question_type: QuestionType::MultipleChoice,
            questions: members.iter().map(|m| question(*m, unit)).collect(),
        })
    }

    /// `per_unit[i]` questions in unit `i + 1`, ids numbered from 1.
    fn pool(per_unit: &[usize]) -> Vec<Entry> {
        let mut id = 0;
        let mut entries = Vec::new();
        for (unit, count) in per_unit.iter().enumerate() {
            for _ in 0..*count {
                id += 1;
                entries.push(single(id, unit as UnitId + 1));
            }
        }
        entries
    }

    fn sizes(sets: &[Vec<Entry>]) -> Vec<usize> {
        sets.iter().map(Vec::len).collect()
    }

    fn assert_no_duplicates(sets: &[Vec<Entry>], source: &[Entry]) {
        let source_ids: HashSet<QuestionId> = source.iter().map(Entry::id).collect();
        let mut seen = HashSet::new();
        for entry in sets.iter().flatten() {
            assert!(source_ids.contains(&entry.id()), "{} not from pool", entry.id());
            assert!(seen.insert(entry.id()), "{} selected twice", entry.id());
        }
    }

    #[test]
    fn returns_one_list_per_set_without_duplicates() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let source = pool(&[5, 2, 7, 1]);
            let sets = select_fairly_with(&mut rng, source.clone(), 4, 3);
            assert_eq!(sizes(&sets), vec![4, 4, 4]);
            assert_no_duplicates(&sets, &source);
        }
    }

    #[test]
    fn zero_count_and_empty_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sizes(&select_fairly_with(&mut rng, pool(&[3]), 0, 2)), vec![0, 0]);
        assert_eq!(sizes(&select_fairly_with(&mut rng, Vec::new(), 3, 2)), vec![0, 0]);
        assert_eq!(select_fairly(pool(&[2]), 1, 0).len(), 1);
    }

    #[test]
    fn each_set_covers_every_unit_before_repeating() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sets = select_fairly_with(&mut rng, pool(&[2, 2, 2]), 3, 2);
            for set in &sets {
                let units: HashSet<UnitId> = set.iter().map(Entry::unit).collect();
                assert_eq!(units.len(), 3, "seed {seed}: {set:?}");
            }
        }
    }

    #[test]
    fn skewed_pool_still_uses_the_small_unit() {
        // unit 1 has 3 questions, unit 2 has 1; demand equals supply
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let source = pool(&[3, 1]);
            let sets = select_fairly_with(&mut rng, source.clone(), 2, 2);
            assert_eq!(sizes(&sets), vec![2, 2]);
            assert_no_duplicates(&sets, &source);
            assert!(sets.iter().flatten().any(|e| e.unit() == 2));
        }
    }

    #[test]
    fn first_set_spreads_across_units_when_pool_is_skewed() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sets = select_fairly_with(&mut rng, pool(&[6, 1]), 2, 3);
            let first: HashSet<UnitId> = sets[0].iter().map(Entry::unit).collect();
            assert_eq!(first.len(), 2, "seed {seed}");
        }
    }

    #[test]
    fn pool_exactly_equal_to_demand() {
        let mut rng = StdRng::seed_from_u64(1);
        let source = pool(&[3, 3]);
        let sets = select_fairly_with(&mut rng, source.clone(), 3, 2);
        assert_eq!(sizes(&sets), vec![3, 3]);
        assert_no_duplicates(&sets, &source);
    }

    #[test]
    fn pool_one_short_leaves_last_set_under_filled() {
        let mut rng = StdRng::seed_from_u64(2);
        let source = pool(&[3, 2]);
        let sets = select_fairly_with(&mut rng, source.clone(), 3, 2);
        assert_eq!(sizes(&sets), vec![3, 2]);
        assert_no_duplicates(&sets, &source);
    }

    #[test]
    fn one_unit_totally_empty_is_skipped() {
        let mut rng = StdRng::seed_from_u64(3);
        let source = pool(&[0, 4, 0]);
        let sets = select_fairly_with(&mut rng, source.clone(), 3, 2);
        assert_eq!(sizes(&sets), vec![3, 1]);
        assert!(sets.iter().flatten().all(|e| e.unit() == 2));
    }

    #[test]
    fn exhausted_before_later_sets() {
        let mut rng = StdRng::seed_from_u64(4);
        let sets = select_fairly_with(&mut rng, pool(&[1, 1]), 2, 3);
        assert_eq!(sizes(&sets), vec![2, 0, 0]);
    }

    #[test]
    fn groups_are_dealt_first_and_never_split() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut source = pool(&[4, 4]);
            source.push(group(100, 1, &[101, 102]));
            source.push(group(200, 2, &[201, 202, 203]));
            let sets = select_fairly_with(&mut rng, source.clone(), 3, 2);
            assert_eq!(sizes(&sets), vec![3, 3]);
            assert_no_duplicates(&sets, &source);
            for set in &sets {
                assert_eq!(set.iter().filter(|e| e.is_group()).count(), 1, "seed {seed}");
            }
            let group_sizes: Vec<usize> = sets
                .iter()
                .flatten()
                .filter(|e| e.is_group())
                .map(|e| e.questions().len())
                .collect();
            assert_eq!(group_sizes.iter().sum::<usize>(), 5);
        }
    }

    #[test]
    fn groups_can_fill_a_set_completely() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut source: Vec<Entry> = (0..4).map(|i| group(10 + i, 1, &[20 + 2 * i, 21 + 2 * i])).collect();
        source.extend(pool(&[2]));
        let sets = select_fairly_with(&mut rng, source, 2, 2);
        assert!(sets.iter().flatten().all(Entry::is_group));
    }

    #[test]
    fn huge_count_returns_what_the_pool_has() {
        let mut rng = StdRng::seed_from_u64(8);
        let count = u32::MAX as usize;
        let sets = select_fairly_with(&mut rng, pool(&[1]), count, 2);
        assert_eq!(sizes(&sets), vec![1, 0]);

        let source = vec![group(10, 1, &[11, 12]), single(1, 2)];
        let sets = select_fairly_with(&mut rng, source, count, 3);
        assert_eq!(sizes(&sets), vec![2, 0, 0]);
    }

    #[test]
    fn cursor_rotates_across_draws() {
        let mut pools: BTreeMap<UnitId, Vec<Entry>> = BTreeMap::new();
        pools.insert(1, vec![single(1, 1), single(2, 1)]);
        pools.insert(2, vec![]);
        pools.insert(3, vec![single(3, 3)]);
        let mut cursor = UnitCursor::new(vec![1, 2, 3]);
        let drawn: Vec<UnitId> = std::iter::from_fn(|| cursor.draw(&mut pools)).map(|e| e.unit()).collect();
        assert_eq!(drawn, vec![1, 3, 1]);
        assert!(cursor.draw(&mut pools).is_none());
        assert!(UnitCursor::new(Vec::new()).draw(&mut pools).is_none());
    }
}
