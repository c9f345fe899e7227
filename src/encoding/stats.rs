//! Per-category response statistics and their aggregation.
//!
//! [`StatAggregator`] groups rows by category (and optionally fold) and
//! accumulates `(sum, count)` of the response. Rows are split into fixed-size
//! partitions, each partition fills its own accumulator in parallel, and the
//! partials are merged in partition order. The merge order therefore never
//! depends on the number of worker threads, and repeated runs produce identical
//! sums.

use crate::dataset::{CategoricalView, CategoryId, FoldId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Default number of rows per aggregation partition.
pub const DEFAULT_PARTITION_ROWS: usize = 16_384;

/// Accumulated response sum and row count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub sum: f64,
    pub count: i64,
}

impl Stat {
    pub fn new(sum: f64, count: i64) -> Self {
        Self { sum, count }
    }

    /// Add one observed response.
    pub fn observe(&mut self, response: f64) {
        self.sum += response;
        self.count += 1;
    }

    /// Combine two partial accumulators.
    pub fn merge(self, other: Stat) -> Stat {
        Stat {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }

    /// The statistic with one row's contribution removed.
    pub fn without(self, response: f64) -> Stat {
        Stat {
            sum: self.sum - response,
            count: self.count - 1,
        }
    }

    /// `sum / count`, or `None` when no rows back the statistic.
    pub fn posterior_mean(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }
}

/// A persisted statistic for one category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryStat {
    pub category_id: CategoryId,
    pub sum: f64,
    pub count: i64,
}

/// Grouping key: category, plus fold when aggregating per fold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub category: CategoryId,
    pub fold: Option<FoldId>,
}

/// Result of a group-by-sum/count.
pub type GroupedStats = BTreeMap<GroupKey, Stat>;

/// Fold-independent `category_id -> (sum, count)` map for one column.
///
/// Only categories backed by at least one row are stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnEncodingMap {
    stats: BTreeMap<CategoryId, Stat>,
}

impl ColumnEncodingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapse grouped statistics by category, summing over folds in fold order.
    pub fn from_grouped(grouped: &GroupedStats) -> Self {
        let mut map = Self::new();
        for (key, stat) in grouped {
            map.accumulate(key.category, *stat);
        }
        map
    }

    fn accumulate(&mut self, category: CategoryId, stat: Stat) {
        if stat.count < 1 {
            return;
        }
        let entry = self.stats.entry(category).or_default();
        *entry = entry.merge(stat);
    }

    /// Store a statistic. Entries with `count < 1` are not stored; returns whether it was.
    pub fn insert(&mut self, stat: CategoryStat) -> bool {
        if stat.count < 1 {
            return false;
        }
        self.stats
            .insert(stat.category_id, Stat::new(stat.sum, stat.count));
        true
    }

    pub fn get(&self, category: CategoryId) -> Option<Stat> {
        self.stats.get(&category).copied()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Iterate in ascending category order.
    pub fn iter(&self) -> impl Iterator<Item = CategoryStat> + '_ {
        self.stats.iter().map(|(&category_id, s)| CategoryStat {
            category_id,
            sum: s.sum,
            count: s.count,
        })
    }
}

/// Fold-partitioned `(category_id, fold_id) -> (sum, count)` map for one column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FoldedEncodingMap {
    stats: BTreeMap<CategoryId, BTreeMap<FoldId, Stat>>,
}

impl FoldedEncodingMap {
    /// Build from per-fold grouped statistics. Keys without a fold are stored under fold 0.
    pub fn from_grouped(grouped: &GroupedStats) -> Self {
        let mut stats: BTreeMap<CategoryId, BTreeMap<FoldId, Stat>> = BTreeMap::new();
        for (key, stat) in grouped {
            if stat.count < 1 {
                continue;
            }
            let slot = stats
                .entry(key.category)
                .or_default()
                .entry(key.fold.unwrap_or_default())
                .or_default();
            *slot = slot.merge(*stat);
        }
        Self { stats }
    }

    /// Collapse into a fold-independent map by summing every fold of each category.
    pub fn regroup(&self) -> ColumnEncodingMap {
        let mut map = ColumnEncodingMap::new();
        for (&category, folds) in &self.stats {
            let total = folds.values().fold(Stat::default(), |acc, s| acc.merge(*s));
            map.accumulate(category, total);
        }
        map
    }

    /// Statistic for `category` over every fold except `fold`.
    ///
    /// Folds are summed in ascending order, so the result equals aggregating
    /// the table with `fold` removed.
    pub fn out_of_fold(&self, category: CategoryId, fold: FoldId) -> Stat {
        self.stats
            .get(&category)
            .map(|folds| {
                folds
                    .iter()
                    .filter(|(&f, _)| f != fold)
                    .fold(Stat::default(), |acc, (_, s)| acc.merge(*s))
            })
            .unwrap_or_default()
    }

    /// Statistic for `category` within a single fold.
    pub fn in_fold(&self, category: CategoryId, fold: FoldId) -> Option<Stat> {
        self.stats.get(&category)?.get(&fold).copied()
    }

    /// Every fold id seen during aggregation.
    pub fn folds(&self) -> BTreeSet<FoldId> {
        self.stats
            .values()
            .flat_map(|folds| folds.keys().copied())
            .collect()
    }

    pub fn n_categories(&self) -> usize {
        self.stats.len()
    }
}

/// Data-parallel group-by-sum/count over one categorical column.
#[derive(Clone, Copy, Debug)]
pub struct StatAggregator {
    partition_rows: usize,
}

impl Default for StatAggregator {
    fn default() -> Self {
        Self {
            partition_rows: DEFAULT_PARTITION_ROWS,
        }
    }
}

impl StatAggregator {
    /// Set the number of rows per partition (at least one).
    pub fn with_partition_rows(mut self, rows: usize) -> Self {
        self.partition_rows = rows.max(1);
        self
    }

    /// Group rows by category (and fold, if given) and accumulate the response.
    ///
    /// Rows with a missing category land in the missing level
    /// (`categories.missing_id()`); rows with a missing response are skipped.
    ///
    /// # Panics
    /// If `responses` or `folds` differ in length from the category codes.
    pub fn aggregate(
        &self,
        categories: CategoricalView<'_>,
        responses: &[Option<f64>],
        folds: Option<&[FoldId]>,
    ) -> GroupedStats {
        assert_eq!(categories.codes.len(), responses.len());
        if let Some(folds) = folds {
            assert_eq!(folds.len(), responses.len());
        }
        let missing = categories.missing_id();
        let size = self.partition_rows;

        let partials: Vec<HashMap<GroupKey, Stat>> = responses
            .par_chunks(size)
            .enumerate()
            .map(|(chunk, part)| {
                let offset = chunk * size;
                let mut local: HashMap<GroupKey, Stat> = HashMap::new();
                for (i, response) in part.iter().enumerate() {
                    let Some(y) = response else { continue };
                    let row = offset + i;
                    let key = GroupKey {
                        category: categories.codes[row].unwrap_or(missing),
                        fold: folds.map(|f| f[row]),
                    };
                    local.entry(key).or_default().observe(*y);
                }
                local
            })
            .collect();

        let mut grouped = GroupedStats::new();
        for partial in partials {
            for (key, stat) in partial {
                let slot = grouped.entry(key).or_default();
                *slot = slot.merge(stat);
            }
        }
        grouped
    }

    /// Sum and count of every non-missing response.
    pub fn total(&self, responses: &[Option<f64>]) -> Stat {
        let partials: Vec<Stat> = responses
            .par_chunks(self.partition_rows)
            .map(|part| {
                let mut local = Stat::default();
                for y in part.iter().flatten() {
                    local.observe(*y);
                }
                local
            })
            .collect();
        partials
            .into_iter()
            .fold(Stat::default(), |acc, s| acc.merge(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn view<'a>(domain: &'a [String], codes: &'a [Option<CategoryId>]) -> CategoricalView<'a> {
        CategoricalView { domain, codes }
    }

    fn domain(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{}", i)).collect()
    }

    #[test]
    fn test_aggregate_without_folds() {
        let dom = domain(2);
        let codes = [Some(0), Some(1), Some(0), None];
        let responses = [Some(1.0), Some(0.0), Some(1.0), Some(1.0)];
        let grouped = StatAggregator::default().aggregate(view(&dom, &codes), &responses, None);

        let key = |c| GroupKey {
            category: c,
            fold: None,
        };
        assert_eq!(grouped[&key(0)], Stat::new(2.0, 2));
        assert_eq!(grouped[&key(1)], Stat::new(0.0, 1));
        // missing category id equals the domain length
        assert_eq!(grouped[&key(2)], Stat::new(1.0, 1));
    }

    #[test]
    fn test_aggregate_skips_missing_response() {
        let dom = domain(1);
        let codes = [Some(0), Some(0)];
        let responses = [Some(1.0), None];
        let grouped = StatAggregator::default().aggregate(view(&dom, &codes), &responses, None);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.values().next().unwrap().count, 1);
    }

    #[test]
    fn test_aggregate_with_folds_and_regroup() {
        let dom = domain(2);
        let codes = [Some(0), Some(0), Some(1), Some(0)];
        let responses = [Some(1.0), Some(0.0), Some(1.0), Some(1.0)];
        let folds = [0, 1, 0, 0];
        let grouped =
            StatAggregator::default().aggregate(view(&dom, &codes), &responses, Some(&folds));
        assert_eq!(grouped.len(), 3);

        let folded = FoldedEncodingMap::from_grouped(&grouped);
        assert_eq!(folded.in_fold(0, 0), Some(Stat::new(2.0, 2)));
        assert_eq!(folded.in_fold(0, 1), Some(Stat::new(0.0, 1)));
        assert_eq!(folded.out_of_fold(0, 0), Stat::new(0.0, 1));
        assert_eq!(folded.out_of_fold(0, 1), Stat::new(2.0, 2));
        assert_eq!(folded.out_of_fold(1, 0), Stat::default());
        assert_eq!(folded.folds().into_iter().collect::<Vec<_>>(), vec![0, 1]);

        let regrouped = folded.regroup();
        assert_eq!(regrouped.get(0), Some(Stat::new(2.0, 3)));
        assert_eq!(regrouped.get(1), Some(Stat::new(1.0, 1)));
        assert_eq!(regrouped, ColumnEncodingMap::from_grouped(&grouped));
    }

    #[test]
    fn test_total() {
        let responses = [Some(1.0), None, Some(0.0), Some(1.0)];
        let total = StatAggregator::default()
            .with_partition_rows(1)
            .total(&responses);
        assert_eq!(total, Stat::new(2.0, 3));
    }

    #[test]
    fn test_zero_count_never_stored() {
        let mut map = ColumnEncodingMap::new();
        assert!(!map.insert(CategoryStat {
            category_id: 3,
            sum: 0.0,
            count: 0
        }));
        assert!(map.is_empty());
        assert!(map.insert(CategoryStat {
            category_id: 3,
            sum: 1.0,
            count: 1
        }));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_stat_helpers() {
        let s = Stat::new(3.0, 4);
        assert_eq!(s.posterior_mean(), Some(0.75));
        assert_eq!(s.without(1.0), Stat::new(2.0, 3));
        assert_eq!(Stat::new(1.0, 1).without(1.0).posterior_mean(), None);
    }

    proptest! {
        #[test]
        fn aggregation_is_independent_of_partition_size(
            rows in prop::collection::vec((0u32..6, prop::option::of(0u8..2), 0i64..4), 1..300),
            partition in 1usize..64,
        ) {
            let dom = domain(5);
            let codes: Vec<Option<CategoryId>> =
                rows.iter().map(|(c, _, _)| if *c == 5 { None } else { Some(*c) }).collect();
            let responses: Vec<Option<f64>> =
                rows.iter().map(|(_, y, _)| y.map(f64::from)).collect();
            let folds: Vec<FoldId> = rows.iter().map(|(_, _, f)| *f).collect();

            let sequential = StatAggregator::default()
                .with_partition_rows(usize::MAX)
                .aggregate(view(&dom, &codes), &responses, Some(&folds));
            let partitioned = StatAggregator::default()
                .with_partition_rows(partition)
                .aggregate(view(&dom, &codes), &responses, Some(&folds));
            prop_assert_eq!(sequential, partitioned);
        }

        #[test]
        fn out_of_fold_equals_aggregate_without_fold(
            rows in prop::collection::vec((0u32..4, 0u8..2, 0i64..3), 1..200),
            held_out in 0i64..3,
        ) {
            let dom = domain(4);
            let codes: Vec<Option<CategoryId>> = rows.iter().map(|(c, _, _)| Some(*c)).collect();
            let responses: Vec<Option<f64>> = rows.iter().map(|(_, y, _)| Some(f64::from(*y))).collect();
            let folds: Vec<FoldId> = rows.iter().map(|(_, _, f)| *f).collect();
            let folded = FoldedEncodingMap::from_grouped(
                &StatAggregator::default().aggregate(view(&dom, &codes), &responses, Some(&folds)),
            );

            let kept: Vec<usize> = (0..rows.len()).filter(|&i| folds[i] != held_out).collect();
            let kept_codes: Vec<Option<CategoryId>> = kept.iter().map(|&i| codes[i]).collect();
            let kept_responses: Vec<Option<f64>> = kept.iter().map(|&i| responses[i]).collect();
            let without = ColumnEncodingMap::from_grouped(
                &StatAggregator::default().aggregate(view(&dom, &kept_codes), &kept_responses, None),
            );

            for category in 0..4u32 {
                let expected = without.get(category).unwrap_or_default();
                prop_assert_eq!(folded.out_of_fold(category, held_out), expected);
            }
        }
    }
}
