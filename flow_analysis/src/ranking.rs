//! Dense ranking of aggregated flows
//!
//! Entries are ordered by flow, largest first. Equal flows share a rank and
//! the next distinct flow gets the following rank, so ranks never skip. The
//! name tie-break only fixes the iteration order of tied entries.

use crate::aggregation::AggregatedFlow;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Something that can take part in a dense ranking
pub trait Ranked {
    fn flow(&self) -> f64;

    /// Names compared ascending when flows are equal
    fn tie_key(&self) -> (&str, &str);

    fn set_rank(&mut self, rank: u32);
}

impl Ranked for AggregatedFlow {
    fn flow(&self) -> f64 {
        self.flow
    }

    fn tie_key(&self) -> (&str, &str) {
        (&self.group_key, "")
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}

fn by_flow_desc<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.flow()
        .total_cmp(&a.flow())
        .then_with(|| a.tie_key().cmp(&b.tie_key()))
}

/// Sort `items` by flow descending and assign dense 1-based ranks
pub fn dense_rank<T: Ranked>(items: &mut [T]) {
    items.sort_by(by_flow_desc);
    let mut rank = 0u32;
    let mut previous: Option<f64> = None;
    for item in items.iter_mut() {
        if previous != Some(item.flow()) {
            rank += 1;
            previous = Some(item.flow());
        }
        item.set_rank(rank);
    }
}

/// Rank aggregated entries within each date bucket.
///
/// Daily entries are ranked per day, period totals (no date) across all
/// groups. The result is ordered by date, then rank, then group name.
pub fn rank(entries: Vec<AggregatedFlow>) -> Vec<AggregatedFlow> {
    let mut buckets: BTreeMap<Option<NaiveDate>, Vec<AggregatedFlow>> = BTreeMap::new();
    for entry in entries {
        buckets.entry(entry.date).or_default().push(entry);
    }

    buckets
        .into_values()
        .flat_map(|mut bucket| {
            dense_rank(&mut bucket);
            bucket
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, flow: f64) -> AggregatedFlow {
        AggregatedFlow {
            group_key: key.to_string(),
            date: None,
            flow,
            rank: 0,
        }
    }

    #[test]
    fn ties_share_a_rank_without_gaps() {
        let ranked = rank(vec![
            entry("c", 5.0),
            entry("a", 9.0),
            entry("d", 5.0),
            entry("b", 9.0),
            entry("e", 1.0),
        ]);
        let view: Vec<(&str, u32)> = ranked.iter().map(|e| (e.group_key.as_str(), e.rank)).collect();
        assert_eq!(
            view,
            vec![("a", 1), ("b", 1), ("c", 2), ("d", 2), ("e", 3)]
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(rank(Vec::new()).is_empty());
    }
}
