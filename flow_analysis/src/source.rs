//! Flow record sources

use crate::data::{load_flows_csv, FlowRecord, Period};
use crate::error::Result;
use std::path::Path;

/// Supplies flow records for a half-open period
pub trait FlowSource {
    /// Records with `period.start <= time < period.end`, optionally restricted
    /// to one record type, ordered by time
    fn fetch_flows(&self, period: &Period, dyna_type: Option<&str>) -> Result<Vec<FlowRecord>>;
}

/// Source over records already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<FlowRecord>,
}

impl InMemorySource {
    pub fn new(mut records: Vec<FlowRecord>) -> Self {
        records.sort_by_key(|r| r.time());
        Self { records }
    }

    /// Load every record of a CSV file up front
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(load_flows_csv(path)?))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FlowSource for InMemorySource {
    fn fetch_flows(&self, period: &Period, dyna_type: Option<&str>) -> Result<Vec<FlowRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| period.contains(r.time()) && r.matches_type(dyna_type))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date_parser::parse_instant;

    #[test]
    fn fetch_is_half_open_and_filtered() {
        let t = |s: &str| parse_instant(s).unwrap();
        let source = InMemorySource::new(vec![
            FlowRecord::new(t("2022-01-12"), 1, 2, 5.0, "state").unwrap(),
            FlowRecord::new(t("2022-01-11"), 1, 2, 3.0, "state").unwrap(),
            FlowRecord::new(t("2022-01-11"), 2, 1, 4.0, "trip").unwrap(),
        ]);
        let period = Period::parse("2022-01-11", "2022-01-12").unwrap();

        let all = source.fetch_flows(&period, None).unwrap();
        assert_eq!(all.len(), 2);

        let state = source.fetch_flows(&period, Some("state")).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].flow(), 3.0);
    }
}
