//! Collapse flow observations by day and group
//!
//! The group of an observation is its origin (send) or destination (arrive),
//! either as the node itself or as the province the node belongs to. Nodes
//! the catalog cannot place are left out and reported in [`DataQuality`].

use crate::catalog::NodeCatalog;
use crate::data::{AggregationRequest, DateMode, Direction, FlowRecord, GroupLevel, NodeId};
use crate::ranking::rank;
use crate::tensor::FlowTensor;
use crate::utils::days_in_period;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Flow of one group, for one day or for the whole period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedFlow {
    /// Node or province name
    pub group_key: String,
    /// Calendar day (UTC); `None` for period totals
    pub date: Option<NaiveDate>,
    pub flow: f64,
    /// Dense rank within the date bucket, starting at 1
    pub rank: u32,
}

/// Observations left out because their node could not be grouped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQuality {
    /// Nodes unknown to the catalog or without a province
    pub unresolved_nodes: BTreeSet<NodeId>,
    pub excluded_records: usize,
    pub excluded_flow: f64,
}

impl DataQuality {
    pub fn is_clean(&self) -> bool {
        self.excluded_records == 0
    }

    pub(crate) fn exclude(&mut self, node: NodeId, flow: f64) {
        self.unresolved_nodes.insert(node);
        self.excluded_records += 1;
        self.excluded_flow += flow;
    }

    pub(crate) fn report(&self, context: &str) {
        if !self.is_clean() {
            log::warn!(
                "{}: excluded {} observations ({} flow) from unresolved nodes {:?}",
                context,
                self.excluded_records,
                self.excluded_flow,
                self.unresolved_nodes
            );
        }
    }
}

/// Ranked aggregation output
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub entries: Vec<AggregatedFlow>,
    pub quality: DataQuality,
}

/// One `(time, origin, destination, flow)` observation
type Observation = (DateTime<Utc>, NodeId, NodeId, f64);

/// Resolve the group name of a node at the requested level
pub(crate) fn group_name<C: NodeCatalog + ?Sized>(
    catalog: &C,
    id: NodeId,
    level: GroupLevel,
) -> Option<String> {
    match level {
        GroupLevel::Node => catalog.resolve_node(id).map(|n| n.name.clone()),
        GroupLevel::Province => catalog.province_of(id).map(str::to_string),
    }
}

/// Aggregate flow records.
///
/// Records outside the request period or of another `dyna_type` are ignored.
/// With [`DateMode::Daily`] only days fully covered by the period are
/// reported: each gets an entry for every group that moved on any covered
/// day, zero when it did not move that day. Records on a day the period only
/// partly covers appear in the total but not in the daily view.
pub fn aggregate<C: NodeCatalog + ?Sized>(
    records: &[FlowRecord],
    request: &AggregationRequest,
    level: GroupLevel,
    catalog: &C,
) -> Aggregation {
    let dyna_type = request.dyna_type.as_deref();
    let observations = records
        .iter()
        .filter(|r| r.matches_type(dyna_type))
        .map(|r| (r.time(), r.origin_id(), r.destination_id(), r.flow()));
    aggregate_observations(observations, request, level, catalog)
}

/// Aggregate a dense tensor.
///
/// Only cells written from records count; cells holding the fill value are
/// skipped, so the result matches [`aggregate`] over the same records
/// whatever the fill policy. The tensor is taken as already filtered, so the
/// request's `dyna_type` is not applied again.
pub fn aggregate_tensor<C: NodeCatalog + ?Sized>(
    tensor: &FlowTensor,
    request: &AggregationRequest,
    level: GroupLevel,
    catalog: &C,
) -> Aggregation {
    aggregate_observations(tensor.observed_cells(), request, level, catalog)
}

fn aggregate_observations<C, I>(
    observations: I,
    request: &AggregationRequest,
    level: GroupLevel,
    catalog: &C,
) -> Aggregation
where
    C: NodeCatalog + ?Sized,
    I: Iterator<Item = Observation>,
{
    let mut quality = DataQuality::default();
    let mut sums: BTreeMap<(Option<NaiveDate>, String), f64> = BTreeMap::new();
    let mut groups: BTreeSet<String> = BTreeSet::new();
    let days: BTreeSet<NaiveDate> = match request.date_mode {
        DateMode::Daily => days_in_period(&request.period).into_iter().collect(),
        DateMode::Total => BTreeSet::new(),
    };
    let mut partial_day = 0usize;

    for (time, origin, destination, flow) in observations {
        if !request.period.contains(time) {
            continue;
        }
        if request.date_mode == DateMode::Daily && !days.contains(&time.date_naive()) {
            partial_day += 1;
            continue;
        }
        let node = match request.direction {
            Direction::Send => origin,
            Direction::Arrive => destination,
        };
        let Some(group) = group_name(catalog, node, level) else {
            quality.exclude(node, flow);
            continue;
        };
        let date = match request.date_mode {
            DateMode::Daily => Some(time.date_naive()),
            DateMode::Total => None,
        };
        groups.insert(group.clone());
        *sums.entry((date, group)).or_insert(0.0) += flow;
    }

    if partial_day > 0 {
        log::debug!(
            "left {} observations on partially covered days out of the daily view",
            partial_day
        );
    }
    for day in &days {
        for group in &groups {
            sums.entry((Some(*day), group.clone())).or_insert(0.0);
        }
    }

    quality.report(&format!("{} {} aggregation", level, request.direction));
    let entries = sums
        .into_iter()
        .map(|((date, group_key), flow)| AggregatedFlow {
            group_key,
            date,
            flow,
            rank: 0,
        })
        .collect();

    Aggregation {
        entries: rank(entries),
        quality,
    }
}
