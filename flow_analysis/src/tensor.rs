//! Dense reconstruction of sparse flow records
//!
//! Records are scattered into a `T×N×N` tensor indexed by the distinct record
//! times and an ascending, de-duplicated id list. Cells no record touches get
//! the value chosen by the [`FillPolicy`].

use crate::data::{FlowRecord, NodeId, Period, RelationRecord};
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Utc};
use flow_math::NumArray;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// What to write into cells no record covers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FillPolicy {
    /// `0.0`
    #[default]
    Zero,
    /// The missing sentinel, serialized as `null`
    Null,
    /// The missing sentinel; kept apart from `Null` only for reporting
    Nan,
    /// A literal value
    Constant(f64),
}

impl FillPolicy {
    /// The cell value this policy inserts
    pub fn fill_value(&self) -> Option<f64> {
        match self {
            FillPolicy::Zero => Some(0.0),
            FillPolicy::Null | FillPolicy::Nan => None,
            FillPolicy::Constant(v) => Some(*v),
        }
    }
}

impl FromStr for FillPolicy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_ascii_lowercase();
        match token.as_str() {
            "zero" => Ok(FillPolicy::Zero),
            "null" | "none" => Ok(FillPolicy::Null),
            "nan" => Ok(FillPolicy::Nan),
            _ => match token.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(FillPolicy::Constant(v)),
                _ => Err(AnalysisError::UnknownFillPolicy(s.to_string())),
            },
        }
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillPolicy::Zero => f.write_str("zero"),
            FillPolicy::Null => f.write_str("null"),
            FillPolicy::Nan => f.write_str("nan"),
            FillPolicy::Constant(v) => write!(f, "{}", v),
        }
    }
}

impl TryFrom<String> for FillPolicy {
    type Error = AnalysisError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FillPolicy> for String {
    fn from(policy: FillPolicy) -> Self {
        policy.to_string()
    }
}

/// Time-varying OD flow: `tensor[t][i][j]` is the flow from `ids[i]` to
/// `ids[j]` at `times[t]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowTensor {
    pub times: Vec<DateTime<Utc>>,
    pub ids: Vec<NodeId>,
    pub tensor: Vec<Vec<Vec<Option<f64>>>>,
    /// `(t, i, j)` of cells written from records; all others hold the fill value
    #[serde(skip)]
    observed: BTreeSet<(usize, usize, usize)>,
}

impl FlowTensor {
    /// Number of time steps
    pub fn t(&self) -> usize {
        self.times.len()
    }

    /// Number of nodes
    pub fn n(&self) -> usize {
        self.ids.len()
    }

    pub fn get(&self, t: usize, i: usize, j: usize) -> Option<f64> {
        self.tensor.get(t)?.get(i)?.get(j).copied().flatten()
    }

    /// True when the cell came from at least one record rather than the fill
    pub fn is_observed(&self, t: usize, i: usize, j: usize) -> bool {
        self.observed.contains(&(t, i, j))
    }

    /// `(time, origin, destination, flow)` of every observed cell that still
    /// holds a present value and lies within the id and time axes
    pub fn observed_cells(&self) -> impl Iterator<Item = (DateTime<Utc>, NodeId, NodeId, f64)> + '_ {
        self.observed.iter().filter_map(move |&(t, i, j)| {
            let flow = self.get(t, i, j).filter(|v| !v.is_nan())?;
            Some((*self.times.get(t)?, *self.ids.get(i)?, *self.ids.get(j)?, flow))
        })
    }

    /// The tensor as a numeric array for metrics and forecasting
    pub fn to_num_array(&self) -> NumArray {
        NumArray::Tensor(self.tensor.clone())
    }
}

/// Static OD relation: `matrix[i][j]` relates `ids[i]` to `ids[j]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowMatrix {
    pub ids: Vec<NodeId>,
    pub matrix: Vec<Vec<Option<f64>>>,
}

impl FlowMatrix {
    pub fn n(&self) -> usize {
        self.ids.len()
    }
}

/// Time series of a single origin/destination pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSeries {
    pub times: Vec<DateTime<Utc>>,
    pub origin_id: NodeId,
    pub destination_id: NodeId,
    pub series: Vec<Option<f64>>,
}

/// Builds dense flow tensors
#[derive(Debug, Clone, Default)]
pub struct TensorBuilder {
    fill: FillPolicy,
    ids: Option<Vec<NodeId>>,
}

impl TensorBuilder {
    pub fn new(fill: FillPolicy) -> Self {
        Self { fill, ids: None }
    }

    /// Index the tensor by a fixed id list (e.g. the whole catalog) instead
    /// of the ids seen in the records. Records touching other ids are skipped.
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.ids = Some(sorted_ids(ids));
        self
    }

    /// Scatter the records that fall inside `period` into a dense tensor
    pub fn build(&self, records: &[FlowRecord], period: &Period) -> FlowTensor {
        let in_period: Vec<&FlowRecord> =
            records.iter().filter(|r| period.contains(r.time())).collect();
        if in_period.len() < records.len() {
            log::debug!(
                "ignored {} records outside the period",
                records.len() - in_period.len()
            );
        }

        let ids = match &self.ids {
            Some(ids) => ids.clone(),
            None => sorted_ids(
                in_period
                    .iter()
                    .flat_map(|r| [r.origin_id(), r.destination_id()]),
            ),
        };
        let index = id_index(&ids);

        let mut skipped = 0usize;
        let mut cells: BTreeMap<(DateTime<Utc>, usize, usize), f64> = BTreeMap::new();
        for r in &in_period {
            match (index.get(&r.origin_id()), index.get(&r.destination_id())) {
                (Some(&i), Some(&j)) => *cells.entry((r.time(), i, j)).or_insert(0.0) += r.flow(),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!("skipped {} records referencing unknown node ids", skipped);
        }

        let times: Vec<DateTime<Utc>> = in_period
            .iter()
            .map(|r| r.time())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let t_index: HashMap<DateTime<Utc>, usize> =
            times.iter().enumerate().map(|(k, t)| (*t, k)).collect();

        let n = ids.len();
        let fill = self.fill.fill_value();
        let mut tensor = vec![vec![vec![fill; n]; n]; times.len()];
        let mut observed = BTreeSet::new();
        for ((time, i, j), flow) in cells {
            let t = t_index[&time];
            tensor[t][i][j] = Some(flow);
            observed.insert((t, i, j));
        }

        log::debug!(
            "built {}x{}x{} tensor with fill policy {}",
            times.len(),
            n,
            n,
            self.fill
        );
        FlowTensor {
            times,
            ids,
            tensor,
            observed,
        }
    }
}

/// Build a `T×N×N` tensor over the ids seen in the records
pub fn build_tensor(records: &[FlowRecord], period: &Period, fill: FillPolicy) -> FlowTensor {
    TensorBuilder::new(fill).build(records, period)
}

/// Build an `N×N` matrix from static relation records.
///
/// A relation with a null cost writes the missing sentinel; cells without a
/// relation get the fill value.
pub fn build_matrix(
    relations: &[RelationRecord],
    ids: impl IntoIterator<Item = NodeId>,
    fill: FillPolicy,
) -> FlowMatrix {
    let ids = sorted_ids(ids);
    let index = id_index(&ids);
    let n = ids.len();
    let mut matrix = vec![vec![fill.fill_value(); n]; n];

    for rel in relations {
        if let (Some(&i), Some(&j)) = (index.get(&rel.origin_id), index.get(&rel.destination_id)) {
            matrix[i][j] = rel.cost;
        }
    }
    FlowMatrix { ids, matrix }
}

/// Series of one origin/destination pair.
///
/// The time axis is the same as [`build_tensor`]'s: every distinct record
/// time inside the period. Times at which the pair has no record get the
/// fill value.
pub fn pair_series(
    records: &[FlowRecord],
    period: &Period,
    origin_id: NodeId,
    destination_id: NodeId,
    fill: FillPolicy,
) -> PairSeries {
    let mut by_time: BTreeMap<DateTime<Utc>, Option<f64>> = BTreeMap::new();
    for r in records.iter().filter(|r| period.contains(r.time())) {
        let cell = by_time.entry(r.time()).or_insert(None);
        if r.origin_id() == origin_id && r.destination_id() == destination_id {
            *cell = Some(cell.unwrap_or(0.0) + r.flow());
        }
    }

    let fill = fill.fill_value();
    let (times, series) = by_time
        .into_iter()
        .map(|(t, flow)| (t, flow.or(fill)))
        .unzip();
    PairSeries {
        times,
        origin_id,
        destination_id,
        series,
    }
}

fn sorted_ids(ids: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn id_index(ids: &[NodeId]) -> HashMap<NodeId, usize> {
    ids.iter().enumerate().map(|(k, id)| (*id, k)).collect()
}
