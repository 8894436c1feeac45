//! Flow records, geographic nodes and analysis request types
//!
//! Also hosts the CSV loaders used by the in-memory source and catalog.

use crate::error::{AnalysisError, Result};
use crate::utils::date_parser::parse_instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Identifier of a geographic node
pub type NodeId = i64;

/// One time-stamped origin/destination flow observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRecord {
    time: DateTime<Utc>,
    origin_id: NodeId,
    destination_id: NodeId,
    flow: f64,
    #[serde(rename = "type")]
    dyna_type: String,
}

impl FlowRecord {
    /// Create a new flow record; the flow must be finite and non-negative
    pub fn new(
        time: DateTime<Utc>,
        origin_id: NodeId,
        destination_id: NodeId,
        flow: f64,
        dyna_type: impl Into<String>,
    ) -> Result<Self> {
        if !flow.is_finite() || flow < 0.0 {
            return Err(AnalysisError::InvalidRecord(format!(
                "flow {} from {} to {} at {} must be a finite non-negative number",
                flow, origin_id, destination_id, time
            )));
        }
        Ok(Self {
            time,
            origin_id,
            destination_id,
            flow,
            dyna_type: dyna_type.into(),
        })
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn origin_id(&self) -> NodeId {
        self.origin_id
    }

    pub fn destination_id(&self) -> NodeId {
        self.destination_id
    }

    pub fn flow(&self) -> f64 {
        self.flow
    }

    pub fn dyna_type(&self) -> &str {
        &self.dyna_type
    }

    /// True when no filter is given or the record's type matches it
    pub fn matches_type(&self, dyna_type: Option<&str>) -> bool {
        dyna_type.map_or(true, |t| self.dyna_type == t)
    }
}

/// Granularity of a geographic node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    City,
    Province,
}

impl FromStr for NodeKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "city" => Ok(NodeKind::City),
            "province" => Ok(NodeKind::Province),
            other => Err(AnalysisError::ParseError(format!(
                "unknown node kind '{}'",
                other
            ))),
        }
    }
}

/// Reference data for one geographic node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoNode {
    pub id: NodeId,
    pub name: String,
    /// Province the node belongs to; `None` when it cannot be resolved
    pub province: Option<String>,
    pub kind: NodeKind,
}

impl GeoNode {
    pub fn city(id: NodeId, name: &str, province: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            province: Some(province.to_string()),
            kind: NodeKind::City,
        }
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Period {
    /// Create a new period; fails unless `start < end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(AnalysisError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a period from two ISO-8601 timestamps
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_instant(start)?, parse_instant(end)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }
}

/// Static relation (e.g. travel cost) between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub origin_id: NodeId,
    pub destination_id: NodeId,
    pub cost: Option<f64>,
}

/// Time dimension of an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateMode {
    /// One entry per calendar day and group
    Daily,
    /// One entry per group over the whole period
    Total,
}

/// Which endpoint of a flow defines its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Group by origin
    Send,
    /// Group by destination
    Arrive,
}

/// Whether groups are raw nodes or the provinces they belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupLevel {
    Node,
    Province,
}

macro_rules! token_enum {
    ($ty:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = AnalysisError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($token => Ok($ty::$variant),)+
                    other => Err(AnalysisError::ParseError(format!(
                        "unknown {} '{}'",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

token_enum!(DateMode { Daily => "daily", Total => "total" });
token_enum!(Direction { Send => "send", Arrive => "arrive" });
token_enum!(GroupLevel { Node => "node", Province => "province" });

/// Parameters of one flow aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    /// Free-form label of the period (e.g. `daily`, `2026_spring_festival`)
    pub period_type: String,
    pub period: Period,
    pub date_mode: DateMode,
    pub direction: Direction,
    pub dyna_type: Option<String>,
}

impl AggregationRequest {
    /// Create a request with the daily/send defaults
    pub fn new(period_type: impl Into<String>, period: Period) -> Self {
        Self {
            period_type: period_type.into(),
            period,
            date_mode: DateMode::Daily,
            direction: Direction::Send,
            dyna_type: None,
        }
    }

    pub fn with_date_mode(mut self, date_mode: DateMode) -> Self {
        self.date_mode = date_mode;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_dyna_type(mut self, dyna_type: Option<String>) -> Self {
        self.dyna_type = dyna_type;
        self
    }
}

#[derive(Debug, Deserialize)]
struct FlowRow {
    time: String,
    origin_id: NodeId,
    destination_id: NodeId,
    flow: Option<f64>,
    #[serde(rename = "type", default)]
    dyna_type: String,
}

#[derive(Debug, Deserialize)]
struct NodeRow {
    #[serde(alias = "geo_id")]
    id: NodeId,
    name: String,
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Read flow records from CSV with columns `time,origin_id,destination_id,flow,type`.
///
/// Rows with an empty flow are skipped.
pub fn read_flows<R: Read>(reader: R) -> Result<Vec<FlowRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in rdr.deserialize() {
        let row: FlowRow = row?;
        let Some(flow) = row.flow else {
            skipped += 1;
            continue;
        };
        let time = parse_instant(&row.time)?;
        records.push(FlowRecord::new(
            time,
            row.origin_id,
            row.destination_id,
            flow,
            row.dyna_type,
        )?);
    }
    if skipped > 0 {
        log::warn!("skipped {} flow rows without a flow value", skipped);
    }
    log::debug!("loaded {} flow records", records.len());
    Ok(records)
}

/// Read geographic nodes from CSV with columns `id,name,province,kind`
pub fn read_nodes<R: Read>(reader: R) -> Result<Vec<GeoNode>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut nodes = Vec::new();
    for row in rdr.deserialize() {
        let row: NodeRow = row?;
        let kind = match row.kind.as_deref() {
            Some(k) if !k.trim().is_empty() => k.parse()?,
            _ => NodeKind::City,
        };
        nodes.push(GeoNode {
            id: row.id,
            name: row.name,
            province: row.province.filter(|p| !p.trim().is_empty()),
            kind,
        });
    }
    Ok(nodes)
}

/// Read relation records from CSV with columns `origin_id,destination_id,cost`
pub fn read_relations<R: Read>(reader: R) -> Result<Vec<RelationRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut relations = Vec::new();
    for row in rdr.deserialize() {
        relations.push(row?);
    }
    Ok(relations)
}

/// Load flow records from a CSV file
pub fn load_flows_csv<P: AsRef<Path>>(path: P) -> Result<Vec<FlowRecord>> {
    read_flows(File::open(path)?)
}

/// Load geographic nodes from a CSV file
pub fn load_nodes_csv<P: AsRef<Path>>(path: P) -> Result<Vec<GeoNode>> {
    read_nodes(File::open(path)?)
}

/// Load relation records from a CSV file
pub fn load_relations_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RelationRecord>> {
    read_relations(File::open(path)?)
}
