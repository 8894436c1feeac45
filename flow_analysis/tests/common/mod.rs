#![allow(dead_code)]

use chrono::{DateTime, Utc};
use flow_analysis::data::{FlowRecord, GeoNode, NodeId, Period};
use flow_analysis::utils::date_parser::parse_instant;
use flow_analysis::{InMemoryCatalog, InMemorySource};

pub const A: NodeId = 1;
pub const B: NodeId = 2;

pub fn t(s: &str) -> DateTime<Utc> {
    parse_instant(s).unwrap()
}

pub fn t0() -> DateTime<Utc> {
    t("2022-01-11T00:00:00Z")
}

pub fn t1() -> DateTime<Utc> {
    t("2022-01-12T00:00:00Z")
}

pub fn record(time: DateTime<Utc>, origin: NodeId, destination: NodeId, flow: f64) -> FlowRecord {
    FlowRecord::new(time, origin, destination, flow, "state").unwrap()
}

/// `[(t0,A,B,10), (t0,B,A,4), (t1,A,B,6)]`
pub fn scenario_records() -> Vec<FlowRecord> {
    vec![
        record(t0(), A, B, 10.0),
        record(t0(), B, A, 4.0),
        record(t1(), A, B, 6.0),
    ]
}

/// A in P1, B in P2
pub fn scenario_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(vec![GeoNode::city(A, "A", "P1"), GeoNode::city(B, "B", "P2")])
}

pub fn scenario_source() -> InMemorySource {
    InMemorySource::new(scenario_records())
}

/// Both scenario days
pub fn scenario_period() -> Period {
    Period::parse("2022-01-11", "2022-01-13").unwrap()
}
