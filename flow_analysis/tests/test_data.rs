mod common;

use common::*;
use flow_analysis::data::{
    load_flows_csv, load_nodes_csv, load_relations_csv, read_flows, AggregationRequest, DateMode,
    Direction, NodeKind, Period,
};
use flow_analysis::{AnalysisError, InMemorySource};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_load_flows_from_csv() {
    let file = csv_file(&[
        "time,origin_id,destination_id,flow,type",
        "2022-01-11T00:00:00Z,1,2,10,state",
        "2022-01-11 00:00:00,2,1,4,state",
        "2022-01-12,1,2,6.0,state",
        "2022-01-12,2,1,,state",
    ]);

    let records = load_flows_csv(file.path()).unwrap();
    assert_eq!(records, scenario_records());
}

#[test]
fn test_negative_flow_is_rejected() {
    let data = "time,origin_id,destination_id,flow,type\n2022-01-11,1,2,-3,state\n";
    let err = read_flows(data.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidRecord(_)));
}

#[test]
fn test_bad_timestamp_is_a_parse_error() {
    let data = "time,origin_id,destination_id,flow,type\nlast tuesday,1,2,3,state\n";
    assert!(matches!(
        read_flows(data.as_bytes()),
        Err(AnalysisError::ParseError(_))
    ));
}

#[test]
fn test_load_nodes_from_csv() {
    let file = csv_file(&[
        "geo_id,name,province,kind",
        "1,Nanjing,Jiangsu,city",
        "2,Jiangsu,Jiangsu,province",
        "3,Offshore,,",
    ]);

    let nodes = load_nodes_csv(file.path()).unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].province.as_deref(), Some("Jiangsu"));
    assert_eq!(nodes[1].kind, NodeKind::Province);
    assert_eq!(nodes[2].province, None);
    assert_eq!(nodes[2].kind, NodeKind::City);
}

#[test]
fn test_load_relations_from_csv() {
    let file = csv_file(&["origin_id,destination_id,cost", "1,2,3.5", "2,1,"]);
    let relations = load_relations_csv(file.path()).unwrap();
    assert_eq!(relations.len(), 2);
    assert_eq!(relations[0].cost, Some(3.5));
    assert_eq!(relations[1].cost, None);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = load_flows_csv("/nonexistent/flows.csv").unwrap_err();
    assert!(matches!(err, AnalysisError::IoError(_)));
}

#[test]
fn test_source_from_csv() {
    let file = csv_file(&[
        "time,origin_id,destination_id,flow,type",
        "2022-01-12T00:00:00Z,1,2,6,state",
        "2022-01-11T00:00:00Z,1,2,10,state",
    ]);
    let source = InMemorySource::from_csv(file.path()).unwrap();
    assert_eq!(source.len(), 2);
    assert!(!source.is_empty());
}

#[test]
fn test_period_is_half_open() {
    let period = Period::parse("2022-01-11", "2022-01-12").unwrap();
    assert!(period.contains(t0()));
    assert!(!period.contains(t1()));
}

#[test]
fn test_request_tokens() {
    assert_eq!("TOTAL".parse::<DateMode>().unwrap(), DateMode::Total);
    assert_eq!("arrive".parse::<Direction>().unwrap(), Direction::Arrive);
    assert!("weekly".parse::<DateMode>().is_err());
    assert_eq!(Direction::Send.to_string(), "send");

    let request = AggregationRequest::new("2022_spring", scenario_period());
    assert_eq!(request.date_mode, DateMode::Daily);
    assert_eq!(request.direction, Direction::Send);
    assert_eq!(request.dyna_type, None);
}
