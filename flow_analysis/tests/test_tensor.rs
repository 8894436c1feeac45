mod common;

use common::*;
use flow_analysis::data::{Period, RelationRecord};
use flow_analysis::tensor::{pair_series, TensorBuilder};
use flow_analysis::{build_matrix, build_tensor, FillPolicy};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case(FillPolicy::Zero)]
#[case(FillPolicy::Null)]
#[case(FillPolicy::Nan)]
#[case(FillPolicy::Constant(-1.0))]
fn test_empty_records_give_empty_tensor(#[case] fill: FillPolicy) {
    let tensor = build_tensor(&[], &scenario_period(), fill);
    assert_eq!(tensor.t(), 0);
    assert_eq!(tensor.n(), 0);
    assert!(tensor.tensor.is_empty());
}

#[test]
fn test_scenario_tensor_with_zero_fill() {
    let tensor = build_tensor(&scenario_records(), &scenario_period(), FillPolicy::Zero);

    assert_eq!(tensor.times, vec![t0(), t1()]);
    assert_eq!(tensor.ids, vec![A, B]);
    assert_eq!(
        tensor.tensor,
        vec![
            vec![vec![Some(0.0), Some(10.0)], vec![Some(4.0), Some(0.0)]],
            vec![vec![Some(0.0), Some(6.0)], vec![Some(0.0), Some(0.0)]],
        ]
    );
}

#[rstest]
#[case(FillPolicy::Nan, None)]
#[case(FillPolicy::Null, None)]
#[case(FillPolicy::Constant(1e9), Some(1e9))]
fn test_fill_policy_applies_to_uncovered_cells(
    #[case] fill: FillPolicy,
    #[case] expected: Option<f64>,
) {
    let tensor = build_tensor(&scenario_records(), &scenario_period(), fill);
    // B -> A has no record at t1
    assert_eq!(tensor.tensor[1][1][0], expected);
    assert_eq!(tensor.get(1, 0, 1), Some(6.0));
}

#[test]
fn test_duplicate_cells_are_summed() {
    let records = vec![record(t0(), A, B, 2.5), record(t0(), A, B, 1.5)];
    let tensor = build_tensor(&records, &scenario_period(), FillPolicy::Zero);
    assert_eq!(tensor.t(), 1);
    assert_eq!(tensor.get(0, 0, 1), Some(4.0));
}

#[test]
fn test_records_outside_period_are_ignored() {
    let period = Period::parse("2022-01-11", "2022-01-12").unwrap();
    let tensor = build_tensor(&scenario_records(), &period, FillPolicy::Zero);
    assert_eq!(tensor.times, vec![t0()]);
    assert_eq!(tensor.get(0, 0, 1), Some(10.0));
}

#[test]
fn test_fixed_id_list_skips_unknown_nodes() {
    let mut records = scenario_records();
    records.push(record(t0(), 9, A, 100.0));

    let tensor = TensorBuilder::new(FillPolicy::Zero)
        .with_ids(vec![3, B, A, B])
        .build(&records, &scenario_period());

    assert_eq!(tensor.ids, vec![A, B, 3]);
    assert_eq!(tensor.n(), 3);
    // the skipped record still contributes its time step
    assert_eq!(tensor.t(), 2);
    let column_a: f64 = (0..3).filter_map(|i| tensor.get(0, i, 0)).sum();
    assert_eq!(column_a, 4.0);
}

#[test]
fn test_relation_matrix() {
    let relations = vec![
        RelationRecord {
            origin_id: A,
            destination_id: B,
            cost: Some(3.5),
        },
        RelationRecord {
            origin_id: B,
            destination_id: A,
            cost: None,
        },
        RelationRecord {
            origin_id: A,
            destination_id: 42,
            cost: Some(1.0),
        },
    ];

    let matrix = build_matrix(&relations, vec![B, A], FillPolicy::Constant(-1.0));
    assert_eq!(matrix.ids, vec![A, B]);
    assert_eq!(
        matrix.matrix,
        vec![vec![Some(-1.0), Some(3.5)], vec![None, Some(-1.0)]]
    );
}

#[rstest]
#[case(FillPolicy::Zero, Some(0.0))]
#[case(FillPolicy::Null, None)]
fn test_pair_series_follows_tensor_time_axis(
    #[case] fill: FillPolicy,
    #[case] missing: Option<f64>,
) {
    let series = pair_series(&scenario_records(), &scenario_period(), B, A, fill);
    assert_eq!(series.times, vec![t0(), t1()]);
    assert_eq!(series.series, vec![Some(4.0), missing]);
    assert_eq!((series.origin_id, series.destination_id), (B, A));
}

#[test]
fn test_tensor_serializes_missing_as_null() {
    let tensor = build_tensor(&scenario_records(), &scenario_period(), FillPolicy::Nan);
    let json = serde_json::to_value(&tensor).unwrap();
    assert_eq!(json["ids"], serde_json::json!([1, 2]));
    assert!(json["tensor"][1][1][0].is_null());
    assert_eq!(json["tensor"][0][0][1], serde_json::json!(10.0));
}
