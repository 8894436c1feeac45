use flow_analysis::config::ENV_PREFIX;
use flow_analysis::{AnalysisConfig, AnalysisError, FillPolicy};
use flow_math::{ForecastMethod, MathError};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_defaults() {
    let config = AnalysisConfig::default();
    assert_eq!(config.topk, 10);
    assert_eq!(config.topk_intra, 10);
    assert_eq!(config.topk_inter, 30);
    assert_eq!(config.fill, FillPolicy::Zero);
    assert_eq!(config.forecast_method, ForecastMethod::MovingAverage);
    assert_eq!(config.forecast_window, 3);
    assert!(config.validate().is_ok());
    assert_eq!(ENV_PREFIX, "FLOW_ATLAS_");
}

#[test]
fn test_json_file_keeps_unset_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"topk": 5, "fill": "nan", "forecast_method": "naive", "noise_seed": 7}}"#
    )
    .unwrap();

    let config = AnalysisConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.topk, 5);
    assert_eq!(config.fill, FillPolicy::Nan);
    assert_eq!(config.forecast_method, ForecastMethod::Naive);
    assert_eq!(config.noise_seed, Some(7));
    assert_eq!(config.topk_inter, 30);
}

#[test]
fn test_json_file_with_bad_fill() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"fill": "sparse"}}"#).unwrap();
    assert!(matches!(
        AnalysisConfig::from_json_file(file.path()),
        Err(AnalysisError::JsonError(_))
    ));
}

#[test]
fn test_overrides_win_over_file_values() {
    let env = vars(&[("TOPK_INTER", "7"), ("FILL", "2.5"), ("NOISE_RATIO", "0.1")]);
    let config = AnalysisConfig::default()
        .with_overrides(|key| env.get(key).cloned())
        .unwrap();

    assert_eq!(config.topk_inter, 7);
    assert_eq!(config.fill, FillPolicy::Constant(2.5));
    assert_eq!(config.noise_ratio, 0.1);
    assert_eq!(config.topk, 10);
}

#[test]
fn test_invalid_overrides() {
    let negative = vars(&[("TOPK", "-3")]);
    assert!(matches!(
        AnalysisConfig::default().with_overrides(|k| negative.get(k).cloned()),
        Err(AnalysisError::InvalidTopK { class: "province", value: -3 })
    ));

    let garbage = vars(&[("FORECAST_WINDOW", "three")]);
    assert!(matches!(
        AnalysisConfig::default().with_overrides(|k| garbage.get(k).cloned()),
        Err(AnalysisError::InvalidParameter(_))
    ));

    let method = vars(&[("FORECAST_METHOD", "arima")]);
    assert!(matches!(
        AnalysisConfig::default().with_overrides(|k| method.get(k).cloned()),
        Err(AnalysisError::Math(MathError::InvalidInput(_)))
    ));

    let window = vars(&[("FORECAST_WINDOW", "0")]);
    assert!(AnalysisConfig::default()
        .with_overrides(|k| window.get(k).cloned())
        .is_err());
}

#[test]
fn test_forecaster_selection() {
    let config = AnalysisConfig::default();
    assert_eq!(config.forecaster().unwrap().name(), "moving_average");
    assert_eq!(
        config.forecaster_for(ForecastMethod::Naive).unwrap().name(),
        "naive"
    );

    let bad_noise = AnalysisConfig {
        noise_ratio: 2.0,
        ..AnalysisConfig::default()
    };
    assert!(bad_noise.forecaster_for(ForecastMethod::NoisyReplay).is_err());
}
