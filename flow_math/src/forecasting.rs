//! Baseline forecasters for flow series
//!
//! A history is a [`NumArray`] whose outermost dimension is time: a vector is
//! a series of scalars, a matrix a series of vectors and a tensor a series of
//! `N×N` OD matrices. Every forecaster returns `horizon` future slices
//! stacked the same way.
//!
//! Contains:
//! - Naive (repeat the last slice)
//! - Moving Average (mean of the last `window` slices)
//! - Noisy Replay (naive continuation with proportional random noise)

use crate::array::{present, NumArray};
use crate::{MathError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;

/// A pluggable forecasting capability
pub trait Forecaster: Debug + Send + Sync {
    /// Produce `horizon` future slices continuing `history`
    fn forecast(&self, history: &NumArray, horizon: i64) -> Result<NumArray>;

    /// Name of the forecaster
    fn name(&self) -> &str;
}

/// Built-in forecasting strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    Naive,
    MovingAverage,
    NoisyReplay,
}

impl FromStr for ForecastMethod {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" => Ok(ForecastMethod::Naive),
            "moving_average" | "ma" => Ok(ForecastMethod::MovingAverage),
            "noisy_replay" | "noisy" => Ok(ForecastMethod::NoisyReplay),
            other => Err(MathError::InvalidInput(format!(
                "unknown forecast method '{}'; expected naive, moving_average or noisy_replay",
                other
            ))),
        }
    }
}

/// Forecast with one of the built-in methods.
///
/// `window` only matters for [`ForecastMethod::MovingAverage`] and defaults
/// to 3.
pub fn forecast(
    history: &NumArray,
    horizon: i64,
    method: ForecastMethod,
    window: Option<usize>,
) -> Result<NumArray> {
    match method {
        ForecastMethod::Naive => Naive.forecast(history, horizon),
        ForecastMethod::MovingAverage => {
            MovingAverage::new(window.unwrap_or(MovingAverage::DEFAULT_WINDOW))?
                .forecast(history, horizon)
        }
        ForecastMethod::NoisyReplay => NoisyReplay::default().forecast(history, horizon),
    }
}

fn check_horizon(horizon: i64) -> Result<usize> {
    if horizon <= 0 {
        return Err(MathError::InvalidHorizon(horizon));
    }
    usize::try_from(horizon).map_err(|_| MathError::InvalidHorizon(horizon))
}

fn history_slices(history: &NumArray) -> Result<Vec<NumArray>> {
    let slices = history.time_slices()?;
    if slices.is_empty() {
        return Err(MathError::EmptyHistory);
    }
    // rejects ragged histories before any slice is reused
    history.shape()?;
    Ok(slices)
}

/// Repeats the last observed slice
#[derive(Debug, Clone, Copy, Default)]
pub struct Naive;

impl Forecaster for Naive {
    fn forecast(&self, history: &NumArray, horizon: i64) -> Result<NumArray> {
        let horizon = check_horizon(horizon)?;
        let slices = history_slices(history)?;
        let last = slices[slices.len() - 1].clone();
        NumArray::stack(vec![last; horizon])
    }

    fn name(&self) -> &str {
        "naive"
    }
}

/// Averages the last `window` slices and repeats the average
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
}

impl MovingAverage {
    pub const DEFAULT_WINDOW: usize = 3;

    /// Create a new moving average forecaster
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(MathError::InvalidInput(
                "Window size must be positive".to_string(),
            ));
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Element-wise mean of the trailing window.
    ///
    /// Missing elements are left out of the mean; an element missing in
    /// every slice of the window stays missing.
    fn window_mean(&self, slices: &[NumArray]) -> NumArray {
        let w = self.window.min(slices.len());
        let tail = &slices[slices.len() - w..];
        let template = &tail[tail.len() - 1];

        let mut sums = vec![0.0; template.len()];
        let mut counts = vec![0usize; template.len()];
        for slice in tail {
            for (i, value) in slice.values().into_iter().enumerate() {
                if let Some(v) = present(value) {
                    sums[i] += v;
                    counts[i] += 1;
                }
            }
        }

        let mut means = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, n)| if n == 0 { None } else { Some(sum / n as f64) });
        template.map(|_| means.next().flatten())
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self {
            window: Self::DEFAULT_WINDOW,
        }
    }
}

impl Forecaster for MovingAverage {
    fn forecast(&self, history: &NumArray, horizon: i64) -> Result<NumArray> {
        let horizon = check_horizon(horizon)?;
        let slices = history_slices(history)?;
        let average = self.window_mean(&slices);
        NumArray::stack(vec![average; horizon])
    }

    fn name(&self) -> &str {
        "moving_average"
    }
}

/// Naive continuation with every present value perturbed by
/// `value * noise_ratio * U(-1, 1)` and clamped at zero.
///
/// Stands in for a real predictor when demonstrating metrics.
#[derive(Debug, Clone)]
pub struct NoisyReplay {
    noise_ratio: f64,
    seed: Option<u64>,
}

impl NoisyReplay {
    pub const DEFAULT_NOISE_RATIO: f64 = 0.03;

    /// Create a new noisy replay forecaster; a seed makes the output reproducible
    pub fn new(noise_ratio: f64, seed: Option<u64>) -> Result<Self> {
        if !(0.0..=1.0).contains(&noise_ratio) {
            return Err(MathError::InvalidInput(format!(
                "noise ratio must be within [0, 1], got {}",
                noise_ratio
            )));
        }
        Ok(Self { noise_ratio, seed })
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Perturb every present value of `values`, keeping its shape
    pub fn perturb(&self, values: &NumArray) -> NumArray {
        let mut rng = self.rng();
        let ratio = self.noise_ratio;
        values.map(|value| {
            present(value).map(|v| {
                let noise = v * ratio * rng.gen_range(-1.0..=1.0);
                (v + noise).max(0.0)
            })
        })
    }
}

impl Default for NoisyReplay {
    fn default() -> Self {
        Self {
            noise_ratio: Self::DEFAULT_NOISE_RATIO,
            seed: None,
        }
    }
}

impl Forecaster for NoisyReplay {
    fn forecast(&self, history: &NumArray, horizon: i64) -> Result<NumArray> {
        let continuation = Naive.forecast(history, horizon)?;
        Ok(self.perturb(&continuation))
    }

    fn name(&self) -> &str {
        "noisy_replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: &[&[f64]]) -> NumArray {
        NumArray::Matrix(
            rows.iter()
                .map(|r| r.iter().copied().map(Some).collect())
                .collect(),
        )
    }

    #[test]
    fn naive_repeats_last_slice() {
        let history = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let out = forecast(&history, 2, ForecastMethod::Naive, None).unwrap();
        assert_eq!(out, matrix(&[&[3.0, 4.0], &[3.0, 4.0]]));
    }

    #[test]
    fn naive_on_scalar_series() {
        let history = NumArray::from_values(&[5.0, 6.0, 7.0]);
        let out = Naive.forecast(&history, 3).unwrap();
        assert_eq!(out, NumArray::from_values(&[7.0, 7.0, 7.0]));
    }

    #[test]
    fn moving_average_clips_window_to_history() {
        let history = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let out = MovingAverage::new(5).unwrap().forecast(&history, 1).unwrap();
        assert_eq!(out, matrix(&[&[2.0, 3.0]]));
    }

    #[test]
    fn moving_average_skips_missing_values() {
        let history = NumArray::Matrix(vec![
            vec![Some(2.0), None],
            vec![Some(4.0), None],
            vec![None, None],
        ]);
        let out = MovingAverage::new(3).unwrap().forecast(&history, 1).unwrap();
        match out {
            NumArray::Matrix(m) => {
                assert_relative_eq!(m[0][0].unwrap(), 3.0);
                assert_eq!(m[0][1], None);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn moving_average_over_od_tensor() {
        let history = NumArray::Tensor(vec![
            vec![vec![Some(0.0), Some(10.0)], vec![Some(4.0), Some(0.0)]],
            vec![vec![Some(0.0), Some(20.0)], vec![Some(8.0), Some(0.0)]],
        ]);
        let out = MovingAverage::new(2).unwrap().forecast(&history, 2).unwrap();
        assert_eq!(out.shape().unwrap(), vec![2, 2, 2]);
        assert_eq!(out.values()[1], Some(15.0));
        assert_eq!(out.values()[6], Some(6.0));
    }

    #[test]
    fn empty_history_fails() {
        let history = NumArray::Vector(vec![]);
        assert_eq!(Naive.forecast(&history, 1), Err(MathError::EmptyHistory));
    }

    #[test]
    fn non_positive_horizon_fails() {
        let history = NumArray::from_values(&[1.0]);
        assert_eq!(Naive.forecast(&history, 0), Err(MathError::InvalidHorizon(0)));
        assert_eq!(
            MovingAverage::default().forecast(&history, -2),
            Err(MathError::InvalidHorizon(-2))
        );
    }

    #[test]
    fn noisy_replay_stays_within_ratio() {
        let history = NumArray::from_values(&[100.0, 200.0]);
        let replay = NoisyReplay::new(0.1, Some(7)).unwrap();
        let out = replay.forecast(&history, 4).unwrap();
        for v in out.values() {
            let v = v.unwrap();
            assert!((180.0..=220.0).contains(&v));
        }
        assert_eq!(out, replay.forecast(&history, 4).unwrap());
    }

    #[test]
    fn method_tokens_parse() {
        assert_eq!("naive".parse::<ForecastMethod>().unwrap(), ForecastMethod::Naive);
        assert_eq!(
            "Moving_Average".parse::<ForecastMethod>().unwrap(),
            ForecastMethod::MovingAverage
        );
        assert!("arima".parse::<ForecastMethod>().is_err());
    }
}
