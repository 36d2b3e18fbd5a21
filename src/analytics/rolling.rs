//! # Rolling Analytics
//!
//! $$
//! m_t = f\!\left(r_{t-W+1}, \ldots, r_t\right), \quad t \ge W - 1
//! $$
//!
//! Fixed-window rolling volatility, Sharpe, and Beta. Output is aligned to
//! the return index; the first `W - 1` entries are explicit gaps, as is any
//! window whose metric is undefined on that slice.

use std::fmt::Display;

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::Error;
use crate::error::Result;
use crate::types::ReturnKind;
use crate::types::ReturnMatrix;
use crate::types::ReturnSeries;

/// Metric computed over each trailing window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollingMetric {
  Volatility,
  Sharpe,
  Beta,
}

impl Display for RollingMetric {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RollingMetric::Volatility => write!(f, "volatility"),
      RollingMetric::Sharpe => write!(f, "sharpe"),
      RollingMetric::Beta => write!(f, "beta"),
    }
  }
}

/// One asset's rolling metric, aligned to its return index.
#[derive(Clone, Debug, PartialEq)]
pub struct RollingSeries {
  pub ticker: String,
  pub metric: RollingMetric,
  pub window: usize,
  /// `None` marks the warmup gap and windows where the metric is undefined.
  pub values: Vec<Option<f64>>,
}

fn check_window(window: usize) -> Result<()> {
  if window < 2 {
    return Err(Error::config(
      "rolling_windows",
      format!("window {window} shorter than 2"),
    ));
  }
  Ok(())
}

fn window_mean(xs: &[f64]) -> f64 {
  xs.iter().sum::<f64>() / xs.len() as f64
}

fn window_volatility(xs: &[f64]) -> f64 {
  let mean = window_mean(xs);
  let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (xs.len() - 1) as f64;
  var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

fn window_annualized(xs: &[f64], kind: ReturnKind) -> Option<f64> {
  let total = match kind {
    ReturnKind::Simple => xs.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0,
    ReturnKind::Log => xs.iter().sum::<f64>().exp() - 1.0,
  };
  let base = 1.0 + total;
  if base <= 0.0 {
    return None;
  }
  Some(base.powf(TRADING_DAYS_PER_YEAR / xs.len() as f64) - 1.0)
}

fn window_beta(asset: &[f64], benchmark: &[f64]) -> Option<f64> {
  let ma = window_mean(asset);
  let mb = window_mean(benchmark);
  let mut cov = 0.0;
  let mut var_b = 0.0;
  for i in 0..asset.len() {
    let da = asset[i] - ma;
    let db = benchmark[i] - mb;
    cov += da * db;
    var_b += db * db;
  }
  if var_b < 1e-15 {
    return None;
  }
  Some(cov / var_b)
}

fn roll<F>(values: &[f64], window: usize, f: F) -> Vec<Option<f64>>
where
  F: Fn(&[f64]) -> Option<f64>,
{
  (0..values.len())
    .map(|t| {
      if t + 1 < window {
        None
      } else {
        f(&values[t + 1 - window..=t])
      }
    })
    .collect()
}

/// Rolling annualized volatility over trailing `window` returns.
pub fn rolling_volatility(returns: &ReturnSeries, window: usize) -> Result<RollingSeries> {
  check_window(window)?;
  Ok(RollingSeries {
    ticker: returns.ticker.clone(),
    metric: RollingMetric::Volatility,
    window,
    values: roll(&returns.values, window, |w| Some(window_volatility(w))),
  })
}

/// Rolling Sharpe: annualized slice return less `risk_free_rate`, over the
/// slice's annualized volatility. Zero-volatility windows are gaps.
pub fn rolling_sharpe(
  returns: &ReturnSeries,
  window: usize,
  risk_free_rate: f64,
) -> Result<RollingSeries> {
  check_window(window)?;
  let kind = returns.kind;
  Ok(RollingSeries {
    ticker: returns.ticker.clone(),
    metric: RollingMetric::Sharpe,
    window,
    values: roll(&returns.values, window, |w| {
      let vol = window_volatility(w);
      if vol < 1e-12 {
        return None;
      }
      window_annualized(w, kind).map(|ann| (ann - risk_free_rate) / vol)
    }),
  })
}

/// Rolling Beta against a benchmark slice of the same window.
pub fn rolling_beta(
  asset: &ReturnSeries,
  benchmark: &ReturnSeries,
  window: usize,
) -> Result<RollingSeries> {
  check_window(window)?;
  if asset.len() != benchmark.len() {
    return Err(Error::data(
      &asset.ticker,
      "asset and benchmark return lengths differ",
    ));
  }
  let values = (0..asset.len())
    .map(|t| {
      if t + 1 < window {
        None
      } else {
        window_beta(
          &asset.values[t + 1 - window..=t],
          &benchmark.values[t + 1 - window..=t],
        )
      }
    })
    .collect();
  Ok(RollingSeries {
    ticker: asset.ticker.clone(),
    metric: RollingMetric::Beta,
    window,
    values,
  })
}

/// One rolling metric for every asset of a return matrix.
pub fn rolling_table(
  returns: &ReturnMatrix,
  metric: RollingMetric,
  window: usize,
  risk_free_rate: f64,
  benchmark: Option<&ReturnSeries>,
) -> Result<Vec<RollingSeries>> {
  (0..returns.assets())
    .map(|i| {
      let series = returns.series(i);
      match metric {
        RollingMetric::Volatility => rolling_volatility(&series, window),
        RollingMetric::Sharpe => rolling_sharpe(&series, window, risk_free_rate),
        RollingMetric::Beta => {
          let bench = benchmark.ok_or_else(|| {
            Error::data(&series.ticker, "rolling beta requires a benchmark series")
          })?;
          rolling_beta(&series, bench, window)
        }
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  fn series(values: &[f64]) -> ReturnSeries {
    ReturnSeries::new("TEST", ReturnKind::Simple, values.to_vec())
  }

  #[test]
  fn warmup_entries_are_gaps() {
    let rs = series(&[0.01, -0.02, 0.015, 0.005, -0.01]);
    let out = rolling_volatility(&rs, 3).unwrap();
    assert_eq!(out.values.len(), 5);
    assert!(out.values[0].is_none());
    assert!(out.values[1].is_none());
    assert!(out.values[2].is_some());
    assert!(out.values[4].is_some());
  }

  #[test]
  fn rolling_volatility_matches_full_window() {
    let rs = series(&[0.01, -0.02, 0.015]);
    let out = rolling_volatility(&rs, 3).unwrap();
    let full = crate::analytics::risk::volatility(&rs).unwrap();
    assert_relative_eq!(out.values[2].unwrap(), full, max_relative = 1e-12);
  }

  #[test]
  fn rolling_sharpe_gaps_on_flat_window() {
    let rs = series(&[0.01, 0.01, 0.01, -0.02]);
    let out = rolling_sharpe(&rs, 3, 0.0).unwrap();
    // First full window is constant: zero volatility, explicit gap.
    assert!(out.values[2].is_none());
    assert!(out.values[3].is_some());
  }

  #[test]
  fn rolling_beta_of_self_is_one() {
    let rs = series(&[0.01, -0.02, 0.015, 0.005, -0.01, 0.02]);
    let out = rolling_beta(&rs, &rs, 4).unwrap();
    for v in out.values.iter().skip(3) {
      assert_relative_eq!(v.unwrap(), 1.0, max_relative = 1e-12);
    }
  }

  #[test]
  fn window_of_one_is_a_config_error() {
    let rs = series(&[0.01, -0.02]);
    assert!(matches!(
      rolling_volatility(&rs, 1),
      Err(Error::Config { .. })
    ));
  }
}
