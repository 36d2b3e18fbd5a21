//! # Risk Metrics
//!
//! $$
//! \mathrm{VaR}_c = -Q_{1-c}(r), \qquad
//! \mathrm{CVaR}_c = -\mathbb{E}[r \mid r \le Q_{1-c}(r)]
//! $$
//!
//! Volatility, downside deviation, drawdowns, and tail-loss metrics.

use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::Error;
use crate::error::Result;
use crate::types::PriceSeries;
use crate::types::ReturnSeries;

pub(crate) fn sample_mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().sum::<f64>() / xs.len() as f64
  }
}

pub(crate) fn sample_variance(xs: &[f64], mean: f64) -> f64 {
  if xs.len() < 2 {
    return 0.0;
  }
  let mut acc = 0.0;
  for &x in xs {
    let d = x - mean;
    acc += d * d;
  }
  acc / (xs.len() - 1) as f64
}

fn require_min_len(returns: &ReturnSeries, metric: &'static str) -> Result<()> {
  if returns.len() < 2 {
    return Err(Error::data(
      &returns.ticker,
      format!("{metric} needs at least 2 return observations"),
    ));
  }
  Ok(())
}

/// Annualized volatility: sample standard deviation x sqrt(252).
///
/// A zero-variance series yields 0.0 without error.
pub fn volatility(returns: &ReturnSeries) -> Result<f64> {
  require_min_len(returns, "volatility")?;
  let mean = sample_mean(&returns.values);
  let var = sample_variance(&returns.values, mean);
  Ok(var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Annualized downside deviation: root mean square of returns strictly
/// below `target` (default target is 0 at the call sites).
///
/// A series with no sub-target return yields 0.0.
pub fn downside_deviation(returns: &ReturnSeries, target: f64) -> Result<f64> {
  require_min_len(returns, "downside deviation")?;
  let downside: Vec<f64> = returns
    .values
    .iter()
    .filter(|&&r| r < target)
    .map(|&r| r * r)
    .collect();
  if downside.is_empty() {
    return Ok(0.0);
  }
  let mean_sq = downside.iter().sum::<f64>() / downside.len() as f64;
  Ok(mean_sq.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Drawdown from the running peak at every observation; entries are <= 0.
pub fn drawdown_series(prices: &PriceSeries) -> Vec<f64> {
  let mut peak = f64::NEG_INFINITY;
  prices
    .prices()
    .iter()
    .map(|&p| {
      peak = peak.max(p);
      (p - peak) / peak
    })
    .collect()
}

/// Deepest drawdown over the horizon; 0 only for a non-decreasing path.
pub fn max_drawdown(prices: &PriceSeries) -> f64 {
  drawdown_series(prices)
    .into_iter()
    .fold(0.0, f64::min)
}

/// VaR estimation method.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarMethod {
  /// Empirical quantile with linear interpolation between order statistics.
  #[default]
  Historical,
  /// Gaussian quantile from the sample mean and standard deviation.
  Parametric,
}

impl VarMethod {
  /// Parse a string into a [`VarMethod`].
  pub fn from_str(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "parametric" | "gaussian" | "normal" => Self::Parametric,
      _ => Self::Historical,
    }
  }
}

fn check_confidence(confidence: f64) -> Result<()> {
  if !(confidence > 0.0 && confidence < 1.0) {
    return Err(Error::config(
      "var_confidence",
      format!("{confidence} outside (0, 1)"),
    ));
  }
  Ok(())
}

/// Linear-interpolated quantile of an ascending-sorted slice, `p` in [0, 1].
fn quantile_linear(sorted: &[f64], p: f64) -> f64 {
  let n = sorted.len();
  let pos = p * (n - 1) as f64;
  let lo = pos.floor() as usize;
  let frac = pos - lo as f64;
  if lo + 1 < n {
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
  } else {
    sorted[n - 1]
  }
}

fn sorted_returns(returns: &ReturnSeries) -> Vec<f64> {
  let mut xs = returns.values.clone();
  xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
  xs
}

/// Value at Risk at `confidence`, reported as a positive loss magnitude.
pub fn value_at_risk(
  returns: &ReturnSeries,
  confidence: f64,
  method: VarMethod,
) -> Result<f64> {
  require_min_len(returns, "VaR")?;
  check_confidence(confidence)?;

  match method {
    VarMethod::Historical => {
      let sorted = sorted_returns(returns);
      Ok(-quantile_linear(&sorted, 1.0 - confidence))
    }
    VarMethod::Parametric => {
      let mean = sample_mean(&returns.values);
      let std = sample_variance(&returns.values, mean).sqrt();
      let z = Normal::new(0.0, 1.0).unwrap().inverse_cdf(1.0 - confidence);
      Ok(-(mean + z * std))
    }
  }
}

/// Conditional VaR: mean of all returns at or below the historical VaR
/// quantile, reported as a positive loss magnitude.
pub fn conditional_var(returns: &ReturnSeries, confidence: f64) -> Result<f64> {
  require_min_len(returns, "CVaR")?;
  check_confidence(confidence)?;

  let sorted = sorted_returns(returns);
  let threshold = quantile_linear(&sorted, 1.0 - confidence);
  // The interpolated quantile is >= the sample minimum, so the tail is
  // never empty.
  let tail: Vec<f64> = sorted.iter().copied().take_while(|&r| r <= threshold).collect();
  Ok(-sample_mean(&tail))
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use chrono::Days;
  use chrono::NaiveDate;

  use super::*;
  use crate::types::ReturnKind;

  fn price_series(prices: &[f64]) -> PriceSeries {
    let dates = (0..prices.len())
      .map(|i| {
        NaiveDate::from_ymd_opt(2024, 6, 1)
          .unwrap()
          .checked_add_days(Days::new(i as u64))
          .unwrap()
      })
      .collect();
    PriceSeries::new("TEST", dates, prices.to_vec()).unwrap()
  }

  fn returns(values: &[f64]) -> ReturnSeries {
    ReturnSeries::new("TEST", ReturnKind::Simple, values.to_vec())
  }

  #[test]
  fn volatility_matches_closed_form() {
    let rs = returns(&[0.02, -0.009_803_921_568_627_45, 0.039_603_960_396_039_6]);
    let mean = sample_mean(&rs.values);
    let expected = sample_variance(&rs.values, mean).sqrt() * 252.0_f64.sqrt();
    assert_relative_eq!(volatility(&rs).unwrap(), expected, max_relative = 1e-12);
  }

  #[test]
  fn zero_variance_gives_zero_volatility() {
    let rs = returns(&[0.01, 0.01, 0.01, 0.01]);
    assert_eq!(volatility(&rs).unwrap(), 0.0);
  }

  #[test]
  fn single_observation_is_a_data_error() {
    let rs = returns(&[0.01]);
    assert!(matches!(volatility(&rs), Err(Error::Data { .. })));
    assert!(matches!(
      value_at_risk(&rs, 0.95, VarMethod::Historical),
      Err(Error::Data { .. })
    ));
  }

  #[test]
  fn max_drawdown_is_never_positive() {
    let ps = price_series(&[100.0, 102.0, 101.0, 105.0]);
    let mdd = max_drawdown(&ps);
    assert!(mdd <= 0.0);
    assert_relative_eq!(mdd, (101.0 - 102.0) / 102.0, max_relative = 1e-12);
  }

  #[test]
  fn monotone_prices_have_zero_drawdown() {
    let ps = price_series(&[100.0, 100.0, 101.0, 103.0]);
    assert_eq!(max_drawdown(&ps), 0.0);
  }

  #[test]
  fn downside_deviation_of_all_gains_is_zero() {
    let rs = returns(&[0.01, 0.02, 0.005]);
    assert_eq!(downside_deviation(&rs, 0.0).unwrap(), 0.0);
  }

  #[test]
  fn historical_var_interpolates_order_statistics() {
    let rs = returns(&[-0.05, -0.01, 0.0, 0.01, 0.02]);
    // p = 0.05 over 5 points: pos = 0.2 between -0.05 and -0.01.
    let expected = -(-0.05 + 0.2 * (-0.01 - -0.05));
    assert_relative_eq!(
      value_at_risk(&rs, 0.95, VarMethod::Historical).unwrap(),
      expected,
      max_relative = 1e-12
    );
  }

  #[test]
  fn cvar_magnitude_dominates_var() {
    let rs = returns(&[-0.08, -0.03, -0.01, 0.0, 0.01, 0.015, 0.02, 0.025]);
    let var = value_at_risk(&rs, 0.95, VarMethod::Historical).unwrap();
    let cvar = conditional_var(&rs, 0.95).unwrap();
    assert!(cvar.abs() >= var.abs());
  }

  #[test]
  fn parametric_var_uses_gaussian_quantile() {
    let rs = returns(&[0.01, -0.02, 0.015, -0.005, 0.0]);
    let mean = sample_mean(&rs.values);
    let std = sample_variance(&rs.values, mean).sqrt();
    let z = Normal::new(0.0, 1.0).unwrap().inverse_cdf(0.05);
    let expected = -(mean + z * std);
    assert_relative_eq!(
      value_at_risk(&rs, 0.95, VarMethod::Parametric).unwrap(),
      expected,
      max_relative = 1e-12
    );
  }

  #[test]
  fn invalid_confidence_is_a_config_error() {
    let rs = returns(&[0.01, -0.02]);
    assert!(matches!(
      value_at_risk(&rs, 1.0, VarMethod::Historical),
      Err(Error::Config { .. })
    ));
  }
}
