//! # Market Risk
//!
//! $$
//! \beta = \frac{\mathrm{Cov}(r_a, r_b)}{\mathrm{Var}(r_b)}, \qquad
//! \alpha = R_a - \left[r_f + \beta (R_b - r_f)\right]
//! $$
//!
//! Benchmark-relative metrics: Beta, Jensen's Alpha, Treynor and the
//! Information Ratio. Alpha is the CAPM residual on annualized returns,
//! not an OLS regression intercept.

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::Error;
use crate::error::Result;
use crate::analytics::returns::annualized_return;
use crate::types::ReturnSeries;

const DENOM_TOLERANCE: f64 = 1e-12;

fn sample_mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().sum::<f64>() / xs.len() as f64
  }
}

fn check_alignment(asset: &ReturnSeries, benchmark: &ReturnSeries) -> Result<()> {
  if asset.len() != benchmark.len() {
    return Err(Error::data(
      &asset.ticker,
      format!(
        "asset has {} returns but benchmark {} has {}",
        asset.len(),
        benchmark.ticker,
        benchmark.len()
      ),
    ));
  }
  if asset.len() < 2 {
    return Err(Error::data(
      &asset.ticker,
      "market metrics need at least 2 return observations",
    ));
  }
  Ok(())
}

/// Sensitivity of asset returns to benchmark returns.
pub fn beta(asset: &ReturnSeries, benchmark: &ReturnSeries) -> Result<f64> {
  check_alignment(asset, benchmark)?;

  let ma = sample_mean(&asset.values);
  let mb = sample_mean(&benchmark.values);
  let n = asset.len();

  let mut cov = 0.0;
  let mut var_b = 0.0;
  for i in 0..n {
    let da = asset.values[i] - ma;
    let db = benchmark.values[i] - mb;
    cov += da * db;
    var_b += db * db;
  }
  cov /= (n - 1) as f64;
  var_b /= (n - 1) as f64;

  if var_b < DENOM_TOLERANCE {
    return Err(Error::computation(
      &asset.ticker,
      "beta",
      "zero benchmark variance",
    ));
  }
  Ok(cov / var_b)
}

/// CAPM residual `R_a - [r_f + beta (R_b - r_f)]` on annualized returns.
pub fn jensen_alpha(
  asset: &ReturnSeries,
  benchmark: &ReturnSeries,
  risk_free_rate: f64,
) -> Result<f64> {
  let b = beta(asset, benchmark)?;
  let ra = annualized_return(asset)?;
  let rb = annualized_return(benchmark)?;
  Ok(ra - (risk_free_rate + b * (rb - risk_free_rate)))
}

/// Excess annualized return per unit of systematic risk.
pub fn treynor_ratio(
  asset: &ReturnSeries,
  benchmark: &ReturnSeries,
  risk_free_rate: f64,
) -> Result<f64> {
  let b = beta(asset, benchmark)?;
  if b.abs() < DENOM_TOLERANCE {
    return Err(Error::computation(&asset.ticker, "treynor", "zero beta"));
  }
  let ra = annualized_return(asset)?;
  Ok((ra - risk_free_rate) / b)
}

/// Annualized active return over annualized tracking error.
pub fn information_ratio(asset: &ReturnSeries, benchmark: &ReturnSeries) -> Result<f64> {
  check_alignment(asset, benchmark)?;

  let diffs: Vec<f64> = asset
    .values
    .iter()
    .zip(&benchmark.values)
    .map(|(a, b)| a - b)
    .collect();
  let mean = sample_mean(&diffs);
  let mut var = 0.0;
  for &d in &diffs {
    var += (d - mean) * (d - mean);
  }
  var /= (diffs.len() - 1) as f64;
  let tracking_error = var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();

  if tracking_error < DENOM_TOLERANCE {
    return Err(Error::computation(
      &asset.ticker,
      "information ratio",
      "zero tracking error",
    ));
  }

  let ra = annualized_return(asset)?;
  let rb = annualized_return(benchmark)?;
  Ok((ra - rb) / tracking_error)
}
