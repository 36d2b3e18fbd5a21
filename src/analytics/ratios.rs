//! # Risk-Adjusted Ratios
//!
//! $$
//! \mathrm{Sharpe} = \frac{R_{\text{ann}} - r_f}{\sigma_{\text{ann}}}
//! $$
//!
//! Sharpe, Sortino, Calmar and Omega. A zero denominator is a computation
//! error, never a silent infinity.

use crate::error::Error;
use crate::error::Result;
use crate::analytics::returns::annualized_return;
use crate::analytics::risk::downside_deviation;
use crate::analytics::risk::max_drawdown;
use crate::analytics::risk::volatility;
use crate::types::PriceSeries;
use crate::types::ReturnSeries;

const DENOM_TOLERANCE: f64 = 1e-12;

/// Excess annualized return per unit of annualized volatility.
pub fn sharpe_ratio(returns: &ReturnSeries, risk_free_rate: f64) -> Result<f64> {
  let ann = annualized_return(returns)?;
  let vol = volatility(returns)?;
  if vol < DENOM_TOLERANCE {
    return Err(Error::computation(
      &returns.ticker,
      "sharpe",
      "zero volatility",
    ));
  }
  Ok((ann - risk_free_rate) / vol)
}

/// Excess annualized return per unit of downside deviation below `target`.
pub fn sortino_ratio(
  returns: &ReturnSeries,
  risk_free_rate: f64,
  target: f64,
) -> Result<f64> {
  let ann = annualized_return(returns)?;
  let dd = downside_deviation(returns, target)?;
  if dd < DENOM_TOLERANCE {
    return Err(Error::computation(
      &returns.ticker,
      "sortino",
      "zero downside deviation",
    ));
  }
  Ok((ann - risk_free_rate) / dd)
}

/// Annualized return over the magnitude of the maximum drawdown.
pub fn calmar_ratio(prices: &PriceSeries, returns: &ReturnSeries) -> Result<f64> {
  let ann = annualized_return(returns)?;
  let mdd = max_drawdown(prices).abs();
  if mdd < DENOM_TOLERANCE {
    return Err(Error::computation(
      &returns.ticker,
      "calmar",
      "zero maximum drawdown",
    ));
  }
  Ok(ann / mdd)
}

/// Probability-weighted gains over losses around `threshold`.
pub fn omega_ratio(returns: &ReturnSeries, threshold: f64) -> Result<f64> {
  if returns.is_empty() {
    return Err(Error::data(&returns.ticker, "empty return series"));
  }
  let gains: f64 = returns
    .values
    .iter()
    .map(|&r| (r - threshold).max(0.0))
    .sum();
  let losses: f64 = returns
    .values
    .iter()
    .map(|&r| (threshold - r).max(0.0))
    .sum();
  if losses < DENOM_TOLERANCE {
    return Err(Error::computation(
      &returns.ticker,
      "omega",
      "no returns below threshold",
    ));
  }
  Ok(gains / losses)
}
