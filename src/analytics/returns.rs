//! # Return Calculation
//!
//! $$
//! R_{\text{ann}} = (1 + R_{\text{total}})^{252/n} - 1
//! $$
//!
//! Simple/log per-period returns and cumulative/annualized aggregates.

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::Error;
use crate::error::Result;
use crate::types::PriceSeries;
use crate::types::PriceTable;
use crate::types::ReturnKind;
use crate::types::ReturnMatrix;
use crate::types::ReturnSeries;

fn periodic(prices: &[f64], kind: ReturnKind) -> Vec<f64> {
  let mut out = Vec::with_capacity(prices.len().saturating_sub(1));
  for pair in prices.windows(2) {
    let r = match kind {
      ReturnKind::Simple => (pair[1] - pair[0]) / pair[0],
      ReturnKind::Log => (pair[1] / pair[0]).ln(),
    };
    out.push(r);
  }
  out
}

/// Per-period returns of one price series; `len = prices - 1`.
pub fn return_series(prices: &PriceSeries, kind: ReturnKind) -> ReturnSeries {
  ReturnSeries::new(prices.ticker(), kind, periodic(prices.prices(), kind))
}

/// Per-period returns for every column of an aligned price table.
pub fn return_matrix(table: &PriceTable, kind: ReturnKind) -> ReturnMatrix {
  let columns = (0..table.assets())
    .map(|i| periodic(table.column(i), kind))
    .collect();
  ReturnMatrix::from_aligned(kind, table.tickers().to_vec(), columns)
}

/// Total return over the whole horizon, straight from first/last price.
pub fn total_return(prices: &PriceSeries) -> f64 {
  let p = prices.prices();
  p[p.len() - 1] / p[0] - 1.0
}

/// Compound the whole series into a single total return.
pub fn cumulative_return(returns: &ReturnSeries) -> f64 {
  match returns.kind {
    ReturnKind::Simple => returns.values.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0,
    ReturnKind::Log => returns.values.iter().sum::<f64>().exp() - 1.0,
  }
}

/// Running cumulative return after each period.
pub fn cumulative_return_series(returns: &ReturnSeries) -> Vec<f64> {
  let mut out = Vec::with_capacity(returns.len());
  match returns.kind {
    ReturnKind::Simple => {
      let mut acc = 1.0;
      for r in &returns.values {
        acc *= 1.0 + r;
        out.push(acc - 1.0);
      }
    }
    ReturnKind::Log => {
      let mut acc = 0.0;
      for r in &returns.values {
        acc += r;
        out.push(acc.exp() - 1.0);
      }
    }
  }
  out
}

/// Running cumulative returns for every column of a return matrix, one
/// column per asset in `tickers()` order.
pub fn cumulative_return_matrix(returns: &ReturnMatrix) -> Vec<Vec<f64>> {
  (0..returns.assets())
    .map(|i| cumulative_return_series(&returns.series(i)))
    .collect()
}

/// Geometric annualization `(1 + total)^(252/n) - 1`.
///
/// Fails when the series is empty or when `1 + total <= 0`, where the
/// fractional power is undefined.
pub fn annualized_return(returns: &ReturnSeries) -> Result<f64> {
  if returns.is_empty() {
    return Err(Error::data(&returns.ticker, "empty return series"));
  }
  let total = cumulative_return(returns);
  let base = 1.0 + total;
  if base <= 0.0 {
    return Err(Error::computation(
      &returns.ticker,
      "annualized return",
      format!("1 + total return = {base} is non-positive"),
    ));
  }
  Ok(base.powf(TRADING_DAYS_PER_YEAR / returns.len() as f64) - 1.0)
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use chrono::Days;
  use chrono::NaiveDate;

  use super::*;

  fn series(prices: &[f64]) -> PriceSeries {
    let dates = (0..prices.len())
      .map(|i| {
        NaiveDate::from_ymd_opt(2024, 3, 1)
          .unwrap()
          .checked_add_days(Days::new(i as u64))
          .unwrap()
      })
      .collect();
    PriceSeries::new("TEST", dates, prices.to_vec()).unwrap()
  }

  #[test]
  fn simple_returns_match_closed_form() {
    let rs = return_series(&series(&[100.0, 102.0, 101.0, 105.0]), ReturnKind::Simple);
    assert_eq!(rs.len(), 3);
    assert_relative_eq!(rs.values[0], 0.02, max_relative = 1e-9);
    assert_relative_eq!(rs.values[1], -0.009_803_921_6, max_relative = 1e-6);
    assert_relative_eq!(rs.values[2], 0.039_603_960_4, max_relative = 1e-6);
  }

  #[test]
  fn log_and_simple_cumulative_agree() {
    let ps = series(&[100.0, 102.0, 101.0, 105.0]);
    let simple = return_series(&ps, ReturnKind::Simple);
    let log = return_series(&ps, ReturnKind::Log);
    assert_relative_eq!(cumulative_return(&simple), 0.05, max_relative = 1e-12);
    assert_relative_eq!(cumulative_return(&log), 0.05, max_relative = 1e-12);
    assert_relative_eq!(total_return(&ps), 0.05, max_relative = 1e-12);
  }

  #[test]
  fn cumulative_series_ends_at_total() {
    let rs = return_series(&series(&[100.0, 102.0, 101.0, 105.0]), ReturnKind::Simple);
    let cum = cumulative_return_series(&rs);
    assert_eq!(cum.len(), 3);
    assert_relative_eq!(cum[2], 0.05, max_relative = 1e-12);
  }

  #[test]
  fn annualized_return_matches_closed_form() {
    let rs = return_series(&series(&[100.0, 102.0, 101.0, 105.0]), ReturnKind::Simple);
    let expected = 1.05_f64.powf(252.0 / 3.0) - 1.0;
    assert_relative_eq!(annualized_return(&rs).unwrap(), expected, max_relative = 1e-12);
  }

  #[test]
  fn total_wipeout_is_not_annualizable() {
    // -60% then -80% leaves 1 + total well below zero after compounding
    // with a further -200% shock injected directly.
    let rs = ReturnSeries::new("TEST", ReturnKind::Simple, vec![-0.6, -0.8, -2.0]);
    let err = annualized_return(&rs).unwrap_err();
    assert!(matches!(err, Error::Computation { .. }));
  }
}
