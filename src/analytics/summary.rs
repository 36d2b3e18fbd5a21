//! # Performance Summary
//!
//! Runs every per-asset metric over an aligned price table and assembles
//! one row per asset. Data and config errors abort the sweep; a per-asset
//! computation error only marks that cell not computable and the sweep
//! proceeds.

use tracing::warn;

use crate::config::AnalysisConfig;
use crate::error::Error;
use crate::error::Result;
use crate::analytics::market;
use crate::analytics::ratios;
use crate::analytics::returns;
use crate::analytics::risk;
use crate::analytics::risk::VarMethod;
use crate::types::MetricValue;
use crate::types::PriceTable;
use crate::types::ReturnKind;
use crate::types::ReturnSeries;

/// One row of the per-asset metrics table, in export column order.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetMetrics {
  pub ticker: String,
  pub total_return: MetricValue,
  pub annualized_return: MetricValue,
  pub volatility: MetricValue,
  pub max_drawdown: MetricValue,
  pub var: MetricValue,
  pub cvar: MetricValue,
  pub sharpe: MetricValue,
  pub sortino: MetricValue,
  pub calmar: MetricValue,
  pub omega: MetricValue,
  pub beta: MetricValue,
  pub alpha: MetricValue,
  pub treynor: MetricValue,
}

/// Localize a per-asset computation failure to a not-computable cell;
/// anything else still aborts the run.
fn cell(result: Result<f64>) -> Result<MetricValue> {
  match result {
    Ok(v) => Ok(MetricValue::Num(v)),
    Err(err) if err.is_localizable() => {
      warn!(%err, "metric localized to not-computable");
      Ok(MetricValue::NotComputable)
    }
    Err(err) => Err(err),
  }
}

/// Per-asset metric sweep over an aligned price table.
///
/// `benchmark` feeds Beta/Alpha/Treynor; without one those cells are
/// reported not computable. The benchmark must be aligned to the table's
/// return index.
pub fn performance_summary(
  table: &PriceTable,
  benchmark: Option<&ReturnSeries>,
  config: &AnalysisConfig,
) -> Result<Vec<AssetMetrics>> {
  config.validate()?;

  let expected_returns = table.rows() - 1;
  if let Some(bench) = benchmark {
    if bench.len() != expected_returns {
      return Err(Error::data(
        &bench.ticker,
        format!(
          "benchmark has {} returns but the table implies {expected_returns}",
          bench.len()
        ),
      ));
    }
  }

  let rf = config.risk_free_rate;
  let confidence = config.var_confidence;
  let mut rows = Vec::with_capacity(table.assets());

  for idx in 0..table.assets() {
    let prices = table.series(idx)?;
    let rets = returns::return_series(&prices, ReturnKind::Simple);

    let (beta, alpha, treynor) = match benchmark {
      Some(bench) => (
        cell(market::beta(&rets, bench))?,
        cell(market::jensen_alpha(&rets, bench, rf))?,
        cell(market::treynor_ratio(&rets, bench, rf))?,
      ),
      None => (
        MetricValue::NotComputable,
        MetricValue::NotComputable,
        MetricValue::NotComputable,
      ),
    };

    rows.push(AssetMetrics {
      ticker: prices.ticker().to_string(),
      total_return: MetricValue::Num(returns::total_return(&prices)),
      annualized_return: cell(returns::annualized_return(&rets))?,
      volatility: cell(risk::volatility(&rets))?,
      max_drawdown: MetricValue::Num(risk::max_drawdown(&prices)),
      var: cell(risk::value_at_risk(&rets, confidence, VarMethod::Historical))?,
      cvar: cell(risk::conditional_var(&rets, confidence))?,
      sharpe: cell(ratios::sharpe_ratio(&rets, rf))?,
      sortino: cell(ratios::sortino_ratio(&rets, rf, 0.0))?,
      calmar: cell(ratios::calmar_ratio(&prices, &rets))?,
      omega: cell(ratios::omega_ratio(&rets, 0.0))?,
      beta,
      alpha,
      treynor,
    });
  }

  Ok(rows)
}

#[cfg(test)]
mod tests {
  use chrono::Days;
  use chrono::NaiveDate;
  use tracing_test::traced_test;

  use super::*;
  use crate::types::PriceSeries;

  fn table(columns: &[(&str, &[f64])]) -> PriceTable {
    let rows = columns[0].1.len();
    let dates: Vec<NaiveDate> = (0..rows)
      .map(|i| {
        NaiveDate::from_ymd_opt(2024, 4, 1)
          .unwrap()
          .checked_add_days(Days::new(i as u64))
          .unwrap()
      })
      .collect();
    let series: Vec<PriceSeries> = columns
      .iter()
      .map(|(t, p)| PriceSeries::new(*t, dates.clone(), p.to_vec()).unwrap())
      .collect();
    PriceTable::from_series(&series).unwrap()
  }

  #[traced_test]
  #[test]
  fn zero_volatility_asset_is_localized() {
    // FLAT grows a constant 1% a day; its Sharpe/Sortino are undefined but
    // the other asset's row must still compute.
    let t = table(&[
      ("FLAT", &[100.0, 101.0, 102.01, 103.0301]),
      ("MOVER", &[100.0, 102.0, 101.0, 105.0]),
    ]);
    let rows = performance_summary(&t, None, &AnalysisConfig::default()).unwrap();

    let flat = &rows[0];
    assert_eq!(flat.volatility, MetricValue::Num(0.0));
    assert_eq!(flat.sharpe, MetricValue::NotComputable);
    assert_eq!(flat.sortino, MetricValue::NotComputable);
    assert_eq!(flat.calmar, MetricValue::NotComputable);

    let mover = &rows[1];
    assert!(mover.sharpe.is_computable());
    assert!(mover.volatility.is_computable());
    assert!(logs_contain("not-computable"));
  }

  #[test]
  fn benchmark_cells_require_a_benchmark() {
    let t = table(&[("A", &[100.0, 102.0, 101.0, 105.0])]);
    let rows = performance_summary(&t, None, &AnalysisConfig::default()).unwrap();
    assert_eq!(rows[0].beta, MetricValue::NotComputable);
    assert_eq!(rows[0].alpha, MetricValue::NotComputable);
    assert_eq!(rows[0].treynor, MetricValue::NotComputable);
  }

  #[test]
  fn self_benchmark_recovers_capm_identities() {
    let t = table(&[("SPY", &[100.0, 102.0, 101.0, 105.0])]);
    let bench = returns::return_series(&t.series(0).unwrap(), ReturnKind::Simple);
    let rows = performance_summary(&t, Some(&bench), &AnalysisConfig::default()).unwrap();
    let beta = rows[0].beta.as_f64().unwrap();
    let alpha = rows[0].alpha.as_f64().unwrap();
    assert!((beta - 1.0).abs() < 1e-9);
    assert!(alpha.abs() < 1e-9);
  }

  #[test]
  fn misaligned_benchmark_aborts() {
    let t = table(&[("A", &[100.0, 102.0, 101.0, 105.0])]);
    let bench = ReturnSeries::new("SPY", ReturnKind::Simple, vec![0.01, 0.02]);
    assert!(matches!(
      performance_summary(&t, Some(&bench), &AnalysisConfig::default()),
      Err(Error::Data { .. })
    ));
  }

  #[test]
  fn invalid_config_aborts_before_computation() {
    let t = table(&[("A", &[100.0, 102.0, 101.0, 105.0])]);
    let cfg = AnalysisConfig {
      var_confidence: 1.5,
      ..AnalysisConfig::default()
    };
    assert!(matches!(
      performance_summary(&t, None, &cfg),
      Err(Error::Config { .. })
    ));
  }
}
