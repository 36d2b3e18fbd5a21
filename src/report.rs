//! # Report Tables
//!
//! Tabular output for the presentation and export collaborators: the
//! per-asset metrics table in its fixed column order and the simulation
//! table with distinguished-row flags. CSV serialization uses 6
//! significant digits and plain decimals (0.125, never "12.5%") so exports
//! stay diff-stable across runs.

use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;

use crate::analytics::frontier::EfficientFrontierResult;
use crate::analytics::summary::AssetMetrics;
use crate::types::MetricValue;

/// Significant digits used by every serialized number.
pub const EXPORT_SIGNIFICANT_DIGITS: i32 = 6;

/// Marker token for cells whose metric is not computable.
pub const NOT_COMPUTABLE_TOKEN: &str = "n/a";

/// Fixed export column order for the per-asset metrics table.
pub const METRIC_COLUMNS: [&str; 13] = [
  "Total Return",
  "Annualized Return",
  "Volatility",
  "Max Drawdown",
  "VaR95",
  "CVaR95",
  "Sharpe",
  "Sortino",
  "Calmar",
  "Omega",
  "Beta",
  "Alpha",
  "Treynor",
];

/// Round-trip-stable decimal rendering with fixed significant digits.
fn format_significant(x: f64, digits: i32) -> String {
  if x == 0.0 {
    return "0".to_string();
  }
  if !x.is_finite() {
    return x.to_string();
  }
  let magnitude = x.abs().log10().floor() as i32;
  let decimals = (digits - 1 - magnitude).max(0) as usize;
  format!("{x:.decimals$}")
}

fn format_cell(value: MetricValue) -> String {
  match value {
    MetricValue::Num(v) => format_significant(v, EXPORT_SIGNIFICANT_DIGITS),
    MetricValue::NotComputable => NOT_COMPUTABLE_TOKEN.to_string(),
  }
}

/// Per-asset metrics table keyed by ticker, one row per asset.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsTable {
  rows: Vec<AssetMetrics>,
}

impl MetricsTable {
  pub fn new(rows: Vec<AssetMetrics>) -> Self {
    Self { rows }
  }

  pub fn rows(&self) -> &[AssetMetrics] {
    &self.rows
  }

  fn row_cells(row: &AssetMetrics) -> [MetricValue; 13] {
    [
      row.total_return,
      row.annualized_return,
      row.volatility,
      row.max_drawdown,
      row.var,
      row.cvar,
      row.sharpe,
      row.sortino,
      row.calmar,
      row.omega,
      row.beta,
      row.alpha,
      row.treynor,
    ]
  }

  /// CSV with the fixed column order and a leading `Ticker` column.
  pub fn to_csv(&self) -> String {
    let mut out = String::from("Ticker");
    for col in METRIC_COLUMNS {
      out.push(',');
      out.push_str(col);
    }
    out.push('\n');
    for row in &self.rows {
      out.push_str(&row.ticker);
      for value in Self::row_cells(row) {
        out.push(',');
        out.push_str(&format_cell(value));
      }
      out.push('\n');
    }
    out
  }

  /// Console rendering of the same table.
  pub fn to_pretty_table(&self) -> Table {
    let mut table = Table::new();
    let mut header = vec![Cell::new("Ticker")];
    header.extend(METRIC_COLUMNS.iter().map(|c| Cell::new(c)));
    table.add_row(Row::new(header));
    for row in &self.rows {
      let mut cells = vec![Cell::new(&row.ticker)];
      cells.extend(
        Self::row_cells(row)
          .into_iter()
          .map(|v| Cell::new(&format_cell(v))),
      );
      table.add_row(Row::new(cells));
    }
    table
  }
}

/// One row of the simulation table.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationRow {
  pub weights: Vec<f64>,
  pub expected_return: f64,
  pub volatility: f64,
  pub sharpe: MetricValue,
  pub is_max_sharpe: bool,
  pub is_min_volatility: bool,
}

/// Simulated risk/return cloud with the two distinguished rows flagged.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationTable {
  tickers: Vec<String>,
  rows: Vec<SimulationRow>,
  seed: u64,
}

impl SimulationTable {
  /// Assemble from a frontier result, optionally thinned to `max_points`
  /// rows for display (`0` keeps every draw).
  pub fn from_result(
    result: &EfficientFrontierResult,
    tickers: &[String],
    max_points: usize,
  ) -> Self {
    let rows = result
      .display_indices(max_points)
      .into_iter()
      .map(|i| {
        let draw = &result.draws()[i];
        SimulationRow {
          weights: draw.weights.as_slice().to_vec(),
          expected_return: draw.expected_return,
          volatility: draw.volatility,
          sharpe: draw.sharpe,
          is_max_sharpe: i == result.max_sharpe_index(),
          is_min_volatility: i == result.min_volatility_index(),
        }
      })
      .collect();
    Self {
      tickers: tickers.to_vec(),
      rows,
      seed: result.seed(),
    }
  }

  pub fn rows(&self) -> &[SimulationRow] {
    &self.rows
  }

  pub fn seed(&self) -> u64 {
    self.seed
  }

  /// CSV: one weight column per asset, then return/volatility/Sharpe and
  /// the distinguished-row flags.
  pub fn to_csv(&self) -> String {
    let mut out = String::new();
    for t in &self.tickers {
      out.push_str(&format!("w_{t},"));
    }
    out.push_str("Return,Volatility,Sharpe,MaxSharpe,MinVolatility\n");
    for row in &self.rows {
      for w in &row.weights {
        out.push_str(&format_significant(*w, EXPORT_SIGNIFICANT_DIGITS));
        out.push(',');
      }
      out.push_str(&format_significant(
        row.expected_return,
        EXPORT_SIGNIFICANT_DIGITS,
      ));
      out.push(',');
      out.push_str(&format_significant(row.volatility, EXPORT_SIGNIFICANT_DIGITS));
      out.push(',');
      out.push_str(&format_cell(row.sharpe));
      out.push(',');
      out.push_str(if row.is_max_sharpe { "1" } else { "0" });
      out.push(',');
      out.push_str(if row.is_min_volatility { "1" } else { "0" });
      out.push('\n');
    }
    out
  }
}
