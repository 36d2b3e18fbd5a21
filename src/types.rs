//! # Core Data Types
//!
//! $$
//! r_t = \frac{P_t - P_{t-1}}{P_{t-1}} \quad\text{or}\quad r_t = \ln\frac{P_t}{P_{t-1}}
//! $$
//!
//! Typed records for prices, returns, weights and metric cells. Invariants
//! (strictly increasing dates, positive prices, sum-to-one weights) are
//! enforced at construction so downstream engines never re-validate.

use std::collections::BTreeSet;
use std::fmt::Display;

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView1;

use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::Error;
use crate::error::Result;

/// Absolute tolerance on the sum-to-one weight invariant.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Return variant derived from a price series.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnKind {
  /// Period-over-period percentage change `(P_t - P_{t-1}) / P_{t-1}`.
  #[default]
  Simple,
  /// Continuously compounded `ln(P_t / P_{t-1})`.
  Log,
}

impl Display for ReturnKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ReturnKind::Simple => write!(f, "simple"),
      ReturnKind::Log => write!(f, "log"),
    }
  }
}

/// A metric cell that is either a number or an explicit gap. Metrics are
/// never reported as silent NaN/0 when their formula is undefined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
  Num(f64),
  NotComputable,
}

impl MetricValue {
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      MetricValue::Num(v) => Some(*v),
      MetricValue::NotComputable => None,
    }
  }

  pub fn is_computable(&self) -> bool {
    matches!(self, MetricValue::Num(_))
  }
}

impl From<f64> for MetricValue {
  fn from(v: f64) -> Self {
    MetricValue::Num(v)
  }
}

impl Display for MetricValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      MetricValue::Num(v) => write!(f, "{v}"),
      MetricValue::NotComputable => write!(f, "n/a"),
    }
  }
}

/// Immutable dated price history for one asset.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSeries {
  ticker: String,
  dates: Vec<NaiveDate>,
  prices: Vec<f64>,
}

impl PriceSeries {
  /// Validate and construct a price series.
  ///
  /// Rejects mismatched lengths, fewer than 2 observations, non-increasing
  /// or duplicate dates, and non-positive or non-finite prices.
  pub fn new(
    ticker: impl Into<String>,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
  ) -> Result<Self> {
    let ticker = ticker.into();

    if dates.len() != prices.len() {
      return Err(Error::data(&ticker, "date and price lengths differ"));
    }
    if prices.len() < 2 {
      return Err(Error::data(&ticker, "fewer than 2 price observations"));
    }
    for pair in dates.windows(2) {
      if pair[1] <= pair[0] {
        return Err(Error::data(&ticker, "dates are not strictly increasing"));
      }
    }
    for &p in &prices {
      if !p.is_finite() || p <= 0.0 {
        return Err(Error::data(&ticker, format!("non-positive price {p}")));
      }
    }

    Ok(Self {
      ticker,
      dates,
      prices,
    })
  }

  pub fn ticker(&self) -> &str {
    &self.ticker
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn prices(&self) -> &[f64] {
    &self.prices
  }

  pub fn len(&self) -> usize {
    self.prices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.prices.is_empty()
  }
}

/// Aligned multi-asset price table over a shared date index.
///
/// Built by inner-joining per-asset series on common trading dates; rows
/// outside the intersection are dropped (forward-filling is a
/// data-acquisition concern, not done here).
#[derive(Clone, Debug, PartialEq)]
pub struct PriceTable {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  columns: Vec<Vec<f64>>,
}

impl PriceTable {
  /// Inner-join the supplied series on their common dates.
  ///
  /// Fails when no series are supplied, a ticker repeats, or the joined
  /// index retains fewer than 2 rows.
  pub fn from_series(series: &[PriceSeries]) -> Result<Self> {
    if series.is_empty() {
      return Err(Error::data("price table", "no price series supplied"));
    }

    let mut tickers = Vec::with_capacity(series.len());
    for s in series {
      if tickers.contains(&s.ticker) {
        return Err(Error::data(&s.ticker, "duplicate ticker in price table"));
      }
      tickers.push(s.ticker.clone());
    }

    let mut common: BTreeSet<NaiveDate> = series[0].dates.iter().copied().collect();
    for s in &series[1..] {
      let own: BTreeSet<NaiveDate> = s.dates.iter().copied().collect();
      common = common.intersection(&own).copied().collect();
    }
    if common.len() < 2 {
      return Err(Error::data(
        "price table",
        "fewer than 2 overlapping dates across assets",
      ));
    }

    let columns: Vec<Vec<f64>> = series
      .iter()
      .map(|s| {
        s.dates
          .iter()
          .zip(&s.prices)
          .filter(|(d, _)| common.contains(d))
          .map(|(_, p)| *p)
          .collect()
      })
      .collect();
    let dates: Vec<NaiveDate> = common.into_iter().collect();

    tracing::debug!(
      assets = tickers.len(),
      rows = dates.len(),
      "price table aligned on common dates"
    );

    Ok(Self {
      dates,
      tickers,
      columns,
    })
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Price column for the asset at `idx`, in date order.
  pub fn column(&self, idx: usize) -> &[f64] {
    &self.columns[idx]
  }

  pub fn assets(&self) -> usize {
    self.tickers.len()
  }

  pub fn rows(&self) -> usize {
    self.dates.len()
  }

  /// Rebuild one column as a standalone [`PriceSeries`].
  pub fn series(&self, idx: usize) -> Result<PriceSeries> {
    PriceSeries::new(
      self.tickers[idx].clone(),
      self.dates.clone(),
      self.columns[idx].clone(),
    )
  }
}

/// Per-period return history for one asset.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnSeries {
  pub ticker: String,
  pub kind: ReturnKind,
  pub values: Vec<f64>,
}

impl ReturnSeries {
  pub fn new(ticker: impl Into<String>, kind: ReturnKind, values: Vec<f64>) -> Self {
    Self {
      ticker: ticker.into(),
      kind,
      values,
    }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// Aligned per-asset return columns sharing one observation index.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnMatrix {
  kind: ReturnKind,
  tickers: Vec<String>,
  columns: Vec<Vec<f64>>,
}

impl ReturnMatrix {
  /// Validate alignment and construct.
  pub fn new(kind: ReturnKind, tickers: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
    if tickers.len() != columns.len() || tickers.is_empty() {
      return Err(Error::data("return matrix", "ticker/column count mismatch"));
    }
    let rows = columns[0].len();
    if rows == 0 {
      return Err(Error::data("return matrix", "empty return columns"));
    }
    if columns.iter().any(|c| c.len() != rows) {
      return Err(Error::data("return matrix", "columns are not aligned"));
    }
    Ok(Self {
      kind,
      tickers,
      columns,
    })
  }

  pub(crate) fn from_aligned(
    kind: ReturnKind,
    tickers: Vec<String>,
    columns: Vec<Vec<f64>>,
  ) -> Self {
    debug_assert!(!columns.is_empty());
    debug_assert!(columns.iter().all(|c| c.len() == columns[0].len()));
    Self {
      kind,
      tickers,
      columns,
    }
  }

  pub fn kind(&self) -> ReturnKind {
    self.kind
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn column(&self, idx: usize) -> &[f64] {
    &self.columns[idx]
  }

  pub fn assets(&self) -> usize {
    self.tickers.len()
  }

  /// Number of return observations per asset.
  pub fn observations(&self) -> usize {
    self.columns[0].len()
  }

  /// Clone one column out as a standalone [`ReturnSeries`].
  pub fn series(&self, idx: usize) -> ReturnSeries {
    ReturnSeries::new(
      self.tickers[idx].clone(),
      self.kind,
      self.columns[idx].clone(),
    )
  }
}

/// Annualized sample covariance of aligned return columns.
///
/// Symmetric and positive semi-definite by construction; the optimizer
/// still guards the quadratic form against numerically negative variance.
#[derive(Clone, Debug, PartialEq)]
pub struct CovarianceMatrix {
  matrix: Array2<f64>,
}

impl CovarianceMatrix {
  /// Sample covariance of the matrix columns, annualized by x252.
  ///
  /// Fails when fewer than 2 observations are available.
  pub fn from_returns(returns: &ReturnMatrix) -> Result<Self> {
    let n = returns.observations();
    if n < 2 {
      return Err(Error::data(
        "covariance",
        "fewer than 2 return observations",
      ));
    }

    let k = returns.assets();
    let means: Vec<f64> = (0..k)
      .map(|i| returns.column(i).iter().sum::<f64>() / n as f64)
      .collect();

    let mut matrix = Array2::zeros((k, k));
    for i in 0..k {
      for j in i..k {
        let xi = returns.column(i);
        let xj = returns.column(j);
        let mut acc = 0.0;
        for t in 0..n {
          acc += (xi[t] - means[i]) * (xj[t] - means[j]);
        }
        let cov = acc / (n - 1) as f64 * TRADING_DAYS_PER_YEAR;
        matrix[[i, j]] = cov;
        matrix[[j, i]] = cov;
      }
    }

    Ok(Self { matrix })
  }

  pub fn dim(&self) -> usize {
    self.matrix.nrows()
  }

  pub fn as_array(&self) -> &Array2<f64> {
    &self.matrix
  }

  /// `w' Sigma w` for a weight vector of matching length.
  pub fn quadratic_form(&self, weights: &[f64]) -> f64 {
    let w = ArrayView1::from(weights);
    w.dot(&self.matrix.dot(&w))
  }
}

/// Long-only (or optionally long-short) weight vector summing to one.
#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioWeights {
  weights: Vec<f64>,
}

impl PortfolioWeights {
  /// Validate the sum-to-one invariant (and non-negativity unless
  /// `allow_short`).
  pub fn new(weights: Vec<f64>, allow_short: bool) -> Result<Self> {
    if weights.is_empty() {
      return Err(Error::data("weights", "empty weight vector"));
    }
    if !allow_short && weights.iter().any(|&w| w < 0.0) {
      return Err(Error::data("weights", "negative weight in long-only vector"));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
      return Err(Error::data(
        "weights",
        format!("weights sum to {sum}, expected 1"),
      ));
    }
    Ok(Self { weights })
  }

  pub fn as_slice(&self) -> &[f64] {
    &self.weights
  }

  pub fn len(&self) -> usize {
    self.weights.len()
  }

  pub fn is_empty(&self) -> bool {
    self.weights.is_empty()
  }
}
