//! # Configuration
//!
//! $$
//! N \in [1000, 15000], \quad r_f \ge 0, \quad c \in (0, 1)
//! $$
//!
//! Recognized options for analysis and simulation runs. Out-of-range values
//! fail validation before any computation starts.

use crate::error::Error;
use crate::error::Result;

/// Trading days per year used for every annualization in the crate.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Default annualized risk-free rate (decimal).
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.045;
/// Default VaR/CVaR confidence level.
pub const DEFAULT_VAR_CONFIDENCE: f64 = 0.95;
/// Default rolling windows (one month, one quarter of trading days).
pub const DEFAULT_ROLLING_WINDOWS: [usize; 2] = [21, 63];
/// Inclusive bounds on the Monte Carlo draw count.
pub const MIN_SIMULATION_COUNT: usize = 1_000;
pub const MAX_SIMULATION_COUNT: usize = 15_000;
/// Default Monte Carlo draw count.
pub const DEFAULT_SIMULATION_COUNT: usize = 5_000;

/// Options for per-asset analytics runs.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
  /// Annualized risk-free rate as a decimal.
  pub risk_free_rate: f64,
  /// Window lengths for rolling metrics, in trading days.
  pub rolling_windows: Vec<usize>,
  /// Confidence level for VaR/CVaR.
  pub var_confidence: f64,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      risk_free_rate: DEFAULT_RISK_FREE_RATE,
      rolling_windows: DEFAULT_ROLLING_WINDOWS.to_vec(),
      var_confidence: DEFAULT_VAR_CONFIDENCE,
    }
  }
}

impl AnalysisConfig {
  pub fn validate(&self) -> Result<()> {
    if !self.risk_free_rate.is_finite() || self.risk_free_rate < 0.0 {
      return Err(Error::config(
        "risk_free_rate",
        format!("{} is negative or non-finite", self.risk_free_rate),
      ));
    }
    if !(self.var_confidence > 0.0 && self.var_confidence < 1.0) {
      return Err(Error::config(
        "var_confidence",
        format!("{} outside (0, 1)", self.var_confidence),
      ));
    }
    if self.rolling_windows.iter().any(|&w| w < 2) {
      return Err(Error::config("rolling_windows", "window shorter than 2"));
    }
    Ok(())
  }
}

/// Options for a Monte Carlo frontier run.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
  /// Number of weight-vector draws.
  pub simulation_count: usize,
  /// Annualized risk-free rate used in per-draw Sharpe ratios.
  pub risk_free_rate: f64,
  /// Seed for reproducible draws; `None` draws an entropy seed, which is
  /// echoed back in the result.
  pub random_seed: Option<u64>,
  /// Sample uniform(-1, 1) weights instead of long-only uniform(0, 1).
  pub allow_short: bool,
  /// Draws per RNG sub-stream. For a fixed batch size the draw order is
  /// identical on any number of workers; changing the batch size changes
  /// the sub-stream layout and therefore the draws.
  pub batch_size: usize,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      simulation_count: DEFAULT_SIMULATION_COUNT,
      risk_free_rate: DEFAULT_RISK_FREE_RATE,
      random_seed: None,
      allow_short: false,
      batch_size: 512,
    }
  }
}

impl SimulationConfig {
  pub fn validate(&self) -> Result<()> {
    if self.simulation_count < MIN_SIMULATION_COUNT
      || self.simulation_count > MAX_SIMULATION_COUNT
    {
      return Err(Error::config(
        "simulation_count",
        format!(
          "{} outside [{MIN_SIMULATION_COUNT}, {MAX_SIMULATION_COUNT}]",
          self.simulation_count
        ),
      ));
    }
    if !self.risk_free_rate.is_finite() || self.risk_free_rate < 0.0 {
      return Err(Error::config(
        "risk_free_rate",
        format!("{} is negative or non-finite", self.risk_free_rate),
      ));
    }
    if self.batch_size == 0 {
      return Err(Error::config("batch_size", "batch size of zero"));
    }
    Ok(())
  }
}
