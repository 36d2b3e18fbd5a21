//! # Monte Carlo Efficient Frontier
//!
//! $$
//! \mathbf{w}^{(i)} = \frac{\mathbf{x}^{(i)}}{\sum_j x_j^{(i)}}, \qquad
//! \sigma_p = \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}
//! $$
//!
//! Randomized sampling of the risk/return cloud with running max-Sharpe and
//! min-volatility selection. Draws are partitioned into fixed-size batches,
//! each batch seeding its own RNG sub-stream derived from the base seed, so
//! the concatenated draw order is bit-identical for any rayon worker count.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Uniform;
use rayon::prelude::*;

use crate::config::SimulationConfig;
use crate::config::TRADING_DAYS_PER_YEAR;
use crate::error::Error;
use crate::error::Result;
use crate::types::CovarianceMatrix;
use crate::types::MetricValue;
use crate::types::PortfolioWeights;
use crate::types::ReturnMatrix;

/// Negative quadratic-form values beyond this are a non-PSD covariance.
const PSD_TOLERANCE: f64 = -1e-10;

/// Cooperative abort flag checked between draw batches. Cancelling discards
/// partial results; it never corrupts state.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
  flag: Arc<AtomicBool>,
}

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::Relaxed)
  }
}

/// One Monte Carlo draw of the simulated risk/return cloud.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedPortfolio {
  pub weights: PortfolioWeights,
  /// Annualized expected return `w . mu`.
  pub expected_return: f64,
  /// Annualized volatility `sqrt(w' Sigma w)`.
  pub volatility: f64,
  /// `(return - rf) / volatility`; not computable for zero-volatility
  /// draws, which never win the max-Sharpe selection.
  pub sharpe: MetricValue,
}

/// Full sampled cloud plus the two distinguished portfolios.
#[derive(Clone, Debug, PartialEq)]
pub struct EfficientFrontierResult {
  draws: Vec<SimulatedPortfolio>,
  max_sharpe_idx: usize,
  min_volatility_idx: usize,
  seed: u64,
}

impl EfficientFrontierResult {
  /// Draws in draw order (insertion order is the reproducibility contract).
  pub fn draws(&self) -> &[SimulatedPortfolio] {
    &self.draws
  }

  pub fn max_sharpe(&self) -> &SimulatedPortfolio {
    &self.draws[self.max_sharpe_idx]
  }

  pub fn min_volatility(&self) -> &SimulatedPortfolio {
    &self.draws[self.min_volatility_idx]
  }

  pub fn max_sharpe_index(&self) -> usize {
    self.max_sharpe_idx
  }

  pub fn min_volatility_index(&self) -> usize {
    self.min_volatility_idx
  }

  /// The seed the run actually used; echoed even when the caller omitted
  /// one, so any run can be replayed.
  pub fn seed(&self) -> u64 {
    self.seed
  }

  /// Draw indices thinned to at most `max_points` for display; the two
  /// distinguished draws are always retained. `0` means no thinning.
  pub fn display_indices(&self, max_points: usize) -> Vec<usize> {
    let n = self.draws.len();
    if max_points == 0 || max_points >= n {
      return (0..n).collect();
    }
    let stride = n.div_ceil(max_points);
    let mut indices: Vec<usize> = (0..n).step_by(stride).collect();
    indices.push(self.max_sharpe_idx);
    indices.push(self.min_volatility_idx);
    indices.sort_unstable();
    indices.dedup();
    indices
  }
}

fn batch_seed(base: u64, batch: u64) -> u64 {
  base ^ batch.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn draw_weights(rng: &mut StdRng, assets: usize, allow_short: bool) -> Vec<f64> {
  if allow_short {
    let dist = Uniform::new(-1.0, 1.0);
    loop {
      let raw: Vec<f64> = (0..assets).map(|_| rng.sample(dist)).collect();
      let sum: f64 = raw.iter().sum();
      // Redraw near-singular normalizations instead of blowing up.
      if sum.abs() >= 1e-6 {
        return raw.iter().map(|x| x / sum).collect();
      }
    }
  } else {
    let dist = Uniform::new(0.0, 1.0);
    loop {
      let raw: Vec<f64> = (0..assets).map(|_| rng.sample(dist)).collect();
      let sum: f64 = raw.iter().sum();
      if sum > 1e-12 {
        return raw.iter().map(|x| x / sum).collect();
      }
    }
  }
}

fn simulate_batch(
  batch: usize,
  count: usize,
  seed: u64,
  mu: &Array1<f64>,
  cov: &CovarianceMatrix,
  config: &SimulationConfig,
) -> Result<Vec<SimulatedPortfolio>> {
  let assets = mu.len();
  let mut rng = StdRng::seed_from_u64(batch_seed(seed, batch as u64));
  let mut out = Vec::with_capacity(count);

  for _ in 0..count {
    let w = draw_weights(&mut rng, assets, config.allow_short);
    let expected_return = w.iter().zip(mu.iter()).map(|(a, b)| a * b).sum::<f64>();
    let quad = cov.quadratic_form(&w);
    if quad < PSD_TOLERANCE {
      return Err(Error::computation(
        "portfolio",
        "volatility",
        format!("covariance matrix is not positive semi-definite (w'Sw = {quad})"),
      ));
    }
    let volatility = quad.max(0.0).sqrt();
    let sharpe = if volatility > 0.0 {
      MetricValue::Num((expected_return - config.risk_free_rate) / volatility)
    } else {
      MetricValue::NotComputable
    };
    out.push(SimulatedPortfolio {
      weights: PortfolioWeights::new(w, config.allow_short)?,
      expected_return,
      volatility,
      sharpe,
    });
  }

  Ok(out)
}

/// Annualized mean-return vector of the matrix columns.
fn mean_annualized_returns(returns: &ReturnMatrix) -> Array1<f64> {
  let n = returns.observations() as f64;
  Array1::from_iter(
    (0..returns.assets())
      .map(|i| returns.column(i).iter().sum::<f64>() / n * TRADING_DAYS_PER_YEAR),
  )
}

/// Configure -> Sample -> Reduce -> Report.
///
/// Given the same seed, asset set, date range and draw count, two runs
/// produce an identical ordered sample sequence and identical distinguished
/// portfolios, sequentially or on any number of rayon workers.
pub fn simulate_frontier(
  returns: &ReturnMatrix,
  config: &SimulationConfig,
  cancel: Option<&CancellationToken>,
) -> Result<EfficientFrontierResult> {
  config.validate()?;
  if returns.assets() < 2 {
    return Err(Error::config(
      "assets",
      format!("optimization needs at least 2 assets, got {}", returns.assets()),
    ));
  }

  let mu = mean_annualized_returns(returns);
  let cov = CovarianceMatrix::from_returns(returns)?;
  let seed = config.random_seed.unwrap_or_else(rand::random);
  let n = config.simulation_count;
  let batch_size = config.batch_size;
  let batches = n.div_ceil(batch_size);

  tracing::debug!(
    assets = returns.assets(),
    draws = n,
    batches,
    seed,
    allow_short = config.allow_short,
    "starting frontier simulation"
  );

  let draws: Vec<SimulatedPortfolio> = (0..batches)
    .into_par_iter()
    .map(|b| {
      if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(Error::Cancelled);
      }
      let count = batch_size.min(n - b * batch_size);
      simulate_batch(b, count, seed, &mu, &cov, config)
    })
    .collect::<Result<Vec<Vec<SimulatedPortfolio>>>>()?
    .into_iter()
    .flatten()
    .collect();

  // Reduce in draw order; strict comparisons keep the first-encountered
  // draw on ties, deterministic under any worker count.
  let mut max_sharpe_idx = None;
  let mut min_volatility_idx = 0usize;
  for (i, draw) in draws.iter().enumerate() {
    if let MetricValue::Num(s) = draw.sharpe {
      match max_sharpe_idx {
        None => max_sharpe_idx = Some(i),
        Some(best) => {
          let best_sharpe = draws[best].sharpe.as_f64().unwrap_or(f64::NEG_INFINITY);
          if s > best_sharpe {
            max_sharpe_idx = Some(i);
          }
        }
      }
    }
    if draw.volatility < draws[min_volatility_idx].volatility {
      min_volatility_idx = i;
    }
  }

  let max_sharpe_idx = max_sharpe_idx.ok_or_else(|| {
    Error::computation(
      "portfolio",
      "max sharpe",
      "every draw has zero volatility; covariance matrix is degenerate",
    )
  })?;

  tracing::debug!(
    max_sharpe = ?draws[max_sharpe_idx].sharpe,
    min_volatility = draws[min_volatility_idx].volatility,
    "frontier simulation finished"
  );

  Ok(EfficientFrontierResult {
    draws,
    max_sharpe_idx,
    min_volatility_idx,
    seed,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::types::ReturnKind;

  fn three_asset_returns() -> ReturnMatrix {
    let mut rng = StdRng::seed_from_u64(42);
    let dist = Uniform::new(-0.02, 0.025);
    let columns: Vec<Vec<f64>> = (0..3)
      .map(|_| (0..120).map(|_| rng.sample(dist)).collect())
      .collect();
    ReturnMatrix::new(
      ReturnKind::Simple,
      vec!["A".into(), "B".into(), "C".into()],
      columns,
    )
    .unwrap()
  }

  fn config(seed: u64) -> SimulationConfig {
    SimulationConfig {
      simulation_count: 1_000,
      random_seed: Some(seed),
      ..SimulationConfig::default()
    }
  }

  #[test]
  fn single_asset_is_a_config_error() {
    let returns = ReturnMatrix::new(
      ReturnKind::Simple,
      vec!["A".into()],
      vec![vec![0.01, -0.02, 0.015]],
    )
    .unwrap();
    assert!(matches!(
      simulate_frontier(&returns, &config(1), None),
      Err(Error::Config { .. })
    ));
  }

  #[test]
  fn draw_count_below_floor_is_a_config_error() {
    let mut cfg = config(1);
    cfg.simulation_count = 500;
    assert!(matches!(
      simulate_frontier(&three_asset_returns(), &cfg, None),
      Err(Error::Config { .. })
    ));
  }

  #[test]
  fn weights_sum_to_one_for_every_draw() {
    let result = simulate_frontier(&three_asset_returns(), &config(7), None).unwrap();
    for draw in result.draws() {
      let sum: f64 = draw.weights.as_slice().iter().sum();
      assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
    }
  }

  #[test]
  fn fixed_seed_reproduces_the_run() {
    let returns = three_asset_returns();
    let a = simulate_frontier(&returns, &config(99), None).unwrap();
    let b = simulate_frontier(&returns, &config(99), None).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn worker_count_does_not_change_the_result() {
    let returns = three_asset_returns();
    let parallel = simulate_frontier(&returns, &config(5), None).unwrap();
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(1)
      .build()
      .unwrap();
    let sequential = pool.install(|| simulate_frontier(&returns, &config(5), None)).unwrap();
    assert_eq!(parallel, sequential);
  }

  #[test]
  fn distinguished_draws_are_extremal() {
    let result = simulate_frontier(&three_asset_returns(), &config(3), None).unwrap();
    let best = result.max_sharpe().sharpe.as_f64().unwrap();
    let lowest = result.min_volatility().volatility;
    for draw in result.draws() {
      if let Some(s) = draw.sharpe.as_f64() {
        assert!(s <= best);
      }
      assert!(draw.volatility >= lowest);
    }
  }

  #[test]
  fn cancelled_run_discards_everything() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(matches!(
      simulate_frontier(&three_asset_returns(), &config(1), Some(&token)),
      Err(Error::Cancelled)
    ));
  }

  #[test]
  fn short_sampling_allows_negative_weights() {
    let mut cfg = config(11);
    cfg.allow_short = true;
    let result = simulate_frontier(&three_asset_returns(), &cfg, None).unwrap();
    let any_negative = result
      .draws()
      .iter()
      .any(|d| d.weights.as_slice().iter().any(|&w| w < 0.0));
    assert!(any_negative);
    for draw in result.draws() {
      let sum: f64 = draw.weights.as_slice().iter().sum();
      assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
    }
  }

  #[test]
  fn display_indices_keep_distinguished_draws() {
    let result = simulate_frontier(&three_asset_returns(), &config(13), None).unwrap();
    let indices = result.display_indices(100);
    assert!(indices.len() <= 102);
    assert!(indices.contains(&result.max_sharpe_index()));
    assert!(indices.contains(&result.min_volatility_index()));
  }
}
