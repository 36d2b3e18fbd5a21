//! # Analytics
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Return, risk, ratio, market, rolling and frontier engines. Every function
//! is a pure function of its inputs; data flows strictly downward from
//! return derivation into the dependent metrics.

pub mod frontier;
pub mod market;
pub mod ratios;
pub mod returns;
pub mod risk;
pub mod rolling;
pub mod summary;

pub use frontier::simulate_frontier;
pub use frontier::CancellationToken;
pub use frontier::EfficientFrontierResult;
pub use frontier::SimulatedPortfolio;
pub use market::beta;
pub use market::information_ratio;
pub use market::jensen_alpha;
pub use market::treynor_ratio;
pub use ratios::calmar_ratio;
pub use ratios::omega_ratio;
pub use ratios::sharpe_ratio;
pub use ratios::sortino_ratio;
pub use returns::annualized_return;
pub use returns::cumulative_return;
pub use returns::cumulative_return_matrix;
pub use returns::cumulative_return_series;
pub use returns::return_matrix;
pub use returns::return_series;
pub use returns::total_return;
pub use risk::conditional_var;
pub use risk::downside_deviation;
pub use risk::drawdown_series;
pub use risk::max_drawdown;
pub use risk::value_at_risk;
pub use risk::volatility;
pub use risk::VarMethod;
pub use rolling::rolling_beta;
pub use rolling::rolling_sharpe;
pub use rolling::rolling_table;
pub use rolling::rolling_volatility;
pub use rolling::RollingMetric;
pub use rolling::RollingSeries;
pub use summary::performance_summary;
pub use summary::AssetMetrics;
