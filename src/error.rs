//! # Errors
//!
//! $$
//! \text{failure} \in \{\text{data}, \text{computation}, \text{config}, \text{cancelled}\}
//! $$
//!
//! Typed failure taxonomy. Data and config errors abort a run before any
//! computation starts; a computation error is local to one asset/metric and
//! is downgraded to a not-computable cell by the summary layer.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All failures surfaced by the analytics core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
  /// Insufficient or invalid input data (short history, misaligned dates,
  /// non-positive prices).
  #[error("invalid data for {subject}: {reason}")]
  Data { subject: String, reason: String },

  /// A metric that is mathematically undefined for the given inputs
  /// (zero volatility, zero benchmark variance, non-PSD covariance).
  #[error("{metric} not computable for {subject}: {reason}")]
  Computation {
    subject: String,
    metric: &'static str,
    reason: String,
  },

  /// A recognized option carries an out-of-range value.
  #[error("invalid configuration for {parameter}: {reason}")]
  Config {
    parameter: &'static str,
    reason: String,
  },

  /// The caller aborted a simulation; partial results are discarded.
  #[error("simulation cancelled before completion")]
  Cancelled,
}

impl Error {
  pub fn data(subject: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Data {
      subject: subject.into(),
      reason: reason.into(),
    }
  }

  pub fn computation(
    subject: impl Into<String>,
    metric: &'static str,
    reason: impl Into<String>,
  ) -> Self {
    Self::Computation {
      subject: subject.into(),
      metric,
      reason: reason.into(),
    }
  }

  pub fn config(parameter: &'static str, reason: impl Into<String>) -> Self {
    Self::Config {
      parameter,
      reason: reason.into(),
    }
  }

  /// Whether the summary layer may localize this failure to a single cell.
  pub fn is_localizable(&self) -> bool {
    matches!(self, Self::Computation { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn computation_errors_are_localizable() {
    let err = Error::computation("AAPL", "sharpe", "zero volatility");
    assert!(err.is_localizable());
    assert!(!Error::data("AAPL", "too short").is_localizable());
    assert!(!Error::Cancelled.is_localizable());
  }

  #[test]
  fn error_messages_name_the_offender() {
    let err = Error::computation("SPY", "beta", "zero benchmark variance");
    let msg = err.to_string();
    assert!(msg.contains("SPY"));
    assert!(msg.contains("beta"));
  }
}
