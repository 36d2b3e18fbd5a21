//! # quantfolio
//!
//! Quantitative portfolio analytics: converts historical price series into
//! risk/return statistics and approximates the efficient frontier with
//! Monte Carlo weight sampling.
//!
//! ## Modules
//!
//! | Module        | Description                                                              |
//! |---------------|--------------------------------------------------------------------------|
//! | [`types`]     | Price/return/weight records with construction-time invariants.           |
//! | [`config`]    | Recognized configuration surface and its validation.                     |
//! | [`error`]     | Typed failure taxonomy (data / computation / config).                    |
//! | [`analytics`] | Return, risk, ratio, market, rolling, and frontier engines.              |
//! | [`report`]    | Tabular output: metrics/simulation tables, diff-stable CSV serialization.|
//!
//! ## Parallelism
//!
//! Frontier sampling partitions draws into deterministic seed-per-batch
//! sub-streams mapped over `rayon`, so a fixed seed reproduces the same
//! ordered sample sequence regardless of worker count.

pub mod analytics;
pub mod config;
pub mod error;
pub mod report;
pub mod types;

pub use error::Error;
pub use error::Result;
