//! Simulation and ranking engine for the Shaltabla leaderboard.
//!
//! This crate owns the cycle that drives the board: scores move by a
//! weighted random walk, history buffers record every step, friends are
//! re-ranked and notable swings are narrated onto a ticker. It performs no
//! I/O; the runner hands each cycle's output to a callback that forwards it
//! to the API and the persistence writer.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `shaltabla-config.yaml` into
//!   strongly-typed structs.
//! - [`mutator`] -- Banded random walk with momentum and boundary damping.
//! - [`history`] -- Sparkline buffer, snapshot log and timeframe baselines.
//! - [`ranker`] -- Stable descending ranking and presentation shuffle.
//! - [`narrator`] -- Ticker messages for notable swings.
//! - [`stats`] -- Statistics over a snapshot log.
//! - [`engine`] -- [`LeaderboardEngine`], the state owner and cycle driver.
//! - [`operator`] -- Pause, resume, stop and speed controls.
//! - [`runner`] -- The timer loop around [`LeaderboardEngine::tick`].
//!
//! [`LeaderboardEngine`]: engine::LeaderboardEngine
//! [`LeaderboardEngine::tick`]: engine::LeaderboardEngine::tick

pub mod config;
pub mod engine;
pub mod history;
pub mod mutator;
pub mod narrator;
pub mod operator;
pub mod ranker;
pub mod runner;
pub mod stats;
