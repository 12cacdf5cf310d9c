//! Score mutation: the weighted random walk that drives the leaderboard.
//!
//! Every cycle each friend's score moves by a randomly sized step. The size
//! is picked from one of five bands (small, medium, large, extreme, jump),
//! the sign leans toward the previous realized change, and large moves near
//! the edges of the score range are halved before clamping.

use rand::Rng;
use shaltabla_types::{MAX_POINTS, MIN_POINTS};

use crate::config::{MagnitudeRange, MutatorConfig};

/// Which magnitude band a mutation was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationBand {
    /// Everyday jitter.
    Small,
    /// A noticeable swing.
    Medium,
    /// A big swing.
    Large,
    /// A huge swing.
    Extreme,
    /// Instant jump to the floor or the ceiling.
    Jump,
}

/// Outcome of one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    /// Band the change was drawn from.
    pub band: MutationBand,
    /// Signed change after damping, before clamping.
    pub raw_change: i64,
    /// New score, clamped to the valid range.
    pub points: u32,
    /// Realized change (`points - current`), the next cycle's momentum signal.
    pub delta: i32,
}

/// Produce the next score for a friend.
///
/// `last_delta` is the realized change from the previous cycle. Jumps ignore
/// both momentum and damping.
pub fn mutate<R: Rng>(
    rng: &mut R,
    config: &MutatorConfig,
    current: u32,
    last_delta: i32,
) -> Mutation {
    let current = current.min(MAX_POINTS);
    let roll: f64 = rng.random();
    let band = classify(config, roll);

    let raw_change = match band_range(config, band) {
        None => {
            let target = if rng.random_bool(0.5) {
                MIN_POINTS
            } else {
                MAX_POINTS
            };
            i64::from(target).saturating_sub(i64::from(current))
        }
        Some(range) => {
            let magnitude = i64::from(rng.random_range(range.min..=range.max));
            let change = if pick_positive(rng, config.momentum_bias, last_delta) {
                magnitude
            } else {
                magnitude.saturating_neg()
            };
            damp(config, current, change)
        }
    };

    let points = clamp_points(i64::from(current).saturating_add(raw_change));
    let delta = i32::try_from(i64::from(points).saturating_sub(i64::from(current)))
        .unwrap_or_default();

    Mutation {
        band,
        raw_change,
        points,
        delta,
    }
}

/// Map a uniform roll in `[0, 1)` to a band.
pub fn classify(config: &MutatorConfig, roll: f64) -> MutationBand {
    if roll < config.small_below {
        MutationBand::Small
    } else if roll < config.medium_below {
        MutationBand::Medium
    } else if roll < config.large_below {
        MutationBand::Large
    } else if roll < config.extreme_below {
        MutationBand::Extreme
    } else {
        MutationBand::Jump
    }
}

/// Halve large drops near the floor and large gains near the ceiling.
///
/// Applied before clamping. Halving rounds half away from zero.
pub fn damp(config: &MutatorConfig, current: u32, change: i64) -> i64 {
    let threshold = i64::from(config.damping_threshold);
    let near_floor = current < config.damping_low && change < threshold.saturating_neg();
    let near_ceiling = current > config.damping_high && change > threshold;
    if near_floor || near_ceiling {
        change.saturating_add(change.signum()) / 2
    } else {
        change
    }
}

/// Clamp an unbounded score into `[MIN_POINTS, MAX_POINTS]`.
pub fn clamp_points(value: i64) -> u32 {
    let clamped = value.clamp(i64::from(MIN_POINTS), i64::from(MAX_POINTS));
    u32::try_from(clamped).unwrap_or(MIN_POINTS)
}

const fn band_range(config: &MutatorConfig, band: MutationBand) -> Option<MagnitudeRange> {
    match band {
        MutationBand::Small => Some(config.small),
        MutationBand::Medium => Some(config.medium),
        MutationBand::Large => Some(config.large),
        MutationBand::Extreme => Some(config.extreme),
        MutationBand::Jump => None,
    }
}

fn pick_positive<R: Rng>(rng: &mut R, bias: f64, last_delta: i32) -> bool {
    match last_delta.signum() {
        1 => rng.random_bool(bias),
        -1 => !rng.random_bool(bias),
        _ => rng.random_bool(0.5),
    }
}
