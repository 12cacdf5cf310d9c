//! Ranking and presentation-order shuffling.

use std::cmp::Reverse;

use rand::Rng;
use rand::seq::SliceRandom;
use shaltabla_types::FriendId;

use crate::config::TieBreak;

/// Anything the ranker can order.
pub trait Rankable {
    /// Current score.
    fn points(&self) -> u32;

    /// Identifier used by [`TieBreak::Id`].
    fn id(&self) -> FriendId;

    /// Rank from the last pass, if any.
    fn rank(&self) -> Option<u32>;

    /// Rank held before the last cycle, if any.
    fn previous_rank(&self) -> Option<u32>;

    /// Store the result of a ranking pass.
    fn set_rank(&mut self, previous: Option<u32>, current: u32);
}

/// Sort `items` by score descending and assign 1-based ranks.
///
/// Each item's rank before the pass becomes its previous rank. The sort is
/// stable, so with [`TieBreak::InputOrder`] equal scores keep the order they
/// arrived in.
pub fn rank<T: Rankable>(items: &mut [T], tie_break: TieBreak) {
    sort(items, tie_break);
    for (item, position) in items.iter_mut().zip(1_u32..) {
        let previous = item.rank();
        item.set_rank(previous, position);
    }
}

/// Re-sort and re-number outside a cycle.
///
/// Previous ranks are left as they were, so movement still describes the
/// last cycle. Used when the roster or a score changes between cycles.
pub fn rerank<T: Rankable>(items: &mut [T], tie_break: TieBreak) {
    sort(items, tie_break);
    for (item, position) in items.iter_mut().zip(1_u32..) {
        let previous = item.previous_rank();
        item.set_rank(previous, position);
    }
}

fn sort<T: Rankable>(items: &mut [T], tie_break: TieBreak) {
    match tie_break {
        TieBreak::InputOrder => items.sort_by_key(|item| Reverse(item.points())),
        TieBreak::Id => items.sort_by_key(|item| (Reverse(item.points()), item.id())),
    }
}

/// Unbiased random permutation of the presentation order.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}
