//! Demo roster for the in-memory backend.

use shaltabla_types::{Friend, FriendId};

/// Names and starting scores of the demo roster.
const DEMO_FRIENDS: [(&str, u32); 8] = [
    ("Alex", 2850),
    ("Jordan", 2740),
    ("Sam", 2630),
    ("Taylor", 2510),
    ("Casey", 2390),
    ("Morgan", 2280),
    ("Riley", 2170),
    ("Avery", 2050),
];

/// Eight friends with fresh ids and descending scores, no history.
pub fn demo_roster() -> Vec<Friend> {
    DEMO_FRIENDS
        .into_iter()
        .map(|(name, points)| {
            let mut friend = Friend::new(FriendId::new(), name);
            friend.points = points;
            friend
        })
        .collect()
}
