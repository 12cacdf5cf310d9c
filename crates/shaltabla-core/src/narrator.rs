//! Narration of notable score swings and the ticker that displays them.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::IndexedRandom;
use shaltabla_types::{MAX_POINTS, MIN_POINTS, Tone};

use crate::config::NarratorConfig;

/// Templates used when a score jumps up. `{name}` is replaced.
pub const POSITIVE_TEMPLATES: [&str; 8] = [
    "{name} is on a roll!",
    "{name} made the room laugh!",
    "{name} is killing it!",
    "{name} is unstoppable!",
    "{name} is on fire!",
    "{name} just crushed it!",
    "{name} is dominating!",
    "{name} is absolutely hilarious!",
];

/// Templates used when a score drops. `{name}` is replaced.
pub const NEGATIVE_TEMPLATES: [&str; 5] = [
    "{name} had a rough moment...",
    "{name} needs to step it up!",
    "{name} is having a tough time...",
    "{name} hit rock bottom!",
    "{name} is struggling...",
];

/// A rendered narrator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    /// Tone following the sign of the change.
    pub tone: Tone,
    /// Message with the friend's name filled in.
    pub text: String,
}

/// Whether a transition from `old` to `new` deserves a message.
///
/// Zero change never qualifies. Otherwise any of: the absolute change
/// exceeds the threshold, the change relative to `old` exceeds the relative
/// threshold (`old == 0` counts as infinitely large), or `new` sits on a
/// boundary.
pub fn is_notable(config: &NarratorConfig, old: u32, new: u32) -> bool {
    if old == new {
        return false;
    }
    let change = old.abs_diff(new);
    let relative = old == 0 || f64::from(change) / f64::from(old) > config.relative_threshold;
    change > config.absolute_threshold || relative || new == MIN_POINTS || new == MAX_POINTS
}

/// Describe a transition, or `None` when it is not notable.
pub fn describe<R: Rng>(
    rng: &mut R,
    config: &NarratorConfig,
    name: &str,
    old: u32,
    new: u32,
) -> Option<Narration> {
    if !is_notable(config, old, new) {
        return None;
    }
    let (tone, pool): (Tone, &[&str]) = if new > old {
        (Tone::Positive, POSITIVE_TEMPLATES.as_slice())
    } else {
        (Tone::Negative, NEGATIVE_TEMPLATES.as_slice())
    };
    let template = pool.choose(rng)?;
    Some(Narration {
        tone,
        text: template.replace("{name}", name),
    })
}

/// The most recent narrator messages, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticker {
    messages: VecDeque<String>,
    capacity: usize,
}

impl Ticker {
    /// Empty ticker holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a message, evicting the oldest beyond capacity.
    pub fn push(&mut self, message: String) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Current messages, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.iter().cloned().collect()
    }

    /// Remove every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
