//! Enumeration types for the Shaltabla leaderboard.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Timeframe
// ---------------------------------------------------------------------------

/// Window against which percentage change is measured.
///
/// Serialized with the short labels the selector uses (`15s`, `1m`, ...).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Timeframe {
    /// Fifteen seconds.
    #[serde(rename = "15s")]
    FifteenSeconds,
    /// One minute.
    #[default]
    #[serde(rename = "1m")]
    OneMinute,
    /// Five minutes.
    #[serde(rename = "5m")]
    FiveMinutes,
    /// Ten minutes.
    #[serde(rename = "10m")]
    TenMinutes,
    /// One hour.
    #[serde(rename = "1h")]
    OneHour,
    /// The whole retained snapshot log.
    #[serde(rename = "all")]
    All,
}

impl Timeframe {
    /// Every selectable timeframe, shortest first.
    pub const ALL: [Self; 6] = [
        Self::FifteenSeconds,
        Self::OneMinute,
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::OneHour,
        Self::All,
    ];

    /// Window length in milliseconds, or `None` for [`Timeframe::All`].
    pub const fn duration_ms(self) -> Option<i64> {
        match self {
            Self::FifteenSeconds => Some(15_000),
            Self::OneMinute => Some(60_000),
            Self::FiveMinutes => Some(300_000),
            Self::TenMinutes => Some(600_000),
            Self::OneHour => Some(3_600_000),
            Self::All => None,
        }
    }

    /// Short label used on the wire and in configuration.
    pub const fn label(self) -> &'static str {
        match self {
            Self::FifteenSeconds => "15s",
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::TenMinutes => "10m",
            Self::OneHour => "1h",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string does not name a known [`Timeframe`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown timeframe: {0} (expected one of 15s, 1m, 5m, 10m, 1h, all)")]
pub struct TimeframeParseError(pub String);

impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tf| tf.label() == wanted)
            .ok_or(TimeframeParseError(wanted))
    }
}

// ---------------------------------------------------------------------------
// Rank movement
// ---------------------------------------------------------------------------

/// Direction a friend moved during the last ranking pass.
///
/// Only the sign of the change is tracked; "moved N places" is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum RankMovement {
    /// Rank number decreased (moved toward the top).
    Up,
    /// Rank number increased.
    Down,
    /// Same rank as before.
    Unchanged,
    /// No previous rank (first ranking pass for this friend).
    New,
}

impl RankMovement {
    /// Compare a previous rank against the current one.
    pub fn between(previous: Option<u32>, current: u32) -> Self {
        match previous {
            None => Self::New,
            Some(prev) if prev > current => Self::Up,
            Some(prev) if prev < current => Self::Down,
            Some(_) => Self::Unchanged,
        }
    }
}

// ---------------------------------------------------------------------------
// Narration tone
// ---------------------------------------------------------------------------

/// Tone of a ticker message, following the sign of the score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Score went up.
    Positive,
    /// Score went down.
    Negative,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_labels_parse_back() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.label().parse::<Timeframe>(), Ok(tf));
        }
    }

    #[test]
    fn timeframe_parse_is_case_insensitive() {
        assert_eq!("ALL".parse::<Timeframe>(), Ok(Timeframe::All));
        assert_eq!(" 5M ".parse::<Timeframe>(), Ok(Timeframe::FiveMinutes));
    }

    #[test]
    fn unknown_timeframe_is_rejected() {
        let err = "2d".parse::<Timeframe>();
        assert!(err.is_err());
    }

    #[test]
    fn timeframe_serde_uses_labels() {
        let json = serde_json::to_string(&Timeframe::TenMinutes).unwrap_or_default();
        assert_eq!(json, "\"10m\"");
        let back: Result<Timeframe, _> = serde_json::from_str("\"15s\"");
        assert_eq!(back.ok(), Some(Timeframe::FifteenSeconds));
    }

    #[test]
    fn only_all_has_no_duration() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.duration_ms().is_none(), tf == Timeframe::All);
        }
        assert_eq!(Timeframe::OneMinute.duration_ms(), Some(60_000));
    }

    #[test]
    fn rank_movement_follows_sign() {
        assert_eq!(RankMovement::between(Some(3), 1), RankMovement::Up);
        assert_eq!(RankMovement::between(Some(1), 4), RankMovement::Down);
        assert_eq!(RankMovement::between(Some(2), 2), RankMovement::Unchanged);
        assert_eq!(RankMovement::between(None, 2), RankMovement::New);
    }
}
