//! Summary statistics for a friend's snapshot log.

use shaltabla_types::{ChangeRecord, FriendStats, PointSnapshot};

/// Compute statistics over a snapshot log (oldest first).
///
/// An empty log yields all zeros. `best_change` and `worst_change` stay
/// zeroed when the log never rose or never fell.
pub fn compute_stats<'a, I>(snapshots: I) -> FriendStats
where
    I: IntoIterator<Item = &'a PointSnapshot>,
{
    let points: Vec<u32> = snapshots.into_iter().map(|s| s.points).collect();
    let (Some(&highest), Some(&lowest)) = (points.iter().max(), points.iter().min()) else {
        return FriendStats::default();
    };

    let sum: f64 = points.iter().copied().map(f64::from).sum();
    let count = f64::from(u32::try_from(points.len()).unwrap_or(u32::MAX));
    let average = sum / count;
    let variance = points
        .iter()
        .map(|&p| {
            let diff = f64::from(p) - average;
            diff * diff
        })
        .sum::<f64>()
        / count;

    let mut best_change = ChangeRecord::default();
    let mut worst_change = ChangeRecord::default();
    for pair in points.windows(2) {
        let [from, to] = pair else { continue };
        let value = i64::from(*to).saturating_sub(i64::from(*from));
        if value > best_change.value {
            best_change = ChangeRecord {
                value,
                from: *from,
                to: *to,
            };
        }
        if value < worst_change.value {
            worst_change = ChangeRecord {
                value,
                from: *from,
                to: *to,
            };
        }
    }

    FriendStats {
        highest,
        lowest,
        average,
        volatility: variance.sqrt(),
        total_changes: u32::try_from(points.len().saturating_sub(1)).unwrap_or(u32::MAX),
        best_change,
        worst_change,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn log(points: &[u32]) -> Vec<PointSnapshot> {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        points
            .iter()
            .zip(0_i64..)
            .map(|(&p, i)| PointSnapshot::new(p, start + Duration::seconds(i * 5)))
            .collect()
    }

    #[test]
    fn empty_log_is_all_zero() {
        assert_eq!(compute_stats(&Vec::<PointSnapshot>::new()), FriendStats::default());
    }

    #[test]
    fn single_snapshot() {
        let stats = compute_stats(&log(&[2850]));
        assert_eq!(stats.highest, 2850);
        assert_eq!(stats.lowest, 2850);
        assert_eq!(stats.average, 2850.0);
        assert_eq!(stats.volatility, 0.0);
        assert_eq!(stats.total_changes, 0);
        assert_eq!(stats.best_change, ChangeRecord::default());
    }

    #[test]
    fn known_log() {
        let stats = compute_stats(&log(&[2, 4, 4, 4, 5, 5, 7, 9]));
        assert_eq!(stats.highest, 9);
        assert_eq!(stats.lowest, 2);
        assert_eq!(stats.average, 5.0);
        assert_eq!(stats.volatility, 2.0);
        assert_eq!(stats.total_changes, 7);
        assert_eq!(
            stats.best_change,
            ChangeRecord {
                value: 2,
                from: 2,
                to: 4
            }
        );
        assert_eq!(stats.worst_change, ChangeRecord::default());
    }

    #[test]
    fn best_and_worst_swings() {
        let stats = compute_stats(&log(&[1000, 10_000, 0, 300]));
        assert_eq!(
            stats.best_change,
            ChangeRecord {
                value: 9000,
                from: 1000,
                to: 10_000
            }
        );
        assert_eq!(
            stats.worst_change,
            ChangeRecord {
                value: -10_000,
                from: 10_000,
                to: 0
            }
        );
    }
}
