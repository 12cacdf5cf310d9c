//! Friend persistence.
//!
//! [`Store`] is the backend chosen at startup: `PostgreSQL` for real runs,
//! process memory for tests and demos. Both backends expose the same
//! operations.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use shaltabla_types::{Friend, FriendId, MAX_POINTS, PointSnapshot, ScoreUpdate};
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DbError;

// =========================================================================
// PostgreSQL
// =========================================================================

/// Operations on the `friends` table.
#[derive(Debug, Clone)]
pub struct PostgresFriendStore {
    pool: PgPool,
}

impl PostgresFriendStore {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every friend, highest score first.
    pub async fn list_friends(&self) -> Result<Vec<Friend>, DbError> {
        let rows = sqlx::query_as::<_, FriendRow>(
            r"SELECT id, name, points, point_history, created_at, updated_at
              FROM friends
              ORDER BY points DESC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FriendRow::into_friend).collect()
    }

    /// Insert a friend with zero points.
    pub async fn insert_friend(&self, name: &str) -> Result<Friend, DbError> {
        let row = sqlx::query_as::<_, FriendRow>(
            r"INSERT INTO friends (name, points, point_history)
              VALUES ($1, 0, '[]'::jsonb)
              RETURNING id, name, points, point_history, created_at, updated_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(friend_id = %row.id, "Inserted friend");
        row.into_friend()
    }

    /// Set one friend's score and snapshot log.
    ///
    /// Returns [`DbError::NotFound`] when no row has this id.
    pub async fn update_points(&self, update: &ScoreUpdate) -> Result<(), DbError> {
        let history = serde_json::to_value(&update.point_history)?;
        let result = sqlx::query(
            r"UPDATE friends SET points = $2, point_history = $3, updated_at = now()
              WHERE id = $1",
        )
        .bind(update.id.into_inner())
        .bind(points_to_db(update.points))
        .bind(history)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(update.id));
        }
        tracing::debug!(friend_id = %update.id, points = update.points, "Updated points");
        Ok(())
    }

    /// Apply a batch of score and history updates in one transaction.
    ///
    /// Unknown ids are skipped. Returns the number of rows updated.
    pub async fn batch_update(&self, updates: &[ScoreUpdate]) -> Result<u64, DbError> {
        if updates.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut updated: u64 = 0;

        for update in updates {
            let history = serde_json::to_value(&update.point_history)?;
            let result = sqlx::query(
                r"UPDATE friends SET points = $2, point_history = $3, updated_at = now()
                  WHERE id = $1",
            )
            .bind(update.id.into_inner())
            .bind(points_to_db(update.points))
            .bind(history)
            .execute(&mut *tx)
            .await?;
            updated = updated.saturating_add(result.rows_affected());
        }

        tx.commit().await?;

        tracing::debug!(count = updated, "Applied score batch");
        Ok(updated)
    }

    /// Zero every score and restart each history at `(0, at)`.
    pub async fn reset_all(&self, at: DateTime<Utc>) -> Result<u64, DbError> {
        let history = serde_json::to_value([PointSnapshot::new(0, at)])?;
        let result = sqlx::query(
            r"UPDATE friends SET points = 0, point_history = $1, updated_at = now()",
        )
        .bind(history)
        .execute(&self.pool)
        .await?;

        tracing::info!(count = result.rows_affected(), "Reset all friends");
        Ok(result.rows_affected())
    }
}

/// A row from the `friends` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FriendRow {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Current score.
    pub points: i32,
    /// Snapshot log as JSON.
    pub point_history: serde_json::Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FriendRow {
    /// Convert to the shared [`Friend`] type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidData`] for a score outside `[0, 10000]` and
    /// [`DbError::Serialization`] for a malformed history.
    pub fn into_friend(self) -> Result<Friend, DbError> {
        let points = u32::try_from(self.points)
            .ok()
            .filter(|p| *p <= MAX_POINTS)
            .ok_or_else(|| {
                DbError::InvalidData(format!("friend {} has {} points", self.id, self.points))
            })?;
        let point_history: Vec<PointSnapshot> = serde_json::from_value(self.point_history)?;
        Ok(Friend {
            id: FriendId::from(self.id),
            name: self.name,
            points,
            point_history,
        })
    }
}

fn points_to_db(points: u32) -> i32 {
    i32::try_from(points.min(MAX_POINTS)).unwrap_or(0)
}

// =========================================================================
// Memory
// =========================================================================

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryFriendStore {
    friends: RwLock<Vec<Friend>>,
}

impl MemoryFriendStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `friends`.
    pub fn with_friends(friends: Vec<Friend>) -> Self {
        Self {
            friends: RwLock::new(friends),
        }
    }

    /// Every friend, highest score first.
    pub async fn list_friends(&self) -> Vec<Friend> {
        let mut friends = self.friends.read().await.clone();
        friends.sort_by_key(|f| Reverse(f.points));
        friends
    }

    /// Insert a friend with zero points.
    pub async fn insert_friend(&self, name: &str) -> Friend {
        let friend = Friend::new(FriendId::new(), name);
        self.friends.write().await.push(friend.clone());
        friend
    }

    /// Set one friend's score and snapshot log.
    pub async fn update_points(&self, update: &ScoreUpdate) -> Result<(), DbError> {
        let mut friends = self.friends.write().await;
        let friend = friends
            .iter_mut()
            .find(|f| f.id == update.id)
            .ok_or(DbError::NotFound(update.id))?;
        friend.points = update.points.min(MAX_POINTS);
        friend.point_history.clone_from(&update.point_history);
        Ok(())
    }

    /// Apply a batch of updates. Unknown ids are skipped.
    pub async fn batch_update(&self, updates: &[ScoreUpdate]) -> u64 {
        let mut friends = self.friends.write().await;
        let mut updated: u64 = 0;
        for update in updates {
            if let Some(friend) = friends.iter_mut().find(|f| f.id == update.id) {
                friend.points = update.points.min(MAX_POINTS);
                friend.point_history.clone_from(&update.point_history);
                updated = updated.saturating_add(1);
            }
        }
        updated
    }

    /// Zero every score and restart each history at `(0, at)`.
    pub async fn reset_all(&self, at: DateTime<Utc>) -> u64 {
        let mut friends = self.friends.write().await;
        for friend in friends.iter_mut() {
            friend.points = 0;
            friend.point_history = vec![PointSnapshot::new(0, at)];
        }
        u64::try_from(friends.len()).unwrap_or(u64::MAX)
    }
}

// =========================================================================
// Backend selection
// =========================================================================

/// The configured friend store.
#[derive(Debug)]
pub enum Store {
    /// `PostgreSQL`-backed.
    Postgres(PostgresFriendStore),
    /// Memory-backed.
    Memory(MemoryFriendStore),
}

impl Store {
    /// Short backend name for logs.
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Every friend, highest score first.
    pub async fn list_friends(&self) -> Result<Vec<Friend>, DbError> {
        match self {
            Self::Postgres(store) => store.list_friends().await,
            Self::Memory(store) => Ok(store.list_friends().await),
        }
    }

    /// Insert a friend with zero points.
    pub async fn insert_friend(&self, name: &str) -> Result<Friend, DbError> {
        match self {
            Self::Postgres(store) => store.insert_friend(name).await,
            Self::Memory(store) => Ok(store.insert_friend(name).await),
        }
    }

    /// Set one friend's score and snapshot log.
    pub async fn update_points(&self, update: &ScoreUpdate) -> Result<(), DbError> {
        match self {
            Self::Postgres(store) => store.update_points(update).await,
            Self::Memory(store) => store.update_points(update).await,
        }
    }

    /// Apply a batch of score and history updates.
    pub async fn batch_update(&self, updates: &[ScoreUpdate]) -> Result<u64, DbError> {
        match self {
            Self::Postgres(store) => store.batch_update(updates).await,
            Self::Memory(store) => Ok(store.batch_update(updates).await),
        }
    }

    /// Zero every score and restart every history.
    pub async fn reset_all(&self, at: DateTime<Utc>) -> Result<u64, DbError> {
        match self {
            Self::Postgres(store) => store.reset_all(at).await,
            Self::Memory(store) => Ok(store.reset_all(at).await),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 14, 20, 0, 0).unwrap()
    }

    fn memory() -> Store {
        let mut alex = Friend::new(FriendId::new(), "Alex");
        alex.points = 2850;
        let mut avery = Friend::new(FriendId::new(), "Avery");
        avery.points = 2050;
        Store::Memory(MemoryFriendStore::with_friends(vec![avery, alex]))
    }

    #[tokio::test]
    async fn list_is_sorted_by_points() {
        let store = memory();
        let names: Vec<String> = store
            .list_friends()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Alex", "Avery"]);
    }

    #[tokio::test]
    async fn insert_starts_at_zero() {
        let store = memory();
        let friend = store.insert_friend("Sam").await.unwrap();
        assert_eq!(friend.points, 0);
        assert!(friend.point_history.is_empty());
        assert_eq!(store.list_friends().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_points_unknown_friend() {
        let store = memory();
        let id = FriendId::new();
        let update = ScoreUpdate {
            id,
            points: 10,
            point_history: vec![PointSnapshot::new(10, at())],
        };
        let err = store.update_points(&update).await;
        assert!(matches!(err, Err(DbError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn update_points_keeps_history_in_step() {
        let store = memory();
        let friend = store.insert_friend("Casey").await.unwrap();
        let history = vec![PointSnapshot::new(0, at()), PointSnapshot::new(4321, at())];
        store
            .update_points(&ScoreUpdate {
                id: friend.id,
                points: 4321,
                point_history: history.clone(),
            })
            .await
            .unwrap();
        let stored = store
            .list_friends()
            .await
            .unwrap()
            .into_iter()
            .find(|f| f.id == friend.id)
            .unwrap();
        assert_eq!(stored.points, 4321);
        assert_eq!(stored.point_history, history);
        assert_eq!(stored.point_history.last().map(|s| s.points), Some(stored.points));
    }

    #[tokio::test]
    async fn batch_update_skips_unknown_ids() {
        let store = memory();
        let friends = store.list_friends().await.unwrap();
        let known = friends.first().unwrap().id;
        let updates = vec![
            ScoreUpdate {
                id: known,
                points: 9999,
                point_history: vec![PointSnapshot::new(9999, at())],
            },
            ScoreUpdate {
                id: FriendId::new(),
                points: 1,
                point_history: Vec::new(),
            },
        ];
        assert_eq!(store.batch_update(&updates).await.unwrap(), 1);
        let stored = store.list_friends().await.unwrap();
        let first = stored.first().unwrap();
        assert_eq!(first.id, known);
        assert_eq!(first.points, 9999);
        assert_eq!(first.point_history, vec![PointSnapshot::new(9999, at())]);
    }

    #[tokio::test]
    async fn reset_zeroes_everyone() {
        let store = memory();
        assert_eq!(store.reset_all(at()).await.unwrap(), 2);
        for friend in store.list_friends().await.unwrap() {
            assert_eq!(friend.points, 0);
            assert_eq!(friend.point_history, vec![PointSnapshot::new(0, at())]);
        }
    }

    #[test]
    fn row_conversion_rejects_out_of_range_points() {
        let row = FriendRow {
            id: Uuid::now_v7(),
            name: "Broken".to_owned(),
            points: 20_000,
            point_history: serde_json::json!([]),
            created_at: at(),
            updated_at: at(),
        };
        assert!(matches!(row.into_friend(), Err(DbError::InvalidData(_))));
    }

    #[test]
    fn row_conversion_parses_history() {
        let row = FriendRow {
            id: Uuid::now_v7(),
            name: "Jordan".to_owned(),
            points: 2740,
            point_history: serde_json::to_value([PointSnapshot::new(2740, at())]).unwrap(),
            created_at: at(),
            updated_at: at(),
        };
        let friend = row.into_friend().unwrap();
        assert_eq!(friend.points, 2740);
        assert_eq!(friend.point_history.len(), 1);
    }
}
