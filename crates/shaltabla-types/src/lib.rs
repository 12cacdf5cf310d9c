//! Shared type definitions for the Shaltabla leaderboard.
//!
//! This crate is the single source of truth for the types exchanged between
//! the engine, the store and the API. Types flow to `TypeScript` via `ts-rs`
//! for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for friend identifiers
//! - [`enums`] -- Timeframes, rank movement and narration tone
//! - [`structs`] -- Friend records, snapshots, views and statistics

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{RankMovement, Timeframe, TimeframeParseError, Tone};
pub use ids::FriendId;
pub use structs::{
    ChangeRecord, Friend, FriendDetail, FriendStats, FriendView, LeaderboardView, MAX_POINTS,
    MIN_POINTS, PersistBatch, PointSnapshot, ScoreUpdate, TickerMessage,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Exporting writes files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::FriendId::export_all();

        let _ = crate::enums::Timeframe::export_all();
        let _ = crate::enums::RankMovement::export_all();
        let _ = crate::enums::Tone::export_all();

        let _ = crate::structs::PointSnapshot::export_all();
        let _ = crate::structs::Friend::export_all();
        let _ = crate::structs::ScoreUpdate::export_all();
        let _ = crate::structs::PersistBatch::export_all();
        let _ = crate::structs::FriendView::export_all();
        let _ = crate::structs::LeaderboardView::export_all();
        let _ = crate::structs::ChangeRecord::export_all();
        let _ = crate::structs::FriendStats::export_all();
        let _ = crate::structs::FriendDetail::export_all();
        let _ = crate::structs::TickerMessage::export_all();
    }
}
