// Managers Module
//
// Focused managers used by the session, one concern each:
// - AnalysisManager: background pipeline runs, generations and cancellation
// - BroadcastChannelManager: tokio broadcast channel for session events

pub mod analysis_manager;
pub mod broadcast_manager;

pub use analysis_manager::{AnalysisEvent, AnalysisManager};
pub use broadcast_manager::BroadcastChannelManager;
