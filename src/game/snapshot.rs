//! Conversion between wire payloads and domain poses

use std::collections::HashMap;

use crate::ws::protocol::{NewPlayerPayload, PlayerSnapshot, PlayerState, StateUpdatePayload};

use super::controller::LocalAvatar;
use super::{PlayerId, Pose2D};

impl PlayerSnapshot {
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.z, self.rotation.unwrap_or(0.0))
    }
}

impl NewPlayerPayload {
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.z, self.rotation.unwrap_or(0.0))
    }
}

impl StateUpdatePayload {
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.z, self.rotation.unwrap_or(0.0))
    }
}

impl PlayerState {
    /// Outbound state of the local avatar
    pub fn from_avatar(avatar: &LocalAvatar) -> Self {
        Self {
            x: avatar.pose.x,
            z: avatar.pose.z,
            rotation: avatar.pose.rotation_y,
            action: avatar.action(),
        }
    }
}

/// Poses of every player in a full roster
pub fn roster_poses(roster: &HashMap<PlayerId, PlayerSnapshot>) -> HashMap<PlayerId, Pose2D> {
    roster
        .iter()
        .map(|(id, snapshot)| (id.clone(), snapshot.pose()))
        .collect()
}

/// Running counters for relay traffic, reported on shutdown
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncStats {
    pub events_received: u64,
    pub events_sent: u64,
    pub moves_throttled: u64,
    pub avg_roster_size: f32,
    rosters: u64,
}

impl SyncStats {
    pub fn record_roster(&mut self, player_count: usize) {
        self.rosters += 1;

        // Running average
        let n = self.rosters as f32;
        self.avg_roster_size = self.avg_roster_size * ((n - 1.0) / n) + (player_count as f32 / n);
    }

    pub fn rosters(&self) -> u64 {
        self.rosters
    }
}
