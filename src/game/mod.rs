//! Avatar simulation modules

pub mod animation;
pub mod asset;
pub mod controller;
pub mod registry;
pub mod snapshot;
pub mod spawn;

pub use animation::{AnimationName, AnimationStateMachine};
pub use controller::{LocalAvatar, LocalInputController, LogicalKey};
pub use registry::{LoadRequest, RemoteAvatarEntry, RemotePlayerRegistry, SnapshotOutcome};
pub use spawn::SpawnPointGenerator;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity assigned by the relay, stable for the lifetime of a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Planar placement. Yaw is in radians and is never normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose2D {
    pub x: f32,
    pub z: f32,
    pub rotation_y: f32,
}

impl Pose2D {
    pub fn new(x: f32, z: f32, rotation_y: f32) -> Self {
        Self { x, z, rotation_y }
    }

    /// Distance between the positions of two poses (yaw ignored)
    pub fn distance_to(&self, other: &Pose2D) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }
}
