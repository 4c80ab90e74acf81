//! Relay protocol message definitions
//! These are the wire types for client-relay communication. Every frame is
//! a named event: `{"event": "<name>", "data": <payload>}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::{AnimationName, PlayerId};

/// Pose and pose-name reported by this client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f32,
    pub z: f32,
    /// Yaw in radians
    pub rotation: f32,
    pub action: AnimationName,
}

/// Messages sent from client to relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Sent once, after the local avatar finished loading
    PlayerJoined(PlayerState),

    /// Sent on every tick the local pose changed
    Move(PlayerState),
}

/// A single remote player's reported state.
///
/// `rotation` may be missing or null on the wire; it reads as 0.
/// `action` is carried but not interpreted, remote poses are derived from motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub x: f32,
    pub z: f32,
    #[serde(default)]
    pub rotation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Payload of `init`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitPayload {
    /// Identity the relay assigned to this client
    pub id: PlayerId,
    #[serde(default)]
    pub players: HashMap<PlayerId, PlayerSnapshot>,
}

/// Payload of `new_player`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlayerPayload {
    pub id: PlayerId,
    pub x: f32,
    pub z: f32,
    #[serde(default)]
    pub rotation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Payload of `state_update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdatePayload {
    pub id: PlayerId,
    pub x: f32,
    pub z: f32,
    #[serde(default)]
    pub rotation: Option<f32>,
}

/// Messages sent from relay to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Identity assignment plus the current roster
    Init(InitPayload),

    /// A player joined
    NewPlayer(NewPlayerPayload),

    /// Pose update for one player
    StateUpdate(StateUpdatePayload),

    /// Full roster keyed by player id
    StateUpdateAll(HashMap<PlayerId, PlayerSnapshot>),

    /// Bare player id of the player that left
    PlayerDisconnected(PlayerId),
}
