//! Local keyboard control of the player's own avatar

use std::f32::consts::FRAC_PI_2;

use super::animation::{AnimationMixer, AnimationName, AnimationStateMachine};
use super::asset::LoadedAsset;
use super::Pose2D;

/// Movement tunables for the local avatar
#[derive(Debug, Clone, Copy)]
pub struct MovementStats {
    /// Walking speed (units per second)
    pub walk_speed: f32,
    /// Running speed (units per second)
    pub run_speed: f32,
    /// Turn rate in radians per second
    pub rotation_speed: f32,
    /// Turn rate multiplier while running
    pub running_rotation_multiplier: f32,
}

impl Default for MovementStats {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            run_speed: 5.0,
            rotation_speed: FRAC_PI_2,
            running_rotation_multiplier: 1.2,
        }
    }
}

/// Logical keys the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKey {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    Run,
}

impl LogicalKey {
    /// Map a raw key from the whitelist `w a s d Shift`
    pub fn from_raw(key: &str) -> Option<Self> {
        match key {
            "w" => Some(Self::Forward),
            "s" => Some(Self::Backward),
            "a" => Some(Self::TurnLeft),
            "d" => Some(Self::TurnRight),
            "Shift" => Some(Self::Run),
            _ => None,
        }
    }
}

/// Pressed/released state of every logical key
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyState {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub run: bool,
}

/// Intents derived from the key state
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementIntent {
    pub moving_forward: bool,
    pub moving_backward: bool,
    pub rotating_left: bool,
    pub rotating_right: bool,
    pub running: bool,
}

impl MovementIntent {
    fn from_keys(keys: &KeyState) -> Self {
        let moving_forward = keys.forward;
        let moving_backward = keys.backward;
        Self {
            moving_forward,
            moving_backward,
            rotating_left: keys.turn_left,
            rotating_right: keys.turn_right,
            running: keys.run && (moving_forward || moving_backward),
        }
    }
}

/// The player's own avatar. Exists once the avatar asset has loaded.
#[derive(Debug, Clone)]
pub struct LocalAvatar {
    pub pose: Pose2D,
    pub scene: String,
    animation: AnimationStateMachine,
}

impl LocalAvatar {
    pub fn new(asset: &LoadedAsset, spawn: Pose2D) -> Self {
        Self {
            pose: spawn,
            scene: asset.scene.clone(),
            animation: AnimationStateMachine::new(AnimationMixer::from_clips(&asset.clips)),
        }
    }

    pub fn action(&self) -> AnimationName {
        self.animation.current()
    }

    pub fn animation(&self) -> &AnimationStateMachine {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationStateMachine {
        &mut self.animation
    }
}

/// Tracks keyboard state and drives the local avatar each tick
#[derive(Debug, Clone, Default)]
pub struct LocalInputController {
    keys: KeyState,
    intent: MovementIntent,
    stats: MovementStats,
}

impl LocalInputController {
    pub fn new(stats: MovementStats) -> Self {
        Self {
            keys: KeyState::default(),
            intent: MovementIntent::default(),
            stats,
        }
    }

    pub fn keys(&self) -> KeyState {
        self.keys
    }

    pub fn intent(&self) -> MovementIntent {
        self.intent
    }

    /// Update one logical key and re-derive intents
    pub fn on_key_change(&mut self, key: LogicalKey, pressed: bool) {
        match key {
            LogicalKey::Forward => self.keys.forward = pressed,
            LogicalKey::Backward => self.keys.backward = pressed,
            LogicalKey::TurnLeft => self.keys.turn_left = pressed,
            LogicalKey::TurnRight => self.keys.turn_right = pressed,
            LogicalKey::Run => self.keys.run = pressed,
        }
        self.intent = MovementIntent::from_keys(&self.keys);
    }

    /// Raw key signal. Keys outside the whitelist are ignored.
    pub fn on_raw_key(&mut self, raw: &str, pressed: bool) -> bool {
        match LogicalKey::from_raw(raw) {
            Some(key) => {
                self.on_key_change(key, pressed);
                true
            }
            None => false,
        }
    }

    /// Pose the avatar should be in given the current intents
    pub fn target_animation(&self) -> AnimationName {
        let intent = &self.intent;
        if intent.moving_forward && intent.running {
            AnimationName::Run
        } else if intent.moving_forward || intent.moving_backward {
            AnimationName::Walk
        } else {
            AnimationName::Idle
        }
    }

    /// Advance the avatar by `elapsed` seconds.
    /// Returns true when its position or rotation changed.
    pub fn tick(&self, avatar: &mut LocalAvatar, elapsed: f32) -> bool {
        avatar.animation.request(self.target_animation());

        let before = avatar.pose;
        let intent = &self.intent;

        let turn = axis(intent.rotating_left, intent.rotating_right);
        if turn != 0.0 {
            let multiplier = if intent.running {
                self.stats.running_rotation_multiplier
            } else {
                1.0
            };
            avatar.pose.rotation_y += turn * self.stats.rotation_speed * multiplier * elapsed;
        }

        let advance = axis(intent.moving_forward, intent.moving_backward);
        if advance != 0.0 {
            let speed = if intent.running {
                self.stats.run_speed
            } else {
                self.stats.walk_speed
            };
            // Forward axis (0, 0, 1) rotated about +Y by yaw
            let yaw = avatar.pose.rotation_y;
            let step = advance * speed * elapsed;
            avatar.pose.x += yaw.sin() * step;
            avatar.pose.z += yaw.cos() * step;
        }

        avatar.pose != before
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}
