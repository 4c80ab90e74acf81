//! Animation poses, mixer and crossfade state machine

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::asset::AnimationClip;

/// Crossfade duration between two poses (seconds)
pub const CROSSFADE_DURATION: f32 = 0.5;

/// Named poses an avatar can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationName {
    #[default]
    Idle,
    Walk,
    Run,
}

impl AnimationName {
    /// Clip name this pose maps to in a loaded asset
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walk => "walk",
            Self::Run => "run",
        }
    }
}

impl fmt::Display for AnimationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
}

/// A playable action bound to one clip
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: AnimationClip,
    time: f32,
    weight: f32,
    playing: bool,
    fade: Option<Fade>,
}

impl AnimationAction {
    fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            time: 0.0,
            weight: 1.0,
            playing: false,
            fade: None,
        }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playback position within the clip
    pub fn time(&self) -> f32 {
        self.time
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }

        self.time += dt;
        if self.clip.duration > 0.0 {
            self.time %= self.clip.duration;
        }

        if let Some(fade) = self.fade.as_mut() {
            fade.elapsed += dt;
            let progress = if fade.duration > 0.0 {
                (fade.elapsed / fade.duration).min(1.0)
            } else {
                1.0
            };
            self.weight = fade.from + (fade.to - fade.from) * progress;

            if progress >= 1.0 {
                let target = fade.to;
                self.fade = None;
                if target <= 0.0 {
                    self.playing = false;
                }
            }
        }
    }
}

/// Per-avatar mixer: owns one action per clip in the loaded asset
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    actions: HashMap<String, AnimationAction>,
}

impl AnimationMixer {
    pub fn from_clips(clips: &[AnimationClip]) -> Self {
        let actions = clips
            .iter()
            .map(|clip| (clip.name.clone(), AnimationAction::new(clip.clone())))
            .collect();
        Self { actions }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn action(&self, name: &str) -> Option<&AnimationAction> {
        self.actions.get(name)
    }

    /// Start an action at full weight. Returns false if the clip is missing.
    pub fn play(&mut self, name: &str) -> bool {
        match self.actions.get_mut(name) {
            Some(action) => {
                action.playing = true;
                action.weight = 1.0;
                action.fade = None;
                true
            }
            None => false,
        }
    }

    /// Fade an action out from its current weight; it stops once silent
    pub fn fade_out(&mut self, name: &str, duration: f32) {
        if let Some(action) = self.actions.get_mut(name) {
            action.fade = Some(Fade {
                from: action.weight,
                to: 0.0,
                duration,
                elapsed: 0.0,
            });
        }
    }

    /// Restart an action from the beginning and fade it in from silence
    pub fn fade_in(&mut self, name: &str, duration: f32) {
        if let Some(action) = self.actions.get_mut(name) {
            action.time = 0.0;
            action.weight = 0.0;
            action.playing = true;
            action.fade = Some(Fade {
                from: 0.0,
                to: 1.0,
                duration,
                elapsed: 0.0,
            });
        }
    }

    /// Advance every playing action by `dt`
    pub fn update(&mut self, dt: f32) {
        for action in self.actions.values_mut() {
            action.advance(dt);
        }
    }
}

/// Tracks the current pose of one avatar and crossfades between poses.
///
/// Missing clips are tolerated: requesting a pose the asset does not carry
/// still commits the name, the fade-in just has nothing to act on.
#[derive(Debug, Clone)]
pub struct AnimationStateMachine {
    current: AnimationName,
    mixer: AnimationMixer,
}

impl AnimationStateMachine {
    /// Build from a mixer and start playing `idle`
    pub fn new(mut mixer: AnimationMixer) -> Self {
        mixer.play(AnimationName::Idle.as_str());
        Self {
            current: AnimationName::Idle,
            mixer,
        }
    }

    pub fn current(&self) -> AnimationName {
        self.current
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Request a pose. Returns true when a transition was started.
    pub fn request(&mut self, name: AnimationName) -> bool {
        if name == self.current {
            return false;
        }

        self.mixer.fade_out(self.current.as_str(), CROSSFADE_DURATION);
        self.mixer.fade_in(name.as_str(), CROSSFADE_DURATION);
        self.current = name;
        true
    }

    /// Advance the mixer by the frame's elapsed time
    pub fn update(&mut self, dt: f32) {
        self.mixer.update(dt);
    }
}
