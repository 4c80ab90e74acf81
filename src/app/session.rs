//! Client session: the single owner of all synchronization state

use tracing::{error, info, warn};

use crate::app::frame::{AvatarView, CameraView, Frame, FrameSink};
use crate::config::Config;
use crate::game::asset::{AssetError, LoadedAsset};
use crate::game::controller::{LocalAvatar, LocalInputController, LogicalKey, MovementStats};
use crate::game::registry::{LoadRequest, RemotePlayerRegistry};
use crate::game::spawn::SpawnPointGenerator;
use crate::game::PlayerId;
use crate::util::rate_limit::MoveThrottle;
use crate::util::time::unix_millis;
use crate::ws::adapter::{EventSink, SyncProtocolAdapter};
use crate::ws::protocol::{PlayerState, ServerMsg};

/// Composition root for one connected client. Every operation takes
/// `&mut self`; the owner serializes input, network and tick callbacks.
pub struct Session<S> {
    controller: LocalInputController,
    local: Option<LocalAvatar>,
    registry: RemotePlayerRegistry,
    adapter: SyncProtocolAdapter<S>,
    spawner: SpawnPointGenerator,
    frame: u64,
}

impl<S: EventSink> Session<S> {
    pub fn new(sink: S, config: &Config) -> Self {
        let spawner = match config.spawn_seed {
            Some(seed) => SpawnPointGenerator::with_seed(seed),
            None => SpawnPointGenerator::new(),
        };
        Self::with_parts(sink, MoveThrottle::new(config.move_rate_limit), spawner)
    }

    pub fn with_parts(sink: S, throttle: MoveThrottle, spawner: SpawnPointGenerator) -> Self {
        Self {
            controller: LocalInputController::new(MovementStats::default()),
            local: None,
            registry: RemotePlayerRegistry::new(),
            adapter: SyncProtocolAdapter::new(sink, throttle),
            spawner,
            frame: 0,
        }
    }

    pub fn local_id(&self) -> Option<&PlayerId> {
        self.adapter.local_id()
    }

    pub fn local_avatar(&self) -> Option<&LocalAvatar> {
        self.local.as_ref()
    }

    pub fn controller(&self) -> &LocalInputController {
        &self.controller
    }

    pub fn registry(&self) -> &RemotePlayerRegistry {
        &self.registry
    }

    pub fn adapter(&self) -> &SyncProtocolAdapter<S> {
        &self.adapter
    }

    /// Raw key-down/key-up. Keys outside the whitelist are ignored.
    pub fn on_key(&mut self, raw: &str, pressed: bool) {
        self.controller.on_raw_key(raw, pressed);
    }

    pub fn on_logical_key(&mut self, key: LogicalKey, pressed: bool) {
        self.controller.on_key_change(key, pressed);
    }

    /// Apply one relay event. Returns avatar loads the caller must start.
    pub fn handle_server_msg(&mut self, msg: ServerMsg) -> Vec<LoadRequest> {
        self.adapter.handle_inbound(msg, &mut self.registry)
    }

    /// Finish loading the local avatar: place it and announce it.
    pub fn complete_local_load(&mut self, result: Result<LoadedAsset, AssetError>) -> bool {
        if self.local.is_some() {
            warn!("Local avatar already loaded, ignoring second load");
            return false;
        }

        match result {
            Ok(asset) => {
                let spawn = self.spawner.generate();
                let avatar = LocalAvatar::new(&asset, spawn);
                info!(
                    x = spawn.x,
                    z = spawn.z,
                    rotation = spawn.rotation_y,
                    "Local avatar spawned"
                );
                self.adapter.send_joined(PlayerState::from_avatar(&avatar));
                self.local = Some(avatar);
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to load local avatar");
                false
            }
        }
    }

    /// Finish loading a remote avatar requested by `handle_server_msg`
    pub fn complete_remote_load(
        &mut self,
        request: LoadRequest,
        result: Result<LoadedAsset, AssetError>,
    ) -> bool {
        self.registry.complete_load(request, result)
    }

    /// One frame: local input first, then every remote avatar, then the
    /// frame is handed to the renderer.
    pub fn tick(&mut self, dt: f32, frames: &mut dyn FrameSink) {
        if let Some(avatar) = self.local.as_mut() {
            let changed = self.controller.tick(avatar, dt);
            avatar.animation_mut().update(dt);
            if changed {
                self.adapter.send_move(PlayerState::from_avatar(avatar));
            } else {
                self.adapter.flush_pending_move();
            }
        }

        self.registry.reconcile_tick(dt);

        self.frame += 1;
        frames.submit(&self.build_frame());
    }

    fn build_frame(&self) -> Frame {
        let local = self.local.as_ref().map(|avatar| AvatarView {
            id: None,
            scene: avatar.scene.clone(),
            pose: avatar.pose,
            action: avatar.action(),
        });

        let mut remotes: Vec<AvatarView> = self
            .registry
            .entries()
            .map(|entry| AvatarView {
                id: Some(entry.id.clone()),
                scene: entry.scene.clone(),
                pose: entry.rendered(),
                action: entry.action(),
            })
            .collect();
        remotes.sort_by(|a, b| a.id.cmp(&b.id));

        Frame {
            number: self.frame,
            timestamp_ms: unix_millis(),
            camera: local.as_ref().map(|view| CameraView::follow(&view.pose)),
            local,
            remotes,
        }
    }
}
