//! Translation between relay events and registry/controller operations

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::game::registry::{LoadRequest, RemotePlayerRegistry, SnapshotOutcome};
use crate::game::snapshot::{roster_poses, SyncStats};
use crate::game::PlayerId;
use crate::util::rate_limit::MoveThrottle;
use crate::ws::protocol::{ClientMsg, PlayerSnapshot, PlayerState, ServerMsg};

/// Destination for outbound relay events
pub trait EventSink {
    fn emit(&mut self, msg: ClientMsg);
}

impl EventSink for mpsc::UnboundedSender<ClientMsg> {
    fn emit(&mut self, msg: ClientMsg) {
        if self.send(msg).is_err() {
            debug!("Outbound channel closed, dropping event");
        }
    }
}

impl EventSink for Vec<ClientMsg> {
    fn emit(&mut self, msg: ClientMsg) {
        self.push(msg);
    }
}

/// Routes inbound events into the registry and emits outbound state
pub struct SyncProtocolAdapter<S> {
    sink: S,
    throttle: MoveThrottle,
    local_id: Option<PlayerId>,
    joined: bool,
    /// Latest pose held back by the throttle, sent once it allows
    pending_move: Option<PlayerState>,
    last_roster: HashMap<PlayerId, PlayerSnapshot>,
    stats: SyncStats,
}

impl<S: EventSink> SyncProtocolAdapter<S> {
    pub fn new(sink: S, throttle: MoveThrottle) -> Self {
        Self {
            sink,
            throttle,
            local_id: None,
            joined: false,
            pending_move: None,
            last_roster: HashMap::new(),
            stats: SyncStats::default(),
        }
    }

    /// Identity assigned by the relay, once `init` arrived
    pub fn local_id(&self) -> Option<&PlayerId> {
        self.local_id.as_ref()
    }

    pub fn has_joined(&self) -> bool {
        self.joined
    }

    /// Most recent full roster from `state_update_all`
    pub fn last_roster(&self) -> &HashMap<PlayerId, PlayerSnapshot> {
        &self.last_roster
    }

    /// Pose waiting for the throttle to let it through
    pub fn pending_move(&self) -> Option<&PlayerState> {
        self.pending_move.as_ref()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Apply one inbound event. Returns the avatar loads it started.
    pub fn handle_inbound(
        &mut self,
        msg: ServerMsg,
        registry: &mut RemotePlayerRegistry,
    ) -> Vec<LoadRequest> {
        self.stats.events_received += 1;

        match msg {
            ServerMsg::Init(init) => {
                info!(
                    player_id = %init.id,
                    players = init.players.len(),
                    "Received identity from relay"
                );
                // Drop any mirror of ourselves created before we knew our id
                registry.remove_entry(&init.id);
                self.local_id = Some(init.id);
                self.reconcile(&init.players, registry)
            }
            ServerMsg::NewPlayer(new_player) => {
                debug!(player_id = %new_player.id, "New player");
                if self.local_id.as_ref() == Some(&new_player.id) {
                    return Vec::new();
                }
                match registry.apply_snapshot(&new_player.id, new_player.pose()) {
                    SnapshotOutcome::LoadStarted(request) => vec![request],
                    _ => Vec::new(),
                }
            }
            ServerMsg::StateUpdate(update) => {
                if !registry.update_target(&update.id, update.pose()) {
                    debug!(player_id = %update.id, "State update for unknown player ignored");
                }
                Vec::new()
            }
            ServerMsg::StateUpdateAll(roster) => {
                let loads = self.reconcile(&roster, registry);
                self.last_roster = roster;
                loads
            }
            ServerMsg::PlayerDisconnected(id) => {
                info!(player_id = %id, "Player disconnected");
                registry.remove_entry(&id);
                Vec::new()
            }
        }
    }

    fn reconcile(
        &mut self,
        roster: &HashMap<PlayerId, PlayerSnapshot>,
        registry: &mut RemotePlayerRegistry,
    ) -> Vec<LoadRequest> {
        self.stats.record_roster(roster.len());
        registry.reconcile_roster(&roster_poses(roster), self.local_id.as_ref())
    }

    /// Announce the local avatar. Only the first call sends.
    pub fn send_joined(&mut self, state: PlayerState) -> bool {
        if self.joined {
            warn!("Local player already joined, not announcing again");
            return false;
        }
        self.joined = true;
        self.stats.events_sent += 1;
        self.sink.emit(ClientMsg::PlayerJoined(state));
        true
    }

    /// Report a changed local pose. A throttled pose is kept and replaces
    /// any older one still waiting.
    pub fn send_move(&mut self, state: PlayerState) -> bool {
        if !self.throttle.check() {
            self.stats.moves_throttled += 1;
            self.pending_move = Some(state);
            return false;
        }
        self.pending_move = None;
        self.emit_move(state);
        true
    }

    /// Send the held-back pose if the throttle allows it now
    pub fn flush_pending_move(&mut self) -> bool {
        let Some(state) = self.pending_move else {
            return false;
        };
        if !self.throttle.check() {
            return false;
        }
        debug!("Sending held-back move");
        self.pending_move = None;
        self.emit_move(state);
        true
    }

    fn emit_move(&mut self, state: PlayerState) {
        self.stats.events_sent += 1;
        self.sink.emit(ClientMsg::Move(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::AnimationName;
    use crate::ws::protocol::{InitPayload, StateUpdatePayload};

    fn adapter() -> SyncProtocolAdapter<Vec<ClientMsg>> {
        SyncProtocolAdapter::new(Vec::new(), MoveThrottle::unlimited())
    }

    fn state() -> PlayerState {
        PlayerState {
            x: 0.0,
            z: 0.0,
            rotation: 0.0,
            action: AnimationName::Idle,
        }
    }

    #[test]
    fn joined_is_sent_once() {
        let mut adapter = adapter();
        assert!(adapter.send_joined(state()));
        assert!(!adapter.send_joined(state()));
        assert_eq!(adapter.sink().len(), 1);
        assert!(matches!(adapter.sink()[0], ClientMsg::PlayerJoined(_)));
    }

    #[test]
    fn init_skips_local_identity() {
        let mut adapter = adapter();
        let mut registry = RemotePlayerRegistry::new();
        let players = [
            (
                PlayerId::from("A"),
                PlayerSnapshot {
                    x: 0.0,
                    z: 0.0,
                    rotation: None,
                    action: None,
                },
            ),
            (
                PlayerId::from("B"),
                PlayerSnapshot {
                    x: 1.0,
                    z: 1.0,
                    rotation: Some(0.0),
                    action: None,
                },
            ),
        ]
        .into_iter()
        .collect();

        let loads = adapter.handle_inbound(
            ServerMsg::Init(InitPayload {
                id: PlayerId::from("A"),
                players,
            }),
            &mut registry,
        );

        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].id, PlayerId::from("B"));
        assert_eq!(adapter.local_id(), Some(&PlayerId::from("A")));
        assert!(!registry.is_pending(&PlayerId::from("A")));
    }

    #[test]
    fn state_update_never_creates() {
        let mut adapter = adapter();
        let mut registry = RemotePlayerRegistry::new();
        let loads = adapter.handle_inbound(
            ServerMsg::StateUpdate(StateUpdatePayload {
                id: PlayerId::from("B"),
                x: 1.0,
                z: 1.0,
                rotation: None,
            }),
            &mut registry,
        );
        assert!(loads.is_empty());
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(adapter.stats().events_received, 1);
    }

    #[test]
    fn throttled_move_is_held_until_allowed() {
        let mut adapter = SyncProtocolAdapter::new(Vec::new(), MoveThrottle::new(Some(1)));
        assert!(adapter.send_move(state()));

        let mut latest = state();
        latest.x = 3.0;
        assert!(!adapter.send_move(state()));
        assert!(!adapter.send_move(latest));
        assert_eq!(adapter.pending_move(), Some(&latest));
        assert_eq!(adapter.stats().moves_throttled, 2);

        // Quota still spent
        assert!(!adapter.flush_pending_move());
        assert_eq!(adapter.sink().len(), 1);
    }

    #[test]
    fn flush_without_pending_sends_nothing() {
        let mut adapter = adapter();
        assert!(!adapter.flush_pending_move());
        assert!(adapter.sink().is_empty());
    }

    #[test]
    fn init_clears_mirror_of_local_player() {
        let mut adapter = adapter();
        let mut registry = RemotePlayerRegistry::new();
        let early = [(
            PlayerId::from("A"),
            PlayerSnapshot {
                x: 0.0,
                z: 0.0,
                rotation: None,
                action: None,
            },
        )]
        .into_iter()
        .collect::<HashMap<_, _>>();

        let loads =
            adapter.handle_inbound(ServerMsg::StateUpdateAll(early.clone()), &mut registry);
        assert_eq!(loads.len(), 1);

        adapter.handle_inbound(
            ServerMsg::Init(InitPayload {
                id: PlayerId::from("A"),
                players: early,
            }),
            &mut registry,
        );

        // Load finishing after init is discarded
        let request = loads.into_iter().next().unwrap();
        let asset = crate::game::asset::LoadedAsset {
            scene: "Xbot.glb".to_string(),
            clips: Vec::new(),
        };
        assert!(!registry.complete_load(request, Ok(asset)));
        assert!(!registry.contains(&PlayerId::from("A")));
        assert_eq!(registry.pending_count(), 0);
    }
}
