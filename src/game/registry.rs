//! Remote avatar registry: create, update and remove mirrored players

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info, warn};

use super::animation::{AnimationMixer, AnimationName, AnimationStateMachine};
use super::asset::{AssetError, LoadedAsset};
use super::{PlayerId, Pose2D};

/// Fraction of the remaining gap closed per tick
pub const INTERPOLATION_FACTOR: f32 = 0.1;
/// Distance above which a remote avatar counts as moving
pub const MOVING_THRESHOLD: f32 = 0.01;
/// Distance above which a moving remote avatar counts as running
pub const RUN_THRESHOLD: f32 = 0.5;

/// Pose for a remote avatar given how far it still has to travel
pub fn select_action(distance_moved: f32) -> AnimationName {
    if distance_moved > RUN_THRESHOLD {
        AnimationName::Run
    } else if distance_moved > MOVING_THRESHOLD {
        AnimationName::Walk
    } else {
        AnimationName::Idle
    }
}

/// An asset load the caller must start for a newly seen player
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub id: PlayerId,
    /// Pose of the snapshot that triggered the load
    pub spawn: Pose2D,
}

/// What `apply_snapshot` did with a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    /// Unknown id: a load must be started
    LoadStarted(LoadRequest),
    /// A load for this id is already in flight, snapshot dropped
    SkippedPending,
    /// Existing entry's target pose updated
    Updated,
}

/// Mirror of one remote player
#[derive(Debug, Clone)]
pub struct RemoteAvatarEntry {
    pub id: PlayerId,
    pub scene: String,
    target: Pose2D,
    rendered: Pose2D,
    animation: AnimationStateMachine,
}

impl RemoteAvatarEntry {
    fn new(id: PlayerId, asset: &LoadedAsset, spawn: Pose2D) -> Self {
        Self {
            id,
            scene: asset.scene.clone(),
            target: spawn,
            rendered: spawn,
            animation: AnimationStateMachine::new(AnimationMixer::from_clips(&asset.clips)),
        }
    }

    /// Latest pose reported by the relay
    pub fn target(&self) -> Pose2D {
        self.target
    }

    /// Pose currently drawn, lagging the target
    pub fn rendered(&self) -> Pose2D {
        self.rendered
    }

    pub fn action(&self) -> AnimationName {
        self.animation.current()
    }

    pub fn animation(&self) -> &AnimationStateMachine {
        &self.animation
    }

    fn set_target(&mut self, pose: Pose2D) {
        self.target = pose;
    }

    /// One interpolation step toward the target, then pose selection and
    /// mixer advance. Yaw is interpolated on raw values with no wrapping.
    fn reconcile(&mut self, dt: f32) -> AnimationName {
        let distance_moved = self.rendered.distance_to(&self.target);

        self.rendered.x += (self.target.x - self.rendered.x) * INTERPOLATION_FACTOR;
        self.rendered.z += (self.target.z - self.rendered.z) * INTERPOLATION_FACTOR;
        self.rendered.rotation_y +=
            (self.target.rotation_y - self.rendered.rotation_y) * INTERPOLATION_FACTOR;

        let action = select_action(distance_moved);
        self.animation.request(action);
        self.animation.update(dt);
        action
    }
}

/// Owns every remote avatar plus the set of in-flight loads.
///
/// An id is never both pending and materialized.
#[derive(Debug, Default)]
pub struct RemotePlayerRegistry {
    entries: HashMap<PlayerId, RemoteAvatarEntry>,
    pending: HashSet<PlayerId>,
    /// Pending loads whose player left before the load finished
    abandoned: HashSet<PlayerId>,
}

impl RemotePlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PlayerId) -> Option<&RemoteAvatarEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_pending(&self, id: &PlayerId) -> bool {
        self.pending.contains(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RemoteAvatarEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Apply one reported pose. Unknown ids start a load instead.
    pub fn apply_snapshot(&mut self, id: &PlayerId, pose: Pose2D) -> SnapshotOutcome {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.set_target(pose);
            return SnapshotOutcome::Updated;
        }

        if self.pending.contains(id) {
            if self.abandoned.remove(id) {
                debug!(player_id = %id, "Player reappeared while loading, keeping load");
            }
            warn!(player_id = %id, "Skipping creation, avatar already loading");
            return SnapshotOutcome::SkippedPending;
        }

        self.pending.insert(id.clone());
        debug!(player_id = %id, "Loading avatar for new player");
        SnapshotOutcome::LoadStarted(LoadRequest {
            id: id.clone(),
            spawn: pose,
        })
    }

    /// Fast path for `state_update`: only touches existing entries
    pub fn update_target(&mut self, id: &PlayerId, pose: Pose2D) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.set_target(pose);
                true
            }
            None => false,
        }
    }

    /// Finish a load started by `apply_snapshot`. Returns true when an
    /// entry was created.
    pub fn complete_load(
        &mut self,
        request: LoadRequest,
        result: Result<LoadedAsset, AssetError>,
    ) -> bool {
        let LoadRequest { id, spawn } = request;

        if !self.pending.remove(&id) {
            debug!(player_id = %id, "Ignoring load with no pending marker");
            return false;
        }

        if self.abandoned.remove(&id) {
            if let Err(e) = result {
                error!(player_id = %id, error = %e, "Failed to load avatar for player");
            }
            info!(player_id = %id, "Discarding avatar for player that already left");
            return false;
        }

        match result {
            Ok(asset) => {
                let entry = RemoteAvatarEntry::new(id.clone(), &asset, spawn);
                self.entries.insert(id.clone(), entry);
                info!(
                    player_id = %id,
                    x = spawn.x,
                    z = spawn.z,
                    "Remote player created"
                );
                true
            }
            Err(e) => {
                error!(player_id = %id, error = %e, "Failed to load avatar for player");
                false
            }
        }
    }

    /// Drop a player. A still-loading player is marked so its load is
    /// discarded on completion. Returns true if an entry was removed.
    pub fn remove_entry(&mut self, id: &PlayerId) -> bool {
        if self.entries.remove(id).is_some() {
            info!(player_id = %id, "Remote player removed");
            return true;
        }

        if self.pending.contains(id) && self.abandoned.insert(id.clone()) {
            debug!(player_id = %id, "Player left while loading");
        }
        false
    }

    /// Make the registry match a full roster. The local player is skipped.
    pub fn reconcile_roster(
        &mut self,
        roster: &HashMap<PlayerId, Pose2D>,
        local_id: Option<&PlayerId>,
    ) -> Vec<LoadRequest> {
        let mut loads = Vec::new();

        for (id, pose) in roster {
            if Some(id) == local_id {
                continue;
            }
            if let SnapshotOutcome::LoadStarted(request) = self.apply_snapshot(id, *pose) {
                loads.push(request);
            }
        }

        let stale: Vec<PlayerId> = self
            .entries
            .keys()
            .chain(self.pending.iter())
            .filter(|id| !roster.contains_key(*id))
            .cloned()
            .collect();

        for id in stale {
            self.remove_entry(&id);
        }

        loads
    }

    /// Step every remote avatar toward its target and advance its mixer
    pub fn reconcile_tick(&mut self, dt: f32) {
        for entry in self.entries.values_mut() {
            entry.reconcile(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::asset::AnimationClip;

    fn asset() -> LoadedAsset {
        LoadedAsset {
            scene: "Xbot.glb".to_string(),
            clips: vec![AnimationClip {
                name: "idle".to_string(),
                duration: 1.0,
            }],
        }
    }

    fn spawn_entry(registry: &mut RemotePlayerRegistry, id: &str, pose: Pose2D) {
        let id = PlayerId::from(id);
        match registry.apply_snapshot(&id, pose) {
            SnapshotOutcome::LoadStarted(request) => {
                assert!(registry.complete_load(request, Ok(asset())));
            }
            other => panic!("expected load, got {:?}", other),
        }
    }

    #[test]
    fn action_thresholds_are_exclusive() {
        assert_eq!(select_action(0.005), AnimationName::Idle);
        assert_eq!(select_action(0.01), AnimationName::Idle);
        assert_eq!(select_action(0.2), AnimationName::Walk);
        assert_eq!(select_action(0.5), AnimationName::Walk);
        assert_eq!(select_action(0.8), AnimationName::Run);
    }

    #[test]
    fn second_snapshot_while_pending_is_dropped() {
        let mut registry = RemotePlayerRegistry::new();
        let id = PlayerId::from("B");

        let first = registry.apply_snapshot(&id, Pose2D::new(1.0, 1.0, 0.0));
        let second = registry.apply_snapshot(&id, Pose2D::new(9.0, 9.0, 0.0));
        assert!(matches!(first, SnapshotOutcome::LoadStarted(_)));
        assert_eq!(second, SnapshotOutcome::SkippedPending);

        let SnapshotOutcome::LoadStarted(request) = first else {
            unreachable!()
        };
        assert!(registry.complete_load(request, Ok(asset())));
        // Spawn pose of the first load wins
        assert_eq!(registry.get(&id).unwrap().target(), Pose2D::new(1.0, 1.0, 0.0));
        assert!(!registry.is_pending(&id));
    }

    #[test]
    fn failed_load_allows_retry() {
        let mut registry = RemotePlayerRegistry::new();
        let id = PlayerId::from("B");

        let SnapshotOutcome::LoadStarted(request) = registry.apply_snapshot(&id, Pose2D::default())
        else {
            panic!("expected load")
        };
        let failure = AssetError::MissingScene;
        assert!(!registry.complete_load(request, Err(failure)));
        assert!(!registry.is_pending(&id));
        assert!(!registry.contains(&id));

        assert!(matches!(
            registry.apply_snapshot(&id, Pose2D::default()),
            SnapshotOutcome::LoadStarted(_)
        ));
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut registry = RemotePlayerRegistry::new();
        assert!(!registry.remove_entry(&PlayerId::from("ghost")));
        assert!(registry.is_empty());
    }

    #[test]
    fn removal_during_load_discards_entry() {
        let mut registry = RemotePlayerRegistry::new();
        let id = PlayerId::from("B");
        let SnapshotOutcome::LoadStarted(request) = registry.apply_snapshot(&id, Pose2D::default())
        else {
            panic!("expected load")
        };

        registry.remove_entry(&id);
        assert!(!registry.complete_load(request, Ok(asset())));
        assert!(!registry.contains(&id));
        assert!(!registry.is_pending(&id));
    }

    #[test]
    fn snapshot_after_removal_revives_pending_load() {
        let mut registry = RemotePlayerRegistry::new();
        let id = PlayerId::from("B");
        let SnapshotOutcome::LoadStarted(request) = registry.apply_snapshot(&id, Pose2D::default())
        else {
            panic!("expected load")
        };

        registry.remove_entry(&id);
        assert_eq!(
            registry.apply_snapshot(&id, Pose2D::default()),
            SnapshotOutcome::SkippedPending
        );
        assert!(registry.complete_load(request, Ok(asset())));
        assert!(registry.contains(&id));
    }

    #[test]
    fn fast_path_ignores_unknown_ids() {
        let mut registry = RemotePlayerRegistry::new();
        assert!(!registry.update_target(&PlayerId::from("B"), Pose2D::default()));
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn interpolation_converges_without_overshoot() {
        let mut registry = RemotePlayerRegistry::new();
        spawn_entry(&mut registry, "B", Pose2D::default());
        let id = PlayerId::from("B");
        let target = Pose2D::new(10.0, -4.0, 3.0);
        registry.apply_snapshot(&id, target);

        let mut previous = registry.get(&id).unwrap().rendered();
        for _ in 0..200 {
            registry.reconcile_tick(1.0 / 60.0);
            let rendered = registry.get(&id).unwrap().rendered();
            assert!(rendered.x >= previous.x && rendered.x <= target.x);
            assert!(rendered.z <= previous.z && rendered.z >= target.z);
            assert!(rendered.rotation_y >= previous.rotation_y);
            assert!(rendered.rotation_y <= target.rotation_y);
            previous = rendered;
        }

        assert!(previous.distance_to(&target) < 1e-3);
        assert!((previous.rotation_y - target.rotation_y).abs() < 1e-3);
    }

    #[test]
    fn first_step_moves_ten_percent() {
        let mut registry = RemotePlayerRegistry::new();
        spawn_entry(&mut registry, "B", Pose2D::default());
        let id = PlayerId::from("B");
        registry.apply_snapshot(&id, Pose2D::new(10.0, 0.0, 1.0));

        registry.reconcile_tick(0.016);
        let entry = registry.get(&id).unwrap();
        assert!((entry.rendered().x - 1.0).abs() < 1e-6);
        assert!((entry.rendered().rotation_y - 0.1).abs() < 1e-6);
        assert_eq!(entry.action(), AnimationName::Run);
    }

    #[test]
    fn motion_decays_to_idle() {
        let mut registry = RemotePlayerRegistry::new();
        spawn_entry(&mut registry, "B", Pose2D::default());
        let id = PlayerId::from("B");
        registry.apply_snapshot(&id, Pose2D::new(0.3, 0.0, 0.0));

        registry.reconcile_tick(0.016);
        assert_eq!(registry.get(&id).unwrap().action(), AnimationName::Walk);

        for _ in 0..100 {
            registry.reconcile_tick(0.016);
        }
        assert_eq!(registry.get(&id).unwrap().action(), AnimationName::Idle);
    }

    #[test]
    fn roster_reconcile_is_idempotent() {
        let mut registry = RemotePlayerRegistry::new();
        spawn_entry(&mut registry, "B", Pose2D::default());
        spawn_entry(&mut registry, "C", Pose2D::default());

        let roster: HashMap<PlayerId, Pose2D> = [
            (PlayerId::from("B"), Pose2D::new(1.0, 2.0, 0.0)),
            (PlayerId::from("A"), Pose2D::default()),
        ]
        .into_iter()
        .collect();
        let local = PlayerId::from("A");

        let loads = registry.reconcile_roster(&roster, Some(&local));
        assert!(loads.is_empty());
        let mut first: Vec<_> = registry.entries().map(|e| e.id.clone()).collect();
        first.sort();

        let loads = registry.reconcile_roster(&roster, Some(&local));
        assert!(loads.is_empty());
        let mut second: Vec<_> = registry.entries().map(|e| e.id.clone()).collect();
        second.sort();

        assert_eq!(first, vec![PlayerId::from("B")]);
        assert_eq!(first, second);
        assert!(!registry.is_pending(&local));
    }

    #[test]
    fn abandoned_failed_load_is_cleared() {
        let mut registry = RemotePlayerRegistry::new();
        let id = PlayerId::from("B");
        let SnapshotOutcome::LoadStarted(request) = registry.apply_snapshot(&id, Pose2D::default())
        else {
            panic!("expected load")
        };

        registry.remove_entry(&id);
        assert!(!registry.complete_load(request, Err(AssetError::MissingScene)));
        assert!(!registry.is_pending(&id));
        assert!(matches!(
            registry.apply_snapshot(&id, Pose2D::default()),
            SnapshotOutcome::LoadStarted(_)
        ));
    }

    #[test]
    fn yaw_is_interpolated_without_wrapping() {
        let mut registry = RemotePlayerRegistry::new();
        spawn_entry(&mut registry, "B", Pose2D::new(0.0, 0.0, 0.1));
        let id = PlayerId::from("B");
        let target = std::f32::consts::TAU - 0.1;
        registry.apply_snapshot(&id, Pose2D::new(0.0, 0.0, target));

        registry.reconcile_tick(0.016);
        let yaw = registry.get(&id).unwrap().rendered().rotation_y;
        // Long way round: 0.1 + (2π - 0.2) * 0.1
        assert!((yaw - (0.1 + (target - 0.1) * INTERPOLATION_FACTOR)).abs() < 1e-5);
        assert!((yaw - 0.708).abs() < 1e-3);
    }
}
