//! Per-frame view handed to the renderer

use tracing::trace;

use crate::game::{AnimationName, PlayerId, Pose2D};

/// Camera offset behind the local avatar, in the avatar's local frame
const CAMERA_OFFSET: [f32; 3] = [0.0, 2.0, -5.0];
/// Camera aims this far above the avatar's feet
const CAMERA_LOOK_HEIGHT: f32 = 1.0;

/// One avatar as it should be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarView {
    /// None for the local avatar
    pub id: Option<PlayerId>,
    pub scene: String,
    pub pose: Pose2D,
    pub action: AnimationName,
}

/// Third-person camera placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
}

impl CameraView {
    /// Chase camera for an avatar pose
    pub fn follow(pose: &Pose2D) -> Self {
        let (sin, cos) = pose.rotation_y.sin_cos();
        let [ox, oy, oz] = CAMERA_OFFSET;
        let dx = ox * cos + oz * sin;
        let dz = -ox * sin + oz * cos;
        Self {
            position: [pose.x + dx, oy, pose.z + dz],
            look_at: [pose.x, CAMERA_LOOK_HEIGHT, pose.z],
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub number: u64,
    pub timestamp_ms: u64,
    pub local: Option<AvatarView>,
    pub remotes: Vec<AvatarView>,
    pub camera: Option<CameraView>,
}

/// Render-frame submission, called once per tick after state settles
pub trait FrameSink {
    fn submit(&mut self, frame: &Frame);
}

/// Headless renderer: logs every frame at trace level
#[derive(Debug, Default)]
pub struct TracingFrameSink;

impl FrameSink for TracingFrameSink {
    fn submit(&mut self, frame: &Frame) {
        trace!(
            frame = frame.number,
            local = ?frame.local.as_ref().map(|avatar| avatar.pose),
            remotes = frame.remotes.len(),
            "Frame submitted"
        );
    }
}

impl FrameSink for Vec<Frame> {
    fn submit(&mut self, frame: &Frame) {
        self.push(frame.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn camera_sits_behind_avatar() {
        let camera = CameraView::follow(&Pose2D::new(1.0, 1.0, 0.0));
        assert_eq!(camera.position, [1.0, 2.0, -4.0]);
        assert_eq!(camera.look_at, [1.0, 1.0, 1.0]);

        // Facing +X puts the camera on the -X side
        let camera = CameraView::follow(&Pose2D::new(0.0, 0.0, FRAC_PI_2));
        assert!((camera.position[0] + 5.0).abs() < 1e-5);
        assert!(camera.position[2].abs() < 1e-5);
    }
}
