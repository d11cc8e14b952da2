//! Camera framing.

use crate::camera::CameraPose;
use glam::Vec3;
use splatview_data::Aabb;

/// Camera distance used when no asset is displayed.
pub const DEFAULT_DISTANCE: f32 = 5.0;

/// Framing distance as a multiple of the largest bounding-box extent.
pub const FRAMING_FACTOR: f32 = 1.5;

/// Position the camera to frame a bounding volume, or revert to the fixed
/// default view when there is none.
///
/// The target is the volume's center and the distance 1.5× its largest
/// extent, placed along the camera's current forward axis so user orbiting
/// survives a reframe. Only position/target change; projection is never
/// touched. Calling this twice with the same inputs yields an identical
/// pose.
pub fn frame_asset(current: &CameraPose, bounds: Option<&Aabb>) -> CameraPose {
    match bounds {
        Some(bounds) => {
            let target = bounds.center();
            let extent = bounds.max_extent();
            let distance = if extent > 0.0 {
                extent * FRAMING_FACTOR
            } else {
                DEFAULT_DISTANCE
            };
            let dir = CameraPose::forward_dir(current.yaw, current.pitch);
            CameraPose {
                center: target,
                position: target - dir * distance,
                yaw: current.yaw,
                pitch: current.pitch,
            }
        }
        None => CameraPose {
            center: Vec3::ZERO,
            position: Vec3::new(0.0, 0.0, DEFAULT_DISTANCE),
            yaw: 0.0,
            pitch: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_pose() -> CameraPose {
        frame_asset(&CameraPose::new(Vec3::ZERO, Vec3::ZERO), None)
    }

    #[test]
    fn no_asset_reverts_to_default_view() {
        let pose = fresh_pose();
        assert_eq!(pose.center, Vec3::ZERO);
        assert_eq!(pose.position, Vec3::new(0.0, 0.0, DEFAULT_DISTANCE));
    }

    #[test]
    fn frames_centered_bounds_at_reference_distance() {
        // Centered pre-scale volume for corners (-1,-1,-1)..(3,5,1):
        // extent (4,6,2), so the framing distance is 6 * 1.5 = 9.
        let bounds = Aabb {
            min: Vec3::new(-2.0, -3.0, -1.0),
            max: Vec3::new(2.0, 3.0, 1.0),
        };
        let pose = frame_asset(&fresh_pose(), Some(&bounds));
        assert_eq!(pose.center, Vec3::ZERO);
        assert!((pose.position - Vec3::new(0.0, 0.0, 9.0)).length() < 1e-5);
        assert!((pose.distance() - 9.0).abs() < 1e-5);
    }

    #[test]
    fn targets_offcenter_bounds() {
        let bounds = Aabb {
            min: Vec3::new(9.0, -1.0, -1.0),
            max: Vec3::new(11.0, 1.0, 1.0),
        };
        let pose = frame_asset(&fresh_pose(), Some(&bounds));
        assert_eq!(pose.center, Vec3::new(10.0, 0.0, 0.0));
        assert!((pose.distance() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn framing_is_idempotent() {
        let bounds = Aabb {
            min: Vec3::new(-2.0, -3.0, -1.0),
            max: Vec3::new(2.0, 3.0, 1.0),
        };
        let mut current = fresh_pose();
        current.orbit_by(0.7, -0.3);

        let once = frame_asset(&current, Some(&bounds));
        let twice = frame_asset(&once, Some(&bounds));
        assert_eq!(once, twice);
    }

    #[test]
    fn degenerate_bounds_use_default_distance() {
        let bounds = Aabb {
            min: Vec3::new(1.0, 1.0, 1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let pose = frame_asset(&fresh_pose(), Some(&bounds));
        assert_eq!(pose.center, Vec3::ONE);
        assert!((pose.distance() - DEFAULT_DISTANCE).abs() < 1e-5);
    }

    #[test]
    fn framing_respects_current_forward_axis() {
        let bounds = Aabb {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let mut current = fresh_pose();
        current.orbit_by(std::f32::consts::FRAC_PI_2, 0.0);

        let pose = frame_asset(&current, Some(&bounds));
        assert_eq!(pose.yaw, current.yaw);
        assert_eq!(pose.pitch, current.pitch);
        assert!((pose.distance() - 3.0).abs() < 1e-4);
        // Not on the +Z axis anymore.
        assert!(pose.position.z.abs() < 1.0);
    }
}
