//! Bounding volumes and the canonical-frame normalization transform.

use crate::geometry::RawGeometry;
use glam::{Mat4, Vec3};

/// Axis-aligned bounding box. Center and extent are derived, not stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Fold positions into a bounding box. Empty input collapses to the
    /// origin so downstream math stays finite.
    pub fn from_positions<'a>(positions: impl Iterator<Item = &'a Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut count = 0;

        for pos in positions {
            min = min.min(*pos);
            max = max.max(*pos);
            count += 1;
        }

        if count == 0 {
            return Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        }

        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest axis extent.
    pub fn max_extent(&self) -> f32 {
        let e = self.extent();
        e.x.max(e.y).max(e.z)
    }

    /// The same box translated so its center sits at the origin.
    pub fn centered(&self) -> Self {
        let center = self.center();
        Self {
            min: self.min - center,
            max: self.max - center,
        }
    }

    /// The box under a normalization transform.
    pub fn transformed(&self, transform: &NormalizationTransform) -> Self {
        Self {
            min: transform.apply(self.min),
            max: transform.apply(self.max),
        }
    }
}

/// Uniform scale + translation mapping an asset into the canonical frame:
/// the largest dimension spans 2 viewing units centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationTransform {
    pub scale: f32,
    pub translation: Vec3,
}

impl NormalizationTransform {
    /// Derive the transform for a bounding volume. A degenerate volume
    /// (zero extent on every axis) keeps scale 1 instead of dividing by
    /// zero.
    pub fn for_bounds(bounds: &Aabb) -> Self {
        let max_extent = bounds.max_extent();
        let scale = if max_extent > 0.0 { 2.0 / max_extent } else { 1.0 };
        Self {
            scale,
            translation: -bounds.center() * scale,
        }
    }

    /// Apply scale first, then the already-scaled negative-center
    /// translation.
    pub fn apply(&self, point: Vec3) -> Vec3 {
        point * self.scale + self.translation
    }

    /// Model matrix equivalent (`T * S`).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

/// Prepare decoded geometry for display: guarantee colors, compute its
/// bounds, and derive the normalization transform.
pub fn normalize(mut geometry: RawGeometry) -> (RawGeometry, Aabb, NormalizationTransform) {
    geometry.ensure_colors();
    // Bounds come from positions only; colors never affect them.
    let bounds = Aabb::from_positions(geometry.positions.iter());
    let transform = NormalizationTransform::for_bounds(&bounds);
    (geometry, bounds, transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_geometry() -> RawGeometry {
        // Corners (-1,-1,-1)..(3,5,1): extent (4,6,2), center (1,2,0).
        RawGeometry::from_positions(vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(3.0, 5.0, 1.0),
            Vec3::new(1.0, 2.0, 0.0),
        ])
    }

    #[test]
    fn bounds_fold() {
        let (_, bounds, _) = normalize(box_geometry());
        assert_eq!(bounds.min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 5.0, 1.0));
        assert_eq!(bounds.center(), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(bounds.max_extent(), 6.0);
    }

    #[test]
    fn scale_and_translation_match_reference_scenario() {
        let (_, _, transform) = normalize(box_geometry());
        assert!((transform.scale - 2.0 / 6.0).abs() < 1e-6);

        // Scaled center lands exactly at the origin.
        let center = Vec3::new(1.0, 2.0, 0.0);
        let moved = transform.apply(center);
        assert!(moved.length() < 1e-6);
    }

    #[test]
    fn normalized_max_extent_is_two() {
        let (_, bounds, transform) = normalize(box_geometry());
        let world = bounds.transformed(&transform);
        assert!((world.max_extent() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_geometry_keeps_scale_one() {
        let point = Vec3::new(7.0, -3.0, 2.0);
        let geometry = RawGeometry::from_positions(vec![point, point, point]);
        let (_, bounds, transform) = normalize(geometry);

        assert_eq!(bounds.max_extent(), 0.0);
        assert_eq!(transform.scale, 1.0);
        assert!(transform.scale.is_finite());
        // The single point still centers at the origin.
        assert!(transform.apply(point).length() < 1e-6);
    }

    #[test]
    fn empty_geometry_is_finite() {
        let (_, bounds, transform) = normalize(RawGeometry::from_positions(vec![]));
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(transform.scale, 1.0);
    }

    #[test]
    fn normalize_synthesizes_colors() {
        let (geometry, _, _) = normalize(box_geometry());
        let colors = geometry.colors().unwrap();
        assert_eq!(colors.len(), 3);
        assert!(colors.iter().all(|c| *c == Vec3::ONE));
    }

    #[test]
    fn matrix_matches_pointwise_apply() {
        let (_, _, transform) = normalize(box_geometry());
        let m = transform.matrix();
        let p = Vec3::new(3.0, 5.0, 1.0);
        let via_matrix = m.transform_point3(p);
        let via_apply = transform.apply(p);
        assert!((via_matrix - via_apply).length() < 1e-6);
    }

    #[test]
    fn centered_box_keeps_extent() {
        let bounds = Aabb {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(3.0, 5.0, 1.0),
        };
        let centered = bounds.centered();
        assert_eq!(centered.center(), Vec3::ZERO);
        assert_eq!(centered.max_extent(), 6.0);
    }
}
