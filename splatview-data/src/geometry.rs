//! CPU-side point geometry.

use glam::Vec3;

/// Decoded point-cloud geometry: positions plus optional per-point colors.
///
/// Colors are linear RGB in the 0-1 range. Geometry without colors is not
/// displayable until [`RawGeometry::ensure_colors`] has synthesized the
/// uniform white array.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGeometry {
    pub positions: Vec<Vec3>,
    pub colors: Option<Vec<Vec3>>,
}

impl RawGeometry {
    /// Create geometry from positions alone (colors synthesized later).
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            colors: None,
        }
    }

    /// Create geometry with per-point colors. The two sequences are parallel.
    pub fn with_colors(positions: Vec<Vec3>, colors: Vec<Vec3>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self {
            positions,
            colors: Some(colors),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Synthesize a uniform white color per point if colors are absent.
    pub fn ensure_colors(&mut self) {
        if self.colors.is_none() {
            self.colors = Some(vec![Vec3::ONE; self.positions.len()]);
        }
    }

    /// Colors slice, valid only after [`ensure_colors`](Self::ensure_colors).
    pub fn colors(&self) -> Option<&[Vec3]> {
        self.colors.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_colors_synthesizes_white() {
        let mut geometry = RawGeometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert!(geometry.colors.is_none());

        geometry.ensure_colors();
        let colors = geometry.colors().unwrap();
        assert_eq!(colors.len(), 3);
        assert!(colors.iter().all(|c| *c == Vec3::ONE));
    }

    #[test]
    fn ensure_colors_keeps_existing() {
        let mut geometry =
            RawGeometry::with_colors(vec![Vec3::ZERO], vec![Vec3::new(0.2, 0.4, 0.6)]);
        geometry.ensure_colors();
        assert_eq!(geometry.colors().unwrap()[0], Vec3::new(0.2, 0.4, 0.6));
    }
}
