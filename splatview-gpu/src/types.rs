//! GPU-visible data layouts.

use glam::{Mat4, Vec3};

/// One point splat as the shader consumes it.
/// Matches the layout in `splat_vertex.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct SplatInstance {
    /// xyz position with the world-unit point size packed into w.
    pub position_size: [f32; 4],
    /// rgb color (linear 0-1); w is unused.
    pub color: [f32; 4],
}

impl SplatInstance {
    pub fn new(position: Vec3, size: f32, color: Vec3) -> Self {
        Self {
            position_size: [position.x, position.y, position.z, size],
            color: [color.x, color.y, color.z, 1.0],
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_slice(&self.position_size[..3])
    }
}

/// Shared scene uniform layout between host and shader. The model matrix
/// carries the normalization transform so the asset's placement, not its
/// vertex data, maps into the canonical frame.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_matrix: [[f32; 4]; 4],
    pub proj_matrix: [[f32; 4]; 4],
    pub model_matrix: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub _padding: f32,
}

impl SceneUniforms {
    pub fn new(view: Mat4, proj: Mat4, model: Mat4, eye: Vec3) -> Self {
        Self {
            view_matrix: view.to_cols_array_2d(),
            proj_matrix: proj.to_cols_array_2d(),
            model_matrix: model.to_cols_array_2d(),
            view_pos: [eye.x, eye.y, eye.z],
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splat_instance_packing() {
        let splat = SplatInstance::new(Vec3::new(1.0, 2.0, 3.0), 0.02, Vec3::ONE);
        assert_eq!(splat.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(splat.position_size[3], 0.02);
        assert_eq!(std::mem::size_of::<SplatInstance>(), 32);
    }

    #[test]
    fn scene_uniforms_layout() {
        // Three mat4s plus a padded vec3, matching the WGSL struct.
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 3 * 64 + 16);
    }
}
