use glam::{Mat4, Quat, Vec2, Vec3};

/// Camera pose: position and the center it looks at / orbits around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Center/focus point that the camera orbits around.
    pub center: Vec3,
    /// Camera position in world space.
    pub position: Vec3,
    /// Yaw angle in radians (rotation around Y axis).
    pub yaw: f32,
    /// Pitch angle in radians (rotation around X axis).
    pub pitch: f32,
}

impl CameraPose {
    /// Create a pose at the given position looking at the center.
    pub fn new(position: Vec3, center: Vec3) -> Self {
        let forward = (center - position).normalize_or_zero();
        let yaw = forward.x.atan2(-forward.z);
        let pitch = forward
            .y
            .asin()
            .clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
        Self {
            center,
            position,
            yaw,
            pitch,
        }
    }

    /// Unit direction the camera faces for the given angles.
    pub fn forward_dir(yaw: f32, pitch: f32) -> Vec3 {
        Quat::from_euler(glam::EulerRot::YXZ, yaw, pitch, 0.0) * -Vec3::Z
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.center).length()
    }

    /// Orbit around the center by angle deltas in radians.
    pub fn orbit_by(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw -= yaw_delta;
        self.pitch = (self.pitch - pitch_delta).clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );

        let dir = Self::forward_dir(self.yaw, self.pitch);
        let distance = self.distance();
        self.position = self.center - dir * distance;
    }

    /// Orbit from a pointer delta.
    pub fn orbit(&mut self, delta: Vec2, sensitivity: f32) {
        self.orbit_by(delta.x * sensitivity, delta.y * sensitivity);
    }

    /// Pan the camera and center together.
    pub fn pan(&mut self, delta: Vec2, sensitivity: f32) {
        let right = Quat::from_euler(glam::EulerRot::YXZ, self.yaw, 0.0, 0.0) * Vec3::X;
        let up = Vec3::Y;
        let distance = self.distance();
        let pan =
            (-delta.x * sensitivity * distance) * right + (delta.y * sensitivity * distance) * up;
        self.center += pan;
        self.position += pan;
    }

    /// Move toward/away from the center, clamped to [min, max] distance.
    pub fn dolly(&mut self, amount: f32, min: f32, max: f32) {
        let direction = (self.position - self.center).normalize_or_zero();
        let new_distance = (self.distance() + amount).clamp(min, max);
        self.position = self.center + direction * new_distance;
    }
}

/// Camera that manages a pose and derives the view matrix.
pub struct Camera {
    pose: CameraPose,
}

impl Camera {
    pub fn new(position: Vec3, center: Vec3) -> Self {
        Self {
            pose: CameraPose::new(position, center),
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn apply_pose(&mut self, pose: &CameraPose) {
        self.pose = *pose;
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn view_matrix(&self) -> Mat4 {
        let forward = (self.pose.center - self.pose.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        Mat4::look_to_rh(self.pose.position, forward, up)
    }
}

/// Projection matrix configuration. Resizing touches the aspect ratio
/// only; it never reads or writes camera state.
pub struct Projection {
    width: u32,
    height: u32,
    fov: f32,
    near: f32,
    far: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fov: f32, near: f32, far: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            fov,
            near,
            far,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect(), self.near, self.far)
    }

    /// Update the drawable dimensions. Safe to call with identical values.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }
}
