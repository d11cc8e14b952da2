//! Orbit/pan/zoom input handling with damping and auto-rotate.
//!
//! Pointer input accumulates deltas; `update` applies a damped share each
//! frame so motion eases out instead of stopping dead. The total applied
//! motion still equals the raw input (the residue decays by the same
//! factor it is applied with).

use crate::camera::CameraPose;
use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Full auto-rotate orbit every 30 seconds.
const AUTO_ROTATE_SPEED: f32 = std::f32::consts::TAU / 30.0;

const MOTION_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
}

/// Mouse-driven orbit controller for a [`CameraPose`].
#[derive(Debug)]
pub struct OrbitControls {
    rotate_button: MouseButton,
    pan_button: MouseButton,
    drag: Option<DragMode>,
    last_mouse: Option<Vec2>,
    orbit_delta: Vec2,
    pan_delta: Vec2,
    zoom_delta: f32,
    rotation_sensitivity: f32,
    pan_sensitivity: f32,
    zoom_sensitivity: f32,
    damping: f32,
    auto_rotate: bool,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitControls {
    pub fn new() -> Self {
        Self {
            rotate_button: MouseButton::Left,
            pan_button: MouseButton::Right,
            drag: None,
            last_mouse: None,
            orbit_delta: Vec2::ZERO,
            pan_delta: Vec2::ZERO,
            zoom_delta: 0.0,
            rotation_sensitivity: 0.005,
            pan_sensitivity: 0.0025,
            zoom_sensitivity: 0.2,
            damping: 0.05,
            auto_rotate: false,
            min_distance: 0.5,
            max_distance: 100.0,
        }
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        self.auto_rotate
    }

    /// Record an input event. Returns true if the event was consumed.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    let mode = if *button == self.rotate_button {
                        Some(DragMode::Rotate)
                    } else if *button == self.pan_button {
                        Some(DragMode::Pan)
                    } else {
                        None
                    };
                    if let Some(mode) = mode {
                        self.drag = Some(mode);
                        return true;
                    }
                    false
                }
                ElementState::Released => {
                    if self.drag.is_some()
                        && (*button == self.rotate_button || *button == self.pan_button)
                    {
                        self.drag = None;
                        return true;
                    }
                    false
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let current = Vec2::new(position.x as f32, position.y as f32);
                if let (Some(last), Some(mode)) = (self.last_mouse, self.drag) {
                    let delta = current - last;
                    match mode {
                        DragMode::Rotate => self.orbit_delta += delta,
                        DragMode::Pan => self.pan_delta += delta,
                    }
                }
                self.last_mouse = Some(current);
                self.drag.is_some()
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.zoom_delta += amount;
                true
            }
            _ => false,
        }
    }

    /// Apply pending damped motion and the auto-rotate increment.
    pub fn update(&mut self, dt: f32, pose: &mut CameraPose) {
        if self.auto_rotate {
            pose.orbit_by(AUTO_ROTATE_SPEED * dt, 0.0);
        }

        let ease = self.damping;
        if self.orbit_delta.length() > MOTION_EPSILON {
            pose.orbit(self.orbit_delta * ease, self.rotation_sensitivity);
        }
        if self.pan_delta.length() > MOTION_EPSILON {
            pose.pan(self.pan_delta * ease, self.pan_sensitivity);
        }
        if self.zoom_delta.abs() > MOTION_EPSILON {
            pose.dolly(
                -self.zoom_delta * ease * self.zoom_sensitivity,
                self.min_distance,
                self.max_distance,
            );
        }

        let decay = 1.0 - self.damping;
        self.orbit_delta *= decay;
        self.pan_delta *= decay;
        self.zoom_delta *= decay;
        if self.orbit_delta.length() <= MOTION_EPSILON {
            self.orbit_delta = Vec2::ZERO;
        }
        if self.pan_delta.length() <= MOTION_EPSILON {
            self.pan_delta = Vec2::ZERO;
        }
        if self.zoom_delta.abs() <= MOTION_EPSILON {
            self.zoom_delta = 0.0;
        }
    }

    /// Drop residual motion so a framing reset is not immediately undone.
    pub fn on_reset(&mut self) {
        self.drag = None;
        self.orbit_delta = Vec2::ZERO;
        self.pan_delta = Vec2::ZERO;
        self.zoom_delta = 0.0;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}
