//! Splatview Window Crate
//!
//! Interactive viewport shell: winit application lifecycle, the render
//! loop, orbit controls, camera framing, and the egui status overlay.

mod app;
mod camera;
mod controls;
mod egui_layer;
mod framing;
mod overlay;

pub use app::{ViewerConfig, ViewportError, run};
pub use camera::{Camera, CameraPose, Projection};
pub use controls::OrbitControls;
pub use framing::{DEFAULT_DISTANCE, FRAMING_FACTOR, frame_asset};
pub use overlay::{StatusOverlay, StatusPresenter, UiAction};

pub use egui;
