//! Wrapper around wgpu::Surface with configuration management.

use wgpu::{Surface, SurfaceConfiguration, SurfaceTexture, TextureFormat};

pub struct SurfaceWrapper {
    surface: Surface<'static>,
    config: SurfaceConfiguration,
}

impl SurfaceWrapper {
    pub fn new(surface: Surface<'static>, config: SurfaceConfiguration) -> Self {
        Self { surface, config }
    }

    pub fn format(&self) -> TextureFormat {
        self.config.format
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Resize the drawable surface. Identical dimensions are a no-op so
    /// repeated resize events cause no surface churn.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.config.width && height == self.config.height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config);
    }

    /// Re-apply the current configuration (surface Lost/Outdated recovery).
    pub fn reconfigure(&self, device: &wgpu::Device) {
        self.surface.configure(device, &self.config);
    }

    pub fn get_current_texture(&self) -> Result<SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}
