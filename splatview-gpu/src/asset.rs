//! Point-splat pipeline and the GPU-resident displayed asset.

use crate::types::{SceneUniforms, SplatInstance};
use crate::{Renderer, RendererError};
use glam::{Mat4, Vec3};
use splatview_data::{Aabb, NormalizationTransform, RawGeometry};
use tracing::debug;
use wgpu::util::DeviceExt;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Viewport background, matching the viewer's black backdrop.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Render pipeline for uniformly colored round point splats (storage-buffer
/// vertex pulling, one triangle per point).
pub struct SplatPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl SplatPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let vertex_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("splat_vs"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/splat_vertex.wgsl").into()),
        });
        let fragment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("splat_fs"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/splat_fragment.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Splat Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(
                            std::num::NonZeroU64::new(std::mem::size_of::<SceneUniforms>() as u64)
                                .unwrap(),
                        ),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Splat Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Splat Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Upload normalized geometry as the displayed asset.
    pub fn upload(
        &self,
        renderer: &Renderer,
        geometry: &RawGeometry,
        bounds: Aabb,
        transform: NormalizationTransform,
        point_size: f32,
    ) -> Result<SplatAsset, RendererError> {
        let device = renderer.device();
        let colors = geometry.colors();

        let instances: Vec<SplatInstance> = geometry
            .positions
            .iter()
            .enumerate()
            .map(|(i, pos)| {
                let color = colors.map(|c| c[i]).unwrap_or(Vec3::ONE);
                SplatInstance::new(*pos, point_size, color)
            })
            .collect();

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Splat Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SceneUniforms::new(
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                transform.matrix(),
                Vec3::ZERO,
            )]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Splat Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: instance_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        debug!("uploaded {} splats", instances.len());

        Ok(SplatAsset {
            instance_buffer,
            uniform_buffer,
            bind_group,
            point_count: instances.len() as u32,
            raw_bounds: bounds,
            transform,
        })
    }

    /// Record one draw of the asset, clearing color and depth.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        asset: &SplatAsset,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Splat Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &asset.bind_group, &[]);
        // 3 vertices per point (triangle trimmed to a disc in the fragment stage)
        render_pass.draw(0..asset.point_count * 3, 0..1);
    }

    /// Clear-only pass for frames with no displayed asset.
    pub fn clear(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
    }
}

/// The one displayed asset: GPU buffers plus the bounds and transform it
/// was built from. Replacing it goes through [`SplatAsset::dispose`] so
/// buffer memory is released before the new asset attaches.
pub struct SplatAsset {
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    point_count: u32,
    raw_bounds: Aabb,
    transform: NormalizationTransform,
}

impl SplatAsset {
    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    pub fn transform(&self) -> &NormalizationTransform {
        &self.transform
    }

    /// Bounds of the displayed asset in world space (post-transform).
    pub fn world_bounds(&self) -> Aabb {
        self.raw_bounds.transformed(&self.transform)
    }

    /// Origin-centered pre-scale bounds, used to frame a fresh load.
    pub fn framing_bounds(&self) -> Aabb {
        self.raw_bounds.centered()
    }

    /// Push current camera matrices; the model matrix rides along.
    pub fn update_camera(&self, queue: &wgpu::Queue, view: Mat4, proj: Mat4, eye: Vec3) {
        let uniforms = SceneUniforms::new(view, proj, self.transform.matrix(), eye);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Explicitly release GPU memory. Dropping would eventually reclaim
    /// it, but asset swaps and teardown must not wait for that.
    pub fn dispose(self) {
        self.instance_buffer.destroy();
        self.uniform_buffer.destroy();
    }
}
