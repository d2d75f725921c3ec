//! GPU renderer.
//!
//! Owns the wgpu surface and device, one pipeline per scene kind and the
//! per-scene vertex buffers. Buffers are created once when a scene is
//! loaded; afterwards only blended positions and the uniform block are
//! rewritten.

#[cfg(feature = "egui")]
mod egui_integration;
pub mod shaders;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::window::Window;

#[cfg(feature = "egui")]
pub use egui_integration::{EguiFrameOutput, EguiIntegration};

use crate::driver::{FrameKind, Scene};
use crate::error::GpuError;
use crate::orbital::OrbitalVertex;
use crate::uniforms::FrameUniforms;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// Vertices per point quad.
const QUAD_VERTICES: u32 = 6;

/// Static per-point attributes of the image scene.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct PointStyle {
    color: [f32; 3],
    size: f32,
}

/// GPU resources of the loaded scene.
enum GpuScene {
    /// Nothing loaded, or a scene with zero particles.
    Empty,
    Points {
        positions: wgpu::Buffer,
        styles: wgpu::Buffer,
        count: u32,
    },
    Orbital {
        vertices: wgpu::Buffer,
        count: u32,
    },
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    points_pipeline: wgpu::RenderPipeline,
    orbital_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    scene: GpuScene,
    #[cfg(feature = "egui")]
    egui: EguiIntegration,
    #[cfg(feature = "egui")]
    ui_output: Option<EguiFrameOutput>,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!("Using GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&FrameUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(FrameUniforms::SIZE),
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let points_attributes = [wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3, // position
        }];
        let style_attributes = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3, // color
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32, // size
            },
        ];
        let points_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            "Points",
            &shaders::points_shader(),
            &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vec3>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &points_attributes,
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointStyle>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &style_attributes,
                },
            ],
            config.format,
        );

        let orbital_attributes = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3, // base position
            },
            wgpu::VertexAttribute {
                offset: OrbitalVertex::RADIUS_OFFSET,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32,
            },
            wgpu::VertexAttribute {
                offset: OrbitalVertex::COLOR_OFFSET,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: OrbitalVertex::ANGLE_OFFSET,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32,
            },
            wgpu::VertexAttribute {
                offset: OrbitalVertex::JITTER_OFFSET,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: OrbitalVertex::SPEED_OFFSET,
                shader_location: 5,
                format: wgpu::VertexFormat::Float32,
            },
            wgpu::VertexAttribute {
                offset: OrbitalVertex::SIZE_OFFSET,
                shader_location: 6,
                format: wgpu::VertexFormat::Float32,
            },
        ];
        let orbital_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            "Orbital",
            &shaders::orbital_shader(),
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<OrbitalVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &orbital_attributes,
            }],
            config.format,
        );

        #[cfg(feature = "egui")]
        let egui = EguiIntegration::new(&device, config.format, &window);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            points_pipeline,
            orbital_pipeline,
            uniform_buffer,
            uniform_bind_group,
            scene: GpuScene::Empty,
            #[cfg(feature = "egui")]
            egui,
            #[cfg(feature = "egui")]
            ui_output: None,
        })
    }

    /// Create vertex buffers for `scene`, replacing any previous ones.
    /// `None` or an empty scene leaves nothing to draw.
    pub fn load_scene(&mut self, scene: Option<&Scene>) {
        let device = &self.device;
        self.scene = match scene {
            Some(Scene::Blend(buffer)) if !buffer.is_empty() => {
                let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Point Positions"),
                    contents: bytemuck::cast_slice(buffer.current()),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
                let styles: Vec<PointStyle> = buffer
                    .colors()
                    .iter()
                    .map(|c| PointStyle {
                        color: c.to_array(),
                        size: 1.0,
                    })
                    .collect();
                let styles = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Point Styles"),
                    contents: bytemuck::cast_slice(&styles),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                GpuScene::Points {
                    positions,
                    styles,
                    count: buffer.len() as u32,
                }
            }
            Some(Scene::Orbital(field)) if !field.is_empty() => {
                let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Orbital Vertices"),
                    contents: bytemuck::cast_slice(&field.to_gpu()),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                GpuScene::Orbital {
                    vertices,
                    count: field.len() as u32,
                }
            }
            _ => GpuScene::Empty,
        };
    }

    /// Upload blended positions. Ignored unless a point scene of the same
    /// length is loaded.
    pub fn write_positions(&self, positions: &[Vec3]) {
        if let GpuScene::Points {
            positions: buffer,
            count,
            ..
        } = &self.scene
        {
            if positions.len() == *count as usize {
                self.queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(positions));
            }
        }
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size, after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Pass a window event to egui. Returns true if egui consumed it.
    #[cfg(feature = "egui")]
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui.on_window_event(window, event)
    }

    /// Run one UI frame; its output is drawn by the next [`render`](Self::render).
    #[cfg(feature = "egui")]
    pub fn run_ui(&mut self, window: &Window, ui: impl FnMut(&egui::Context)) {
        self.ui_output = Some(self.egui.run(window, ui));
    }

    pub fn render(
        &mut self,
        uniforms: &FrameUniforms,
        kind: &FrameKind,
    ) -> Result<(), wgpu::SurfaceError> {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            match (kind, &self.scene) {
                (
                    FrameKind::Points { .. },
                    GpuScene::Points {
                        positions,
                        styles,
                        count,
                    },
                ) => {
                    render_pass.set_pipeline(&self.points_pipeline);
                    render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, positions.slice(..));
                    render_pass.set_vertex_buffer(1, styles.slice(..));
                    render_pass.draw(0..QUAD_VERTICES, 0..*count);
                }
                (FrameKind::Orbital { .. }, GpuScene::Orbital { vertices, count }) => {
                    render_pass.set_pipeline(&self.orbital_pipeline);
                    render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, vertices.slice(..));
                    render_pass.draw(0..QUAD_VERTICES, 0..*count);
                }
                _ => {}
            }
        }

        #[cfg(feature = "egui")]
        let ui_output = self.paint_ui(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        #[cfg(feature = "egui")]
        self.finish_ui(ui_output);

        Ok(())
    }
}

#[cfg(feature = "egui")]
impl GpuState {
    /// Draw the pending UI frame on top of the scene.
    fn paint_ui(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) -> Option<EguiFrameOutput> {
        let ui = self.ui_output.take()?;
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: ui.pixels_per_point,
        };

        let callbacks = self.egui.prepare(
            &self.device,
            &self.queue,
            encoder,
            &ui,
            &screen_descriptor,
        );
        if !callbacks.is_empty() {
            self.queue.submit(callbacks);
        }

        let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.egui
            .paint(&mut render_pass.forget_lifetime(), &ui, &screen_descriptor);

        Some(ui)
    }

    fn finish_ui(&mut self, ui: Option<EguiFrameOutput>) {
        if let Some(ui) = ui {
            self.egui.cleanup(&ui);
        }
    }
}

/// Additive blending: overlapping points brighten instead of occluding.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    label: &str,
    source: &str,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(ADDITIVE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_style_stride() {
        assert_eq!(std::mem::size_of::<PointStyle>(), 16);
        assert_eq!(std::mem::size_of::<Vec3>(), 12);
    }

    #[test]
    fn test_orbital_vertex_stride() {
        assert_eq!(std::mem::size_of::<OrbitalVertex>(), 64);
    }
}
