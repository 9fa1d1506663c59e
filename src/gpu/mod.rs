//! wgpu state for drawing the galaxy.
//!
//! [`GpuState`] owns the surface, the render pipeline built from
//! [`crate::shader`], the frame uniform buffer and the four per-particle
//! attribute buffers. Attribute sets are swapped in whole by
//! [`GpuState::bind_attributes`]; frames drawn before the first bind are just
//! the background colour.

pub mod camera;
#[cfg(feature = "egui")]
pub mod egui_integration;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;

use crate::animation::FrameUniforms;
use crate::error::{GenerationError, GpuError};
use crate::generator::{GenerationLimits, ParticleAttributeSet};
use crate::shader::{self, FRAGMENT_ENTRY, QUAD_VERTICES, VERTEX_ENTRY};
use crate::visuals::VisualConfig;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    viewport: [f32; 2],
    time: f32,
    /// Sprite diameter in pixels at unit depth, already scaled for pixel density.
    size: f32,
}

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const SCALE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];
const OFFSET_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x3];

fn instance_layout(
    attributes: &'static [wgpu::VertexAttribute],
    stride: usize,
) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: stride as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

/// The bound attribute set, one buffer per attribute.
struct AttributeBuffers {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    scales: wgpu::Buffer,
    random_offsets: wgpu::Buffer,
    count: u32,
}

impl AttributeBuffers {
    fn upload(device: &wgpu::Device, set: &ParticleAttributeSet) -> Self {
        let create = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        Self {
            positions: create("Position Buffer", bytemuck::cast_slice(set.positions())),
            colors: create("Color Buffer", bytemuck::cast_slice(set.colors())),
            scales: create("Scale Buffer", bytemuck::cast_slice(set.scales())),
            random_offsets: create("Random Offset Buffer", bytemuck::cast_slice(set.random_offsets())),
            count: set.len() as u32,
        }
    }
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    attributes: Option<AttributeBuffers>,
    background: wgpu::Color,
    point_size: f32,
    pub camera: Camera,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, visuals: &VisualConfig) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

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
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera = Camera::new();

        let uniforms = Uniforms {
            view_proj: camera.view_proj(aspect(&config)).to_cols_array_2d(),
            viewport: [config.width as f32, config.height as f32],
            time: 0.0,
            size: 0.0,
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
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
                        min_binding_size: None,
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

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Galaxy Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(shader::vertex_stage(visuals).into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Galaxy Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(shader::fragment_stage(visuals).into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let vec3_stride = std::mem::size_of::<glam::Vec3>();
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[
                    instance_layout(&POSITION_ATTRIBUTES, vec3_stride),
                    instance_layout(&COLOR_ATTRIBUTES, vec3_stride),
                    instance_layout(&SCALE_ATTRIBUTES, std::mem::size_of::<f32>()),
                    instance_layout(&OFFSET_ATTRIBUTES, vec3_stride),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(visuals.blend_mode.to_blend_state()),
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
            // Additive sprites are order independent; no depth buffer.
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let bg = visuals.background_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            uniform_buffer,
            uniform_bind_group,
            attributes: None,
            background: wgpu::Color {
                r: bg.x as f64,
                g: bg.y as f64,
                b: bg.z as f64,
                a: 1.0,
            },
            point_size: 0.0,
            camera,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Limits generated sets must respect to be bindable on this device.
    pub fn limits(&self) -> GenerationLimits {
        GenerationLimits::from(&self.device.limits())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Base sprite diameter in pixels at unit depth.
    pub fn set_point_size(&mut self, size: f32) {
        self.point_size = size;
    }

    /// Number of particles currently drawn.
    pub fn particle_count(&self) -> u32 {
        self.attributes.as_ref().map_or(0, |a| a.count)
    }

    /// Upload `set` and make it the drawn set.
    ///
    /// The previous buffers stay bound until the new ones exist. A set that
    /// does not fit the device is rejected and the previous set kept.
    pub fn bind_attributes(&mut self, set: ParticleAttributeSet) -> Result<(), GenerationError> {
        self.limits().check(set.len())?;

        if set.is_empty() {
            self.attributes = None;
            return Ok(());
        }

        let buffers = AttributeBuffers::upload(&self.device, &set);
        log::debug!(
            "bound {} particles ({} KiB)",
            buffers.count,
            set.byte_size() / 1024
        );
        self.attributes = Some(buffers);
        Ok(())
    }

    fn update_uniforms(&mut self, frame: &FrameUniforms) {
        let uniforms = Uniforms {
            view_proj: self.camera.view_proj(aspect(&self.config)).to_cols_array_2d(),
            viewport: [self.config.width as f32, self.config.height as f32],
            time: frame.elapsed_time(),
            size: self.point_size * frame.point_size_scale,
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn render(&mut self, frame: &FrameUniforms) -> Result<(), wgpu::SurfaceError> {
        self.render_with(frame, |_, _, _, _, _| {})
    }

    /// Render the particles, then the egui overlay on top.
    #[cfg(feature = "egui")]
    pub fn render_with_overlay(
        &mut self,
        frame: &FrameUniforms,
        egui: &mut egui_integration::EguiIntegration,
        output: &egui_integration::EguiFrameOutput,
    ) -> Result<(), wgpu::SurfaceError> {
        self.render_with(frame, |device, queue, encoder, view, size| {
            egui.paint(device, queue, encoder, view, size, output);
        })
    }

    fn render_with<F>(&mut self, frame: &FrameUniforms, overlay: F) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView, [u32; 2]),
    {
        self.update_uniforms(frame);

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
                label: Some("Galaxy Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(attributes) = &self.attributes {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, attributes.positions.slice(..));
                render_pass.set_vertex_buffer(1, attributes.colors.slice(..));
                render_pass.set_vertex_buffer(2, attributes.scales.slice(..));
                render_pass.set_vertex_buffer(3, attributes.random_offsets.slice(..));
                render_pass.draw(0..QUAD_VERTICES, 0..attributes.count);
            }
        }

        overlay(
            &self.device,
            &self.queue,
            &mut encoder,
            &view,
            [self.config.width, self.config.height],
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn aspect(config: &wgpu::SurfaceConfiguration) -> f32 {
    config.width as f32 / config.height.max(1) as f32
}
