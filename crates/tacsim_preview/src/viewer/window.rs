//! Interactive viewer window
//!
//! A single [`winit`] window with a [`wgpu`] surface, drawing one mesh with a headlight.
//!
//! ## Controls
//! - left mouse drag: orbit
//! - scroll wheel: zoom
//! - `R`: reset the camera
//! - `Esc` / `Q`: close

use super::{OrbitCamera, Viewer};
use anyhow::anyhow;
use crate::{config::ViewerSettings, TriangleMesh};
use bytemuck::{Pod, Zeroable};
use log::*;
use pollster::FutureExt;
use std::{mem, sync::Arc};
use tacsim_utils::{ok, AnyResult, AnyhowResultExt};
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Radians of rotation per pixel of mouse movement
const ORBIT_SPEED: f32 = 0.01;

/// Pixel scroll deltas (touchpads) per line of a wheel notch
const PIXELS_PER_LINE: f32 = 40.0;

pub struct WindowViewer {
    settings: ViewerSettings,
}

impl WindowViewer {
    pub fn new(settings: ViewerSettings) -> Self {
        Self { settings }
    }
}

impl Viewer for WindowViewer {
    fn show(&mut self, mut mesh: TriangleMesh, title: &str) -> AnyResult {
        if !mesh.has_normals() {
            mesh.compute_vertex_normals();
        }

        let camera = match mesh.bounds() {
            Some((min, max)) => OrbitCamera::framing(min, max),
            None => OrbitCamera::default(),
        };

        let mut app = ViewerApp {
            settings: &self.settings,
            title,
            mesh,
            camera,
            gpu: None,
            cursor: None,
            dragging: false,
            error: None,
        };

        info!("Opening viewer for {title}...");
        // winit's platform errors aren't guaranteed to be thread-safe, so only their messages
        // are carried over
        let event_loop =
            EventLoop::new().map_err(|err| anyhow!("couldn't create an event loop: {err}"))?;
        event_loop
            .run_app(&mut app)
            .map_err(|err| anyhow!("event loop failed: {err}"))?;
        trace!("Viewer event loop finished");

        match app.error {
            Some(err) => Err(err),
            None => ok(),
        }
    }
}

struct ViewerApp<'a> {
    settings: &'a ViewerSettings,
    title: &'a str,
    mesh: TriangleMesh,
    camera: OrbitCamera,
    gpu: Option<Gpu>,
    cursor: Option<PhysicalPosition<f64>>,
    dragging: bool,
    error: Option<anyhow::Error>,
}

impl ApplicationHandler for ViewerApp<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.title)
            .with_inner_size(LogicalSize::new(self.settings.width, self.settings.height));

        let gpu = event_loop
            .create_window(attributes)
            .map_err(|err| anyhow!("couldn't create the viewer window: {err}"))
            .and_then(|window| Gpu::new(Arc::new(window), &self.mesh).block_on());

        match gpu {
            Ok(gpu) => {
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
            }
            Err(err) => {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                debug!("Window close requested");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match logical_key.as_ref() {
                Key::Named(NamedKey::Escape) | Key::Character("q" | "Q") => event_loop.exit(),
                Key::Character("r" | "R") => {
                    self.camera.reset();
                    gpu.window.request_redraw();
                }
                _ => {}
            },

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.cursor) {
                    self.camera.orbit(
                        (position.x - last.x) as f32 * ORBIT_SPEED,
                        (position.y - last.y) as f32 * ORBIT_SPEED,
                    );
                    gpu.window.request_redraw();
                }
                self.cursor = Some(position);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(offset) => offset.y as f32 / PIXELS_PER_LINE,
                };
                self.camera.zoom(steps);
                gpu.window.request_redraw();
            }

            WindowEvent::Resized(size) => {
                gpu.resize(size);
                gpu.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                if let Err(err) = gpu.render(&self.camera, self.settings) {
                    self.error = Some(err);
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GpuVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl GpuVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Mirrors `Uniforms` in `mesh.wgsl`
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
    color: [f32; 4],
}

/// Everything needed to draw the mesh into the window.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Gpu {
    async fn new(window: Arc<Window>, mesh: &TriangleMesh) -> AnyResult<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .otherwise("couldn't find a GPU")?;

        info!("Using adapter: {}", adapter.get_info().name);
        info!("Using backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("preview device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .otherwise("couldn't initialize the device")?;

        let size = window.inner_size();
        let config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .otherwise("surface unsupported by adapter")?;
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("mesh.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh uniforms"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                compilation_options: Default::default(),
                buffers: &[GpuVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Assets come in with either winding, the shading is two-sided anyway
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let vertices: Vec<GpuVertex> = mesh
            .positions
            .iter()
            .zip(&mesh.normals)
            .map(|(position, normal)| GpuVertex {
                position: position.to_array(),
                normal: normal.to_array(),
            })
            .collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh indices"),
            contents: bytemuck::cast_slice(&mesh.triangles),
            usage: wgpu::BufferUsages::INDEX,
        });
        let index_count = u32::try_from(mesh.triangles.len() * 3)?;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh uniforms"),
            size: mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh uniforms"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_view,
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count,
            uniform_buffer,
            bind_group,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        // Minimized windows report a zero size, there's nothing to draw into then
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    fn render(&mut self, camera: &OrbitCamera, settings: &ViewerSettings) -> AnyResult {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.window.request_redraw();
                return ok();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out waiting for the next frame");
                return ok();
            }
            Err(err) => return Err(err.into()),
        };

        let aspect = self.config.width as f32 / self.config.height as f32;
        let [r, g, b] = settings.color;
        let uniforms = Uniforms {
            view_proj: camera.view_proj(aspect).to_cols_array_2d(),
            light_dir: camera.light_dir().extend(0.0).to_array(),
            color: [r, g, b, 1.0],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("preview frame"),
            });

        {
            let [r, g, b] = settings.background;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        ok()
    }
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("depth buffer"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_layouts_match_the_shader() {
        // vec3 position + vec3 normal, tightly packed
        assert_eq!(mem::size_of::<GpuVertex>(), 24);
        assert_eq!(GpuVertex::layout().attributes[1].offset, 12);
        // mat4x4 + two vec4s, already 16-byte aligned
        assert_eq!(mem::size_of::<Uniforms>(), 96);
    }
}
