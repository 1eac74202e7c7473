use ballpit_assets::EnvironmentMap;
use ballpit_common::BloomConfig;
use ballpit_render::{InstanceDraw, RenderFrame, Renderer};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::bloom::{BloomPipeline, HDR_FORMAT};
use crate::gpu::{GpuContext, GpuError, RenderTarget};
use crate::mesh::{Vertex, uv_sphere};
use crate::shaders;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    base_color: [f32; 4],
    surface: [f32; 4],
    emissive: [f32; 4],
}

impl From<&InstanceDraw> for InstanceData {
    fn from(draw: &InstanceDraw) -> Self {
        let cols = draw.model.to_cols_array_2d();
        let e = draw.emissive;
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            base_color: draw.base_color,
            surface: [draw.roughness, draw.metalness, 0.0, 0.0],
            emissive: [e[0], e[1], e[2], 0.0],
        }
    }
}

/// Everything allocated on the device. Dropped as a unit on release.
struct Resources {
    globals_buffer: wgpu::Buffer,
    scene_layout: wgpu::BindGroupLayout,
    scene_group: wgpu::BindGroup,
    env_texture: wgpu::Texture,
    direct_pipeline: wgpu::RenderPipeline,
    glow_pipeline: wgpu::RenderPipeline,
    sphere_vertex_buffer: wgpu::Buffer,
    sphere_index_buffer: wgpu::Buffer,
    sphere_index_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u32,
    depth: RenderTarget,
    bloom: BloomPipeline,
}

/// wgpu renderer for the sphere grid.
///
/// Owns the surface. After a render the acquired surface texture is held so
/// the host can draw an overlay into [`WgpuRenderer::overlay_view`] before
/// calling [`WgpuRenderer::present`].
pub struct WgpuRenderer {
    gpu: GpuContext,
    resources: Option<Resources>,
    pending: Option<wgpu::SurfaceTexture>,
}

impl WgpuRenderer {
    pub fn new(gpu: GpuContext) -> Self {
        let (width, height) = gpu.size();
        let device = &gpu.device;

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_buffer"),
            contents: bytemuck::bytes_of(&Globals {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                eye: [0.0, 0.0, 0.0, 1.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let env_texture = upload_environment(&gpu, &EnvironmentMap::flat([0.6, 0.6, 0.6]));
        let scene_group = scene_bind_group(device, &scene_layout, &globals_buffer, &env_texture);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&scene_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                ],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![
                    2 => Float32x4,
                    3 => Float32x4,
                    4 => Float32x4,
                    5 => Float32x4,
                    6 => Float32x4,
                    7 => Float32x4,
                    8 => Float32x4,
                ],
            },
        ];
        let color_target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })
        };
        let scene_pipeline = |label: &str, entry: &str, targets: &[Option<wgpu::ColorTargetState>]| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &vertex_buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };
        let direct_pipeline = scene_pipeline(
            "scene_direct_pipeline",
            "fs_main",
            &[color_target(gpu.format())],
        );
        let glow_pipeline = scene_pipeline(
            "scene_glow_pipeline",
            "fs_glow",
            &[color_target(HDR_FORMAT), color_target(HDR_FORMAT)],
        );

        let (sphere_verts, sphere_indices) = uv_sphere(32, 16);
        let sphere_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_vertex_buffer"),
            contents: bytemuck::cast_slice(&sphere_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sphere_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_index_buffer"),
            contents: bytemuck::cast_slice(&sphere_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_capacity = 256u32;
        let instance_buffer = create_instance_buffer(device, instance_capacity);
        let depth = RenderTarget::depth(device, width, height);
        let bloom = BloomPipeline::new(device, gpu.format(), width, height);

        let resources = Resources {
            globals_buffer,
            scene_layout,
            scene_group,
            env_texture,
            direct_pipeline,
            glow_pipeline,
            sphere_vertex_buffer,
            sphere_index_buffer,
            sphere_index_count: sphere_indices.len() as u32,
            instance_buffer,
            instance_capacity,
            depth,
            bloom,
        };

        Self {
            gpu,
            resources: Some(resources),
            pending: None,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.gpu.format()
    }

    /// View of the rendered-but-unpresented surface texture, if any.
    pub fn overlay_view(&self) -> Option<wgpu::TextureView> {
        self.pending
            .as_ref()
            .map(|t| t.texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    /// Present the pending surface texture. No-op if nothing was rendered.
    pub fn present(&mut self) {
        if let Some(texture) = self.pending.take() {
            texture.present();
        }
    }

    /// Upload the frame's globals and instances. Returns the instance count.
    fn upload(&mut self, frame: &RenderFrame) -> Result<u32, GpuError> {
        let res = self.resources.as_mut().ok_or(GpuError::Released)?;
        let device = &self.gpu.device;
        let queue = &self.gpu.queue;

        queue.write_buffer(
            &res.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals {
                view_proj: frame.view_proj.to_cols_array_2d(),
                eye: frame.eye.extend(1.0).to_array(),
            }),
        );

        let instances: Vec<InstanceData> =
            frame.instances.iter().map(InstanceData::from).collect();
        let count = instances.len() as u32;
        if count > res.instance_capacity {
            res.instance_buffer.destroy();
            res.instance_capacity = count.next_power_of_two();
            res.instance_buffer = create_instance_buffer(device, res.instance_capacity);
            tracing::debug!(capacity = res.instance_capacity, "grew instance buffer");
        }
        if !instances.is_empty() {
            queue.write_buffer(&res.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        Ok(count)
    }

    /// Acquire the next surface texture, presenting any frame the host left pending.
    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, GpuError> {
        self.present();
        self.gpu.acquire()
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn upload_environment(gpu: &GpuContext, map: &EnvironmentMap) -> wgpu::Texture {
    let max_dim = gpu.device.limits().max_texture_dimension_2d;
    let map = map.clone().fit_within(max_dim);
    let size = wgpu::Extent3d {
        width: map.width(),
        height: map.height(),
        depth_or_array_layers: 1,
    };
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("environment_map"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(map.pixels()),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(map.width() * 16),
            rows_per_image: Some(map.height()),
        },
        size,
    );
    texture
}

fn scene_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    globals: &wgpu::Buffer,
    env_texture: &wgpu::Texture,
) -> wgpu::BindGroup {
    let env_view = env_texture.create_view(&Default::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&env_view),
            },
        ],
    })
}

fn depth_attachment(depth: &RenderTarget) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view: &depth.view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}

fn clear_attachment(
    view: &wgpu::TextureView,
    color: wgpu::Color,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(color),
            store: wgpu::StoreOp::Store,
        },
    })
}

fn draw_spheres(
    pass: &mut wgpu::RenderPass<'_>,
    res: &Resources,
    pipeline: &wgpu::RenderPipeline,
    count: u32,
) {
    if count == 0 {
        return;
    }
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, &res.scene_group, &[]);
    pass.set_vertex_buffer(0, res.sphere_vertex_buffer.slice(..));
    pass.set_vertex_buffer(1, res.instance_buffer.slice(..));
    pass.set_index_buffer(res.sphere_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    pass.draw_indexed(0..res.sphere_index_count, 0, 0..count);
}

impl Renderer for WgpuRenderer {
    type Error = GpuError;

    fn set_environment(&mut self, environment: &EnvironmentMap) -> Result<(), GpuError> {
        let texture = upload_environment(&self.gpu, environment);
        let res = self.resources.as_mut().ok_or(GpuError::Released)?;
        res.env_texture.destroy();
        res.scene_group = scene_bind_group(
            &self.gpu.device,
            &res.scene_layout,
            &res.globals_buffer,
            &texture,
        );
        res.env_texture = texture;
        tracing::info!(
            width = environment.width(),
            height = environment.height(),
            "environment map uploaded"
        );
        Ok(())
    }

    fn render(&mut self, frame: &RenderFrame) -> Result<(), GpuError> {
        let count = self.upload(frame)?;
        let Some(surface_texture) = self.acquire()? else {
            return Ok(());
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let res = self.resources.as_ref().ok_or(GpuError::Released)?;

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("direct_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("direct_pass"),
                color_attachments: &[clear_attachment(&view, CLEAR_COLOR)],
                depth_stencil_attachment: Some(depth_attachment(&res.depth)),
                ..Default::default()
            });
            draw_spheres(&mut pass, res, &res.direct_pipeline, count);
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.pending = Some(surface_texture);
        Ok(())
    }

    fn render_with_bloom(
        &mut self,
        frame: &RenderFrame,
        bloom: &BloomConfig,
    ) -> Result<(), GpuError> {
        let count = self.upload(frame)?;
        let Some(surface_texture) = self.acquire()? else {
            return Ok(());
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let res = self.resources.as_ref().ok_or(GpuError::Released)?;
        res.bloom.write_params(&self.gpu.queue, bloom);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("bloom_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glow_scene_pass"),
                color_attachments: &[
                    clear_attachment(res.bloom.scene_view(), CLEAR_COLOR),
                    clear_attachment(res.bloom.glow_view(), wgpu::Color::BLACK),
                ],
                depth_stencil_attachment: Some(depth_attachment(&res.depth)),
                ..Default::default()
            });
            draw_spheres(&mut pass, res, &res.glow_pipeline, count);
        }
        res.bloom.encode(&mut encoder, &view);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.pending = Some(surface_texture);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.pending = None;
        self.gpu.resize(width, height);
        let (width, height) = self.gpu.size();
        if let Some(res) = self.resources.as_mut() {
            res.depth.destroy();
            res.depth = RenderTarget::depth(&self.gpu.device, width, height);
            res.bloom.resize(&self.gpu.device, width, height);
        }
    }

    fn release(&mut self) -> bool {
        self.pending = None;
        let Some(res) = self.resources.take() else {
            return false;
        };
        res.env_texture.destroy();
        res.depth.destroy();
        res.bloom.destroy();
        res.bloom.destroy_buffers();
        for buffer in [
            &res.globals_buffer,
            &res.sphere_vertex_buffer,
            &res.sphere_index_buffer,
            &res.instance_buffer,
        ] {
            buffer.destroy();
        }
        tracing::info!("GPU resources released");
        true
    }
}
