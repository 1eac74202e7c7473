use ballpit_common::BloomConfig;
use bytemuck::{Pod, Zeroable};

use crate::gpu::RenderTarget;
use crate::shaders;

/// Format of every intermediate HDR target.
pub(crate) const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct PostParams {
    texel: [f32; 2],
    direction: [f32; 2],
    strength: f32,
    radius: f32,
    threshold: f32,
    _pad: f32,
}

/// Size-dependent targets and the bind groups that read them.
struct Targets {
    scene: RenderTarget,
    glow: RenderTarget,
    ping: RenderTarget,
    pong: RenderTarget,
    extract_group: wgpu::BindGroup,
    blur_h_group: wgpu::BindGroup,
    blur_v_group: wgpu::BindGroup,
    composite_group: wgpu::BindGroup,
    size: (u32, u32),
    half: (u32, u32),
}

/// Post-processing chain: threshold extract at half resolution, two-pass
/// gaussian blur, additive composite with tonemapping into the surface.
pub(crate) struct BloomPipeline {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    extract: wgpu::RenderPipeline,
    blur: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    extract_params: wgpu::Buffer,
    blur_h_params: wgpu::Buffer,
    blur_v_params: wgpu::Buffer,
    composite_params: wgpu::Buffer,
    targets: Targets,
}

impl BloomPipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_bind_group_layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLOOM_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let fullscreen = |label: &str, entry: &str, format: wgpu::TextureFormat| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };
        let extract = fullscreen("bloom_extract_pipeline", "fs_extract", HDR_FORMAT);
        let blur = fullscreen("bloom_blur_pipeline", "fs_blur", HDR_FORMAT);
        let composite = fullscreen("bloom_composite_pipeline", "fs_composite", surface_format);

        let params_buffer = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<PostParams>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let extract_params = params_buffer("bloom_extract_params");
        let blur_h_params = params_buffer("bloom_blur_h_params");
        let blur_v_params = params_buffer("bloom_blur_v_params");
        let composite_params = params_buffer("bloom_composite_params");

        let targets = Self::create_targets(
            device,
            &layout,
            &sampler,
            [
                &extract_params,
                &blur_h_params,
                &blur_v_params,
                &composite_params,
            ],
            width,
            height,
        );

        Self {
            layout,
            sampler,
            extract,
            blur,
            composite,
            extract_params,
            blur_h_params,
            blur_v_params,
            composite_params,
            targets,
        }
    }

    fn create_targets(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        params: [&wgpu::Buffer; 4],
        width: u32,
        height: u32,
    ) -> Targets {
        let size = (width.max(1), height.max(1));
        let half = ((size.0 / 2).max(1), (size.1 / 2).max(1));
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let scene = RenderTarget::new(device, "bloom_scene", HDR_FORMAT, size.0, size.1, usage);
        let glow = RenderTarget::new(device, "bloom_glow", HDR_FORMAT, size.0, size.1, usage);
        let ping = RenderTarget::new(device, "bloom_ping", HDR_FORMAT, half.0, half.1, usage);
        let pong = RenderTarget::new(device, "bloom_pong", HDR_FORMAT, half.0, half.1, usage);

        let group = |label: &str, a: &wgpu::TextureView, b: &wgpu::TextureView, p: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(a),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(b),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: p.as_entire_binding(),
                    },
                ],
            })
        };
        let [extract_p, blur_h_p, blur_v_p, composite_p] = params;
        let extract_group = group("bloom_extract_group", &glow.view, &glow.view, extract_p);
        let blur_h_group = group("bloom_blur_h_group", &ping.view, &ping.view, blur_h_p);
        let blur_v_group = group("bloom_blur_v_group", &pong.view, &pong.view, blur_v_p);
        let composite_group = group("bloom_composite_group", &scene.view, &ping.view, composite_p);

        Targets {
            scene,
            glow,
            ping,
            pong,
            extract_group,
            blur_h_group,
            blur_v_group,
            composite_group,
            size,
            half,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.destroy();
        self.targets = Self::create_targets(
            device,
            &self.layout,
            &self.sampler,
            [
                &self.extract_params,
                &self.blur_h_params,
                &self.blur_v_params,
                &self.composite_params,
            ],
            width,
            height,
        );
    }

    /// HDR scene color target the glow scene pass renders into.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets.scene.view
    }

    /// Emissive-only target the glow scene pass renders into.
    pub fn glow_view(&self) -> &wgpu::TextureView {
        &self.targets.glow.view
    }

    /// Upload this frame's parameters. Called every frame so edits apply live.
    pub fn write_params(&self, queue: &wgpu::Queue, bloom: &BloomConfig) {
        let bloom = bloom.clamped();
        let texel = |(w, h): (u32, u32)| [1.0 / w as f32, 1.0 / h as f32];
        let base = PostParams {
            texel: texel(self.targets.size),
            direction: [0.0, 0.0],
            strength: bloom.strength,
            radius: bloom.radius,
            threshold: bloom.threshold,
            _pad: 0.0,
        };
        let half = PostParams {
            texel: texel(self.targets.half),
            ..base
        };
        queue.write_buffer(&self.extract_params, 0, bytemuck::bytes_of(&base));
        queue.write_buffer(
            &self.blur_h_params,
            0,
            bytemuck::bytes_of(&PostParams {
                direction: [1.0, 0.0],
                ..half
            }),
        );
        queue.write_buffer(
            &self.blur_v_params,
            0,
            bytemuck::bytes_of(&PostParams {
                direction: [0.0, 1.0],
                ..half
            }),
        );
        queue.write_buffer(&self.composite_params, 0, bytemuck::bytes_of(&base));
    }

    /// Record extract, blur and composite. The composite writes `output`.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let t = &self.targets;
        let passes: [(&str, &wgpu::RenderPipeline, &wgpu::BindGroup, &wgpu::TextureView); 4] = [
            ("bloom_extract_pass", &self.extract, &t.extract_group, &t.ping.view),
            ("bloom_blur_h_pass", &self.blur, &t.blur_h_group, &t.pong.view),
            ("bloom_blur_v_pass", &self.blur, &t.blur_v_group, &t.ping.view),
            ("bloom_composite_pass", &self.composite, &t.composite_group, output),
        ];
        for (label, pipeline, group, target) in passes {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, group, &[]);
            pass.draw(0..3, 0..1);
        }
    }

    pub fn destroy(&self) {
        let t = &self.targets;
        for target in [&t.scene, &t.glow, &t.ping, &t.pong] {
            target.destroy();
        }
    }

    pub fn destroy_buffers(&self) {
        for buffer in [
            &self.extract_params,
            &self.blur_h_params,
            &self.blur_v_params,
            &self.composite_params,
        ] {
            buffer.destroy();
        }
    }
}
