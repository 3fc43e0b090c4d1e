//! The wave-particle height-field synthesis pass.
//!
//! Per frame, one alive-particle snapshot is packed into two CPU float
//! buffers, sub-rectangle-uploaded into two GPU data textures, splatted
//! into the height map (one additively blended quad impostor per particle,
//! driven by vertex pulling), and finally converted to a normal map by a
//! compute pass. The pass owns every GPU resource it touches and is driven
//! from a single render thread.

use wgpu::util::DeviceExt;

use wavefield_core::{WaveConfig, WaveParticle};

use crate::error::RenderResult;

/// GPU representation of splat uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct SplatUniforms {
    pub grid_width: u32,
    pub _padding: [u32; 3],
}

/// GPU representation of normal-derivation uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NormalUniforms {
    pub scale: [f32; 3],
    pub inv_texture_width: f32,
}

/// Workgroup edge for the normal compute shader.
const NORMAL_WORKGROUP_SIZE: u32 = 8;

/// Writes one snapshot's attributes into the packed CPU buffers.
///
/// Buffer layout matches the data textures: four floats per particle,
/// `(start.x, start.y, dir.x, dir.y)` and `(speed, time, amplitude, radius)`
/// at the same index. Particles beyond the grid capacity are dropped.
/// Packing reads only the snapshot, so repacking an unchanged snapshot
/// produces identical buffers.
pub fn pack_attributes(
    particles: &[WaveParticle],
    start_dir: &mut [f32],
    kinematics: &mut [f32],
) -> usize {
    debug_assert_eq!(start_dir.len(), kinematics.len());
    let capacity = start_dir.len() / 4;
    let count = particles.len().min(capacity);
    for (i, p) in particles.iter().take(count).enumerate() {
        let offset = i * 4;
        start_dir[offset..offset + 4].copy_from_slice(&[
            p.start_point.x,
            p.start_point.y,
            p.direction.x,
            p.direction.y,
        ]);
        kinematics[offset..offset + 4].copy_from_slice(&[p.speed, p.time, p.amplitude, p.radius]);
    }
    count
}

/// Height of the upload sub-rectangle for `count` packed particles.
///
/// Rounds up so a partial last row is never truncated.
pub fn upload_rows(count: usize, grid_width: u32) -> u32 {
    debug_assert!(grid_width > 0);
    u32::try_from(count.div_ceil(grid_width as usize)).unwrap_or(u32::MAX)
}

/// The wave-particle pipeline resources.
pub struct WaveParticlePass {
    grid_width: u32,
    height_map_width: u32,
    height_map_height: u32,
    // CPU-side packing buffers, sized to the full particle grid.
    start_dir_data: Vec<f32>,
    kinematics_data: Vec<f32>,
    // Per-particle data textures.
    start_dir_texture: wgpu::Texture,
    kinematics_texture: wgpu::Texture,
    // Render targets.
    height_map_texture: wgpu::Texture,
    height_map_view: wgpu::TextureView,
    normal_map_texture: wgpu::Texture,
    normal_map_view: wgpu::TextureView,
    // Splat pass.
    splat_pipeline: wgpu::RenderPipeline,
    splat_bind_group: wgpu::BindGroup,
    // Normal derivation pass.
    normal_pipeline: wgpu::ComputePipeline,
    normal_bind_group: wgpu::BindGroup,
}

impl WaveParticlePass {
    /// Creates all pipeline resources for the given configuration.
    ///
    /// This is the only fallible stage; the per-frame path has no error
    /// branches.
    pub fn new(device: &wgpu::Device, config: &WaveConfig) -> RenderResult<Self> {
        let grid_width = config.particle_grid_width;
        let grid_height = config.particle_grid_height;
        let grid_capacity = config.grid_capacity();

        let start_dir_data = vec![0.0f32; grid_capacity * 4];
        let kinematics_data = vec![0.0f32; grid_capacity * 4];

        let start_dir_texture = Self::create_data_texture(
            device,
            "wave start/direction texture",
            grid_width,
            grid_height,
        );
        let kinematics_texture = Self::create_data_texture(
            device,
            "wave speed/time/amplitude/radius texture",
            grid_width,
            grid_height,
        );
        let start_dir_view = start_dir_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let kinematics_view =
            kinematics_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Height map doubles as a readback source for diagnostics.
        let height_map_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("wave height map"),
            size: wgpu::Extent3d {
                width: config.height_map_width,
                height: config.height_map_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let height_map_view =
            height_map_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let normal_map_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("wave normal map"),
            size: wgpu::Extent3d {
                width: config.height_map_width,
                height: config.height_map_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let normal_map_view =
            normal_map_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Splat pipeline
        let splat_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Wave Splat Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/wave_splat.wgsl").into()),
        });

        let splat_uniforms = SplatUniforms {
            grid_width,
            _padding: [0; 3],
        };
        let splat_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("wave splat uniforms"),
            contents: bytemuck::cast_slice(&[splat_uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let splat_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Wave Splat Bind Group Layout"),
                entries: &[
                    // Start point / direction texture
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Speed / time / amplitude / radius texture
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Uniforms
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let splat_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Wave Splat Bind Group"),
            layout: &splat_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&start_dir_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&kinematics_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: splat_uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let splat_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Wave Splat Pipeline Layout"),
                bind_group_layouts: &[&splat_bind_group_layout],
                push_constant_ranges: &[],
            });

        let splat_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Wave Splat Pipeline"),
            layout: Some(&splat_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &splat_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &splat_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba16Float,
                    // Additive accumulation: every particle's contribution sums
                    // into the field.
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Normal derivation pipeline
        let normal_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Height Map Normal Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("shaders/height_map_normal.wgsl").into(),
            ),
        });

        let normal_uniforms = NormalUniforms {
            scale: config.normal_scale.to_array(),
            inv_texture_width: 1.0 / config.height_map_width as f32,
        };
        let normal_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("height map normal uniforms"),
            contents: bytemuck::cast_slice(&[normal_uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let normal_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Height Map Normal Bind Group Layout"),
                entries: &[
                    // Height map input
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Normal map output
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: wgpu::TextureFormat::Rgba16Float,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                    // Uniforms
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let normal_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Height Map Normal Bind Group"),
            layout: &normal_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&height_map_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal_map_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: normal_uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let normal_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Height Map Normal Pipeline Layout"),
                bind_group_layouts: &[&normal_bind_group_layout],
                push_constant_ranges: &[],
            });

        let normal_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Height Map Normal Pipeline"),
            layout: Some(&normal_pipeline_layout),
            module: &normal_shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        log::debug!(
            "wave particle pass created: {grid_width}x{grid_height} particle grid, {}x{} height map",
            config.height_map_width,
            config.height_map_height
        );

        Ok(Self {
            grid_width,
            height_map_width: config.height_map_width,
            height_map_height: config.height_map_height,
            start_dir_data,
            kinematics_data,
            start_dir_texture,
            kinematics_texture,
            height_map_texture,
            height_map_view,
            normal_map_texture,
            normal_map_view,
            splat_pipeline,
            splat_bind_group,
            normal_pipeline,
            normal_bind_group,
        })
    }

    fn create_data_texture(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
    ) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    /// Encodes one frame of the pipeline for the given snapshot.
    ///
    /// Ordering is fixed: pack, upload, splat, normal derivation. The splat
    /// draw covers exactly the snapshot's particle count; stale grid slots
    /// are never drawn. An empty snapshot skips the upload and draw but
    /// still clears the height map and refreshes the normal map.
    pub fn encode_frame(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        particles: &[WaveParticle],
    ) {
        let count = pack_attributes(
            particles,
            &mut self.start_dir_data,
            &mut self.kinematics_data,
        );

        if count > 0 {
            let rows = upload_rows(count, self.grid_width);
            let floats = rows as usize * self.grid_width as usize * 4;
            self.upload_rect(queue, &self.start_dir_texture, &self.start_dir_data[..floats], rows);
            self.upload_rect(queue, &self.kinematics_texture, &self.kinematics_data[..floats], rows);
        }

        {
            let mut splat_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Wave Splat Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.height_map_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if count > 0 {
                splat_pass.set_pipeline(&self.splat_pipeline);
                splat_pass.set_bind_group(0, &self.splat_bind_group, &[]);
                // Six vertices per particle quad impostor.
                splat_pass.draw(0..(count as u32 * 6), 0..1);
            }
        }

        {
            let mut normal_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Height Map Normal Pass"),
                timestamp_writes: None,
            });
            normal_pass.set_pipeline(&self.normal_pipeline);
            normal_pass.set_bind_group(0, &self.normal_bind_group, &[]);
            normal_pass.dispatch_workgroups(
                self.height_map_width.div_ceil(NORMAL_WORKGROUP_SIZE),
                self.height_map_height.div_ceil(NORMAL_WORKGROUP_SIZE),
                1,
            );
        }
    }

    fn upload_rect(&self, queue: &wgpu::Queue, texture: &wgpu::Texture, data: &[f32], rows: u32) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(data),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.grid_width * 16),
                rows_per_image: Some(rows),
            },
            wgpu::Extent3d {
                width: self.grid_width,
                height: rows,
                depth_or_array_layers: 1,
            },
        );
    }

    /// The height map texture (output surface).
    pub fn height_map(&self) -> &wgpu::Texture {
        &self.height_map_texture
    }

    /// The height map view, for binding in a downstream water shader.
    pub fn height_map_view(&self) -> &wgpu::TextureView {
        &self.height_map_view
    }

    /// The normal map texture (output surface).
    pub fn normal_map(&self) -> &wgpu::Texture {
        &self.normal_map_texture
    }

    /// The normal map view, for binding in a downstream water shader.
    pub fn normal_map_view(&self) -> &wgpu::TextureView {
        &self.normal_map_view
    }

    /// Height map dimensions, in texels.
    pub fn height_map_size(&self) -> (u32, u32) {
        (self.height_map_width, self.height_map_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;
    use wavefield_core::{ParticleSeed, WaveParticleManager};

    fn particle(x: f32, speed: f32) -> WaveParticle {
        let mut p = WaveParticle {
            start_point: Vec2::ZERO,
            direction: Vec2::X,
            speed: 0.0,
            time: 0.0,
            amplitude: 0.0,
            radius: 0.0,
        };
        p.activate(&ParticleSeed {
            start_point: Vec2::new(x, 0.25),
            direction: Vec2::new(0.0, 1.0),
            speed,
            amplitude: 0.5,
        });
        p
    }

    #[test]
    fn pack_writes_attribute_lanes() {
        let particles = vec![particle(0.1, 0.2), particle(0.3, 0.4)];
        let mut a = vec![0.0; 4 * 4];
        let mut b = vec![0.0; 4 * 4];
        let count = pack_attributes(&particles, &mut a, &mut b);
        assert_eq!(count, 2);
        assert_eq!(&a[0..4], &[0.1, 0.25, 0.0, 1.0]);
        assert_eq!(&b[0..2], &[0.2, 0.0]);
        assert_eq!(&a[4..8], &[0.3, 0.25, 0.0, 1.0]);
        assert_eq!(&b[4..6], &[0.4, 0.0]);
    }

    #[test]
    fn pack_is_idempotent() {
        let pool = WaveParticleManager::new(&wavefield_core::WaveConfig {
            pool_capacity: 8,
            particle_grid_width: 4,
            particle_grid_height: 2,
            ..wavefield_core::WaveConfig::default()
        })
        .expect("pool");
        for i in 0..5 {
            pool.spawn(ParticleSeed {
                start_point: Vec2::new(0.1 * i as f32, 0.5),
                direction: Vec2::X,
                speed: 0.1,
                amplitude: 1.0,
            });
        }
        let snapshot = pool.snapshot();

        let mut a1 = vec![0.0; 8 * 4];
        let mut b1 = vec![0.0; 8 * 4];
        let mut a2 = vec![0.0; 8 * 4];
        let mut b2 = vec![0.0; 8 * 4];
        let c1 = pack_attributes(&snapshot, &mut a1, &mut b1);
        let c2 = pack_attributes(&snapshot, &mut a2, &mut b2);
        assert_eq!(c1, c2);
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
    }

    #[test]
    fn pack_clamps_to_grid_capacity() {
        let particles = vec![particle(0.1, 0.2); 10];
        let mut a = vec![0.0; 4 * 4];
        let mut b = vec![0.0; 4 * 4];
        assert_eq!(pack_attributes(&particles, &mut a, &mut b), 4);
    }

    #[test]
    fn upload_rows_rounds_up() {
        assert_eq!(upload_rows(0, 2), 0);
        assert_eq!(upload_rows(1, 2), 1);
        assert_eq!(upload_rows(2, 2), 1);
        assert_eq!(upload_rows(3, 2), 2);
        assert_eq!(upload_rows(4, 2), 2);
        assert_eq!(upload_rows(5, 64), 1);
    }

    proptest! {
        #[test]
        fn upload_rows_matches_ceil(count in 0usize..10_000, width in 1u32..256) {
            let rows = upload_rows(count, width);
            let expected = (count as f64 / f64::from(width)).ceil() as u32;
            prop_assert_eq!(rows, expected);
            // Never truncates the last partial row.
            prop_assert!(rows as usize * width as usize >= count);
        }
    }
}
