use std::path::Path;

use anyhow::Context;
use glam::{Vec2, Vec4};
use log::info;
use wgpu::util::DeviceExt;

use crate::{
    particle::ParticleBuffers,
    shader::{load_shader, validated},
    utils::workgroup_count,
};

pub const PARTICLES_PER_WORKGROUP: u32 = 256;

/// Uniforms of `compute_particles.wgsl`
#[repr(C)]
#[derive(bytemuck::Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct SimParams {
    pub attractor: Vec2,
    pub dt: f32,
    pub damping: f32,
    pub gravity: f32,
    pub acceleration_cap: f32,
}

unsafe impl bytemuck::Pod for SimParams {}

/// Largest particle count a device can bind and dispatch in one pass
pub fn max_particles(limits: &wgpu::Limits) -> u64 {
    let particle_size = std::mem::size_of::<Vec4>() as u64;
    let bindable = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size)
        / particle_size;
    let dispatchable =
        u64::from(limits.max_compute_workgroups_per_dimension) * u64::from(PARTICLES_PER_WORKGROUP);

    bindable.min(dispatchable)
}

pub struct PhysicsModule {
    param_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,
    pipeline: wgpu::ComputePipeline,
}

impl PhysicsModule {
    pub async fn new(
        device: &wgpu::Device,
        shader_path: &Path,
        particle_buffers: &ParticleBuffers,
        params: SimParams,
    ) -> anyhow::Result<Self> {
        let physics_shader = load_shader(device, shader_path).await?;

        let param_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Physics Parameter Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Physics Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<SimParams>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let bind_group = validated(device, || {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Physics Bind Group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: particle_buffers.positions.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: particle_buffers.velocities.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: param_buffer.as_entire_binding(),
                    },
                ],
            })
        })
        .await
        .context("Failed to bind particle buffers")?;

        // https://github.com/gfx-rs/wgpu/blob/trunk/examples/src/boids/mod.rs
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("physics"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = validated(device, || {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("physics"),
                layout: Some(&pipeline_layout),
                module: &physics_shader,
                entry_point: "main",
            })
        })
        .await?;

        info!(
            "Physics pipeline ready: {} particles, {} workgroups of {}",
            particle_buffers.count,
            workgroup_count(particle_buffers.count, PARTICLES_PER_WORKGROUP),
            PARTICLES_PER_WORKGROUP
        );

        Ok(Self {
            param_buffer,

            bind_group,
            pipeline,
        })
    }

    pub fn begin_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        num_particles: u32,
    ) -> wgpu::ComputePass<'a> {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("physics"),
            timestamp_writes: None,
        });

        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(0, &self.bind_group, &[]);
        cpass.dispatch_workgroups(
            workgroup_count(num_particles, PARTICLES_PER_WORKGROUP),
            1,
            1,
        );

        cpass
    }

    /// Writes the attractor and delta time, the constants stay as uploaded
    pub fn update_frame(&self, queue: &wgpu::Queue, attractor: Vec2, dt: f32) {
        queue.write_buffer(
            &self.param_buffer,
            0,
            bytemuck::bytes_of(&[attractor.x, attractor.y, dt]),
        );
    }
}
