mod cli;
mod framepace;
mod gpu;
mod gui;
mod lifecycle;
mod particle;
mod physics;
mod render;
mod shader;
mod utils;

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use framepace::Framepacer;
use glam::Vec2;
use gpu::GpuContext;
use gui::EguiIntegration;
use lifecycle::LoopState;
use log::{error, info, warn};
use particle::{ParticleBuffers, ParticleSet};
use rand::{rngs::StdRng, SeedableRng};
use shader::validated;
use utils::{to_normalized, Exists};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::Window,
};

use crate::{physics::PhysicsModule, render::RenderModule};

const WINDOW_TITLE: &str = "Particle Attractor";

const COMPUTE_SHADER: &str = "compute_particles.wgsl";
const VERTEX_SHADER: &str = "particles.vert.wgsl";
const FRAGMENT_SHADER: &str = "base.frag.wgsl";

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Collect Arguments
    let args = cli::Args::parse();

    // Setup Winit
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    // State
    let mut app_state = AppState {
        tokio_rt: tokio::runtime::Runtime::new()?,
        args,
        gpu: Exists::None,
        gfx: Exists::None,
        framepace: Framepacer::new(),
        state: LoopState::Running,
        fatal_error: None,

        mouse_position: Vec2::ZERO,
    };

    event_loop.run_app(&mut app_state)?;

    match app_state.fatal_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct GfxState {
    window: Arc<Window>,
    egui: EguiIntegration,

    particle_buffers: ParticleBuffers,
    physics_module: PhysicsModule,
    render_module: RenderModule,
}

struct AppState<'a> {
    tokio_rt: tokio::runtime::Runtime,
    args: cli::Args,
    gpu: Exists<GpuContext<'a>>,
    gfx: Exists<GfxState>,
    framepace: Framepacer,
    state: LoopState,
    fatal_error: Option<anyhow::Error>,

    mouse_position: Vec2,
}

impl<'a> AppState<'a> {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(self.args.width, self.args.height))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(attributes)?);
        let window_size = window.inner_size();

        let gpu = self.tokio_rt.block_on(GpuContext::new(window.clone()))?;
        let surface_format = gpu.config.format;

        let max_particles = physics::max_particles(&gpu.device.limits());
        if u64::from(self.args.particles) > max_particles {
            bail!(
                "{} particles exceed the device limit of {max_particles}",
                self.args.particles
            );
        }

        let mut rng = match self.args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let particles = ParticleSet::generate(self.args.particles as usize, &mut rng);
        let particle_buffers = self
            .tokio_rt
            .block_on(validated(&gpu.device, || {
                ParticleBuffers::upload(&gpu.device, &particles)
            }))
            .context("Failed to allocate particle buffers")?;
        // The GPU owns the particle state from here on
        drop(particles);

        let physics_module = self.tokio_rt.block_on(PhysicsModule::new(
            &gpu.device,
            &self.args.shader_path(COMPUTE_SHADER),
            &particle_buffers,
            self.args.simulation_params(),
        ))?;
        let render_module = self.tokio_rt.block_on(RenderModule::new(
            &gpu.device,
            surface_format,
            &self.args.shader_path(VERTEX_SHADER),
            &self.args.shader_path(FRAGMENT_SHADER),
            &particle_buffers,
        ))?;

        let mut egui = EguiIntegration::new(&gpu.device, surface_format);
        egui.resize(window_size.width, window_size.height);

        info!(
            "Simulating {} particles in a {}x{} window",
            particle_buffers.count, window_size.width, window_size.height
        );

        self.gfx = Exists::Some(GfxState {
            window,
            egui,

            particle_buffers,
            physics_module,
            render_module,
        });
        self.gpu = Exists::Some(gpu);
        self.framepace.reset();

        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.fatal_error = Some(err);
        self.state.close();
        event_loop.exit();
    }

    /// Drops every GPU resource and the window, does nothing after the first call
    fn release(&mut self) {
        let Some(gfx) = self.gfx.take() else {
            return;
        };
        let GfxState {
            window,
            egui,
            particle_buffers,
            physics_module,
            render_module,
        } = gfx;

        drop(render_module);
        info!("Released render pipeline and vertex buffer");
        drop(physics_module);
        info!("Released compute pipeline");
        drop(particle_buffers);
        drop(egui);
        drop(self.gpu.take());
        info!("Released particle buffers and device");

        drop(window);
        info!("Window closed");
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let (Exists::Some(gpu), Exists::Some(gfx)) = (&mut self.gpu, &mut self.gfx) else {
            return;
        };

        let window_size = gfx.window.inner_size();
        // Nothing to simulate or present while minimized
        let Some(attractor) = to_normalized(
            self.mouse_position,
            Vec2::new(window_size.width as f32, window_size.height as f32),
        ) else {
            self.framepace.reset();
            self.framepace.end_frame(1.0 / self.args.framerate as f32);
            return;
        };

        let dt = self.framepace.begin_frame();
        let num_particles = gfx.particle_buffers.count;

        gfx.physics_module.update_frame(&gpu.queue, attractor, dt);

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("{err}, reconfiguring surface");
                gpu.reconfigure_surface();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring the next frame");
                return;
            }
            Err(err @ wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, err.into());
                return;
            }
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame") });

        // Simulate
        {
            let _cpass = gfx.physics_module.begin_pass(&mut encoder, num_particles);
        }

        let framerate = self.framepace.framerate();
        gfx.egui
            .run(|ctx| gui::stats_overlay(ctx, framerate, num_particles));
        gfx.egui
            .pre_render(&gpu.device, &gpu.queue, &mut encoder, dt);

        // Render
        {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut rpass = gfx
                .render_module
                .begin_pass(&mut encoder, &view, num_particles);

            gfx.egui.render(&mut rpass);
        }

        gpu.queue.submit(Some(encoder.finish()));
        frame.present();

        self.framepace.end_frame(1.0 / self.args.framerate as f32);
    }
}

impl<'a> ApplicationHandler for AppState<'a> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.gfx.is_none() || !self.state.is_running() {
            return;
        }

        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err.context("Failed to initialize"));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.gfx.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if self.state.close() {
                    info!("Close requested");
                }
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                self.gpu.resize(new_size.width, new_size.height);
                self.gfx.egui.resize(new_size.width, new_size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_running() {
            self.frame(event_loop);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.release();
    }
}
